//! Reconnecting driver for one upstream socket.

use std::sync::Arc;

use mercato_core::stream::{StreamEvent, StreamProvider};
use mercato_core::{ConnectionState, MercatoConnector, MercatoError, StreamRole};
use tokio::sync::{mpsc, oneshot};

use super::backoff::Backoff;
use super::registry::{Command, Registry};
use super::transport::{WsConnect, WsSession};

enum SessionEnd {
    /// Stop requested; do not reconnect.
    Stopped,
    /// Socket lost or never established.
    Ended { was_ready: bool },
}

pub(crate) struct Connection {
    pub(crate) role: StreamRole,
    pub(crate) connector: Arc<dyn MercatoConnector>,
    pub(crate) transport: Arc<dyn WsConnect>,
    pub(crate) registry: Arc<Registry>,
    pub(crate) backoff: Backoff,
}

impl Connection {
    /// Connect, serve, and reconnect until stopped or out of attempts.
    pub(crate) async fn run(
        mut self,
        mut stop: oneshot::Receiver<()>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let connector = Arc::clone(&self.connector);
        let Some(codec) = connector.as_stream_provider() else {
            return;
        };
        loop {
            let end = self.session(codec, &mut stop, &mut commands).await;
            self.registry
                .set_state(self.role, ConnectionState::Disconnected);
            let delay = match end {
                SessionEnd::Stopped => return,
                SessionEnd::Ended { was_ready: true } => self.backoff.after_session(),
                SessionEnd::Ended { was_ready: false } => match self.backoff.fail() {
                    Some(d) => d,
                    None => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            target: "mercato::realtime",
                            role = self.role.as_str(),
                            connector = connector.name(),
                            attempts = self.backoff.failures(),
                            "giving up on realtime connection"
                        );
                        return;
                    }
                },
            };

            #[cfg(feature = "tracing")]
            tracing::info!(
                target: "mercato::realtime",
                role = self.role.as_str(),
                connector = connector.name(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "reconnecting"
            );

            tokio::select! {
                _ = &mut stop => return,
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn session(
        &self,
        codec: &dyn StreamProvider,
        stop: &mut oneshot::Receiver<()>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionEnd {
        const FAILED: SessionEnd = SessionEnd::Ended { was_ready: false };

        self.registry.set_state(self.role, ConnectionState::Connecting);
        let url = match codec.stream_url() {
            Ok(url) => url,
            Err(e) => {
                self.log_failure("stream url", &e);
                return FAILED;
            }
        };

        let connected = tokio::select! {
            _ = &mut *stop => return SessionEnd::Stopped,
            res = self.transport.connect(&url) => res,
        };
        let mut ws = match connected {
            Ok(ws) => ws,
            Err(e) => {
                self.log_failure("connect", &e);
                return FAILED;
            }
        };
        let end = self.drive(codec, ws.as_mut(), stop, commands).await;
        ws.close().await;
        end
    }

    /// Run one open socket until it fails or a stop is requested. The caller
    /// closes the socket afterwards.
    async fn drive(
        &self,
        codec: &dyn StreamProvider,
        ws: &mut dyn WsSession,
        stop: &mut oneshot::Receiver<()>,
        commands: &mut mpsc::UnboundedReceiver<Command>,
    ) -> SessionEnd {
        const FAILED: SessionEnd = SessionEnd::Ended { was_ready: false };

        self.registry.set_state(self.role, ConnectionState::Connected);

        let opening = match codec.open_frames() {
            Ok(frames) => frames,
            Err(e) => {
                self.log_failure("open frames", &e);
                return FAILED;
            }
        };
        for frame in opening {
            if let Err(e) = ws.send(frame).await {
                self.log_failure("open frames", &e);
                return FAILED;
            }
        }

        let mut ready = false;
        if !codec.requires_auth() {
            if let Err(e) = self
                .become_ready(codec, &mut *ws, commands, ConnectionState::Connected)
                .await
            {
                self.log_failure("replay", &e);
                return FAILED;
            }
            ready = true;
        }

        loop {
            tokio::select! {
                biased;
                _ = &mut *stop => return SessionEnd::Stopped,
                cmd = commands.recv(), if ready => {
                    let Some(cmd) = cmd else {
                        return SessionEnd::Stopped;
                    };
                    let frames = match cmd {
                        Command::Subscribe(symbols) => codec.subscribe_frames(&symbols),
                        Command::Unsubscribe(symbols) => codec.unsubscribe_frames(&symbols),
                    };
                    for frame in frames {
                        if let Err(e) = ws.send(frame).await {
                            self.log_failure("send", &e);
                            return SessionEnd::Ended { was_ready: ready };
                        }
                    }
                }
                frame = ws.recv() => {
                    let text = match frame {
                        None => return SessionEnd::Ended { was_ready: ready },
                        Some(Ok(text)) => text,
                        Some(Err(MercatoError::Data(_msg))) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(target: "mercato::realtime", role = self.role.as_str(), error = %_msg, "dropping frame");
                            continue;
                        }
                        Some(Err(e)) => {
                            self.log_failure("receive", &e);
                            return SessionEnd::Ended { was_ready: ready };
                        }
                    };
                    let events = match codec.decode(&text) {
                        Ok(events) => events,
                        Err(_e) => {
                            #[cfg(feature = "tracing")]
                            tracing::debug!(target: "mercato::realtime", role = self.role.as_str(), error = %_e, "dropping malformed frame");
                            continue;
                        }
                    };
                    for event in events {
                        match event {
                            StreamEvent::Authenticated if !ready => {
                                if let Err(e) = self
                                    .become_ready(codec, &mut *ws, commands, ConnectionState::Authenticated)
                                    .await
                                {
                                    self.log_failure("replay", &e);
                                    return SessionEnd::Ended { was_ready: true };
                                }
                                ready = true;
                            }
                            StreamEvent::Authenticated => {}
                            StreamEvent::Price(price) => {
                                self.registry.dispatch(&price);
                            }
                            StreamEvent::Error(_msg) => {
                                #[cfg(feature = "tracing")]
                                tracing::warn!(target: "mercato::realtime", role = self.role.as_str(), message = %_msg, "provider reported an error");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Mark the connection ready and replay the registered symbols.
    ///
    /// Commands queued before this point belong to an earlier session and are
    /// discarded; the replay covers them.
    async fn become_ready(
        &self,
        codec: &dyn StreamProvider,
        ws: &mut dyn WsSession,
        commands: &mut mpsc::UnboundedReceiver<Command>,
        state: ConnectionState,
    ) -> Result<(), MercatoError> {
        while commands.try_recv().is_ok() {}
        let replay = self.registry.mark_ready(self.role, state);
        if replay.is_empty() {
            return Ok(());
        }
        for frame in codec.subscribe_frames(&replay) {
            ws.send(frame).await?;
        }
        Ok(())
    }

    #[cfg_attr(not(feature = "tracing"), allow(clippy::unused_self))]
    fn log_failure(&self, _stage: &'static str, _err: &MercatoError) {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            target: "mercato::realtime",
            role = self.role.as_str(),
            connector = self.connector.name(),
            stage = _stage,
            error = %_err,
            "realtime connection failed"
        );
    }
}
