use mercato_types::{MercatoError, RealtimePrice};
use tokio::task::JoinHandle;

/// Decoded content of one inbound stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The provider accepted our credentials.
    Authenticated,
    /// A price update.
    Price(RealtimePrice),
    /// Provider-reported error (bad auth, subscription rejected, ...).
    Error(String),
}

/// Codec for one realtime provider's socket protocol.
///
/// Implementations are pure: they build outbound frames and decode inbound ones
/// without touching the network, so the reconnecting driver can be shared by
/// every provider.
pub trait StreamProvider: Send + Sync {
    /// Socket URL including any credential query parameters.
    ///
    /// # Errors
    /// `MisconfiguredCredentials` when the provider has no key.
    fn stream_url(&self) -> Result<String, MercatoError>;

    /// Frames to send right after the socket opens (typically authentication).
    ///
    /// # Errors
    /// `MisconfiguredCredentials` when credentials are missing.
    fn open_frames(&self) -> Result<Vec<String>, MercatoError> {
        Ok(Vec::new())
    }

    /// Whether subscriptions must wait for [`StreamEvent::Authenticated`].
    fn requires_auth(&self) -> bool {
        false
    }

    /// Frames subscribing to `symbols`.
    fn subscribe_frames(&self, symbols: &[String]) -> Vec<String>;

    /// Frames unsubscribing from `symbols`.
    fn unsubscribe_frames(&self, symbols: &[String]) -> Vec<String>;

    /// Decode one text frame.
    ///
    /// Frames that are valid but carry nothing of interest (pings, acks) decode to
    /// an empty vector.
    ///
    /// # Errors
    /// `Data` for frames that cannot be parsed.
    fn decode(&self, text: &str) -> Result<Vec<StreamEvent>, MercatoError>;
}

/// Owner of a background streaming task.
///
/// Dropping the handle stops the task; [`stop`](Self::stop) does the same and
/// waits for it to wind down.
#[derive(Debug)]
pub struct StreamHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl StreamHandle {
    /// Wrap a spawned task and its stop channel.
    #[must_use]
    pub const fn new(inner: JoinHandle<()>, stop_tx: tokio::sync::oneshot::Sender<()>) -> Self {
        Self {
            inner: Some(inner),
            stop_tx: Some(stop_tx),
        }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.inner.take() {
            let _ = h.await;
        }
    }

    /// Abort the task without waiting.
    pub fn abort(mut self) {
        if let Some(h) = self.inner.take() {
            h.abort();
        }
    }

    /// True once the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.inner.take()
            && !h.is_finished()
        {
            h.abort();
        }
    }
}
