#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use mercato::realtime::{WsConnect, WsSession};
use mercato_core::MercatoError;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

/// In-memory socket transport. Every accepted connection is handed to the test
/// as a [`Peer`] playing the provider's side.
pub struct TestTransport {
    refuse: AtomicBool,
    connects: AtomicUsize,
    fail_sends: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
    accepted: mpsc::UnboundedSender<Peer>,
}

/// Provider side of one in-memory connection.
pub struct Peer {
    pub url: String,
    outbound: mpsc::UnboundedReceiver<String>,
    inbound: Option<mpsc::UnboundedSender<String>>,
}

struct Session {
    to_peer: mpsc::UnboundedSender<String>,
    from_peer: mpsc::UnboundedReceiver<String>,
    fail_sends: Arc<AtomicBool>,
    closes: Arc<AtomicUsize>,
}

pub fn transport() -> (Arc<TestTransport>, mpsc::UnboundedReceiver<Peer>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        Arc::new(TestTransport {
            refuse: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            fail_sends: Arc::new(AtomicBool::new(false)),
            closes: Arc::new(AtomicUsize::new(0)),
            accepted: tx,
        }),
        rx,
    )
}

impl TestTransport {
    /// Make every following connect attempt fail.
    pub fn refuse(&self, yes: bool) {
        self.refuse.store(yes, Ordering::SeqCst);
    }

    /// Make every following frame send fail on every session.
    pub fn fail_sends(&self, yes: bool) {
        self.fail_sends.store(yes, Ordering::SeqCst);
    }

    /// Sessions the client closed so far.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Connect attempts so far, failed ones included.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WsConnect for TestTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn WsSession>, MercatoError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(MercatoError::Stream("connection refused".into()));
        }
        let (to_peer, outbound) = mpsc::unbounded_channel();
        let (inbound, from_peer) = mpsc::unbounded_channel();
        let peer = Peer {
            url: url.to_string(),
            outbound,
            inbound: Some(inbound),
        };
        self.accepted
            .send(peer)
            .map_err(|_| MercatoError::Stream("test harness gone".into()))?;
        Ok(Box::new(Session {
            to_peer,
            from_peer,
            fail_sends: Arc::clone(&self.fail_sends),
            closes: Arc::clone(&self.closes),
        }))
    }
}

#[async_trait]
impl WsSession for Session {
    async fn send(&mut self, text: String) -> Result<(), MercatoError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(MercatoError::Stream("send failed".into()));
        }
        self.to_peer
            .send(text)
            .map_err(|_| MercatoError::Stream("peer closed".into()))
    }

    async fn recv(&mut self) -> Option<Result<String, MercatoError>> {
        self.from_peer.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Peer {
    /// Next frame the client sent; panics after five seconds of silence.
    pub async fn next_frame(&mut self) -> String {
        timeout(Duration::from_secs(5), self.outbound.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("client closed the socket")
    }

    /// Frames sent so far without waiting.
    pub fn sent(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(f) = self.outbound.try_recv() {
            out.push(f);
        }
        out
    }

    /// Wait until the client drops its end.
    pub async fn closed(&mut self) {
        loop {
            match timeout(Duration::from_secs(5), self.outbound.recv()).await {
                Ok(None) => return,
                Ok(Some(_)) => {}
                Err(_) => panic!("client kept the socket open"),
            }
        }
    }

    /// Push a frame to the client.
    pub fn push(&self, text: &str) {
        if let Some(tx) = &self.inbound {
            let _ = tx.send(text.to_string());
        }
    }

    /// Hang up; the client sees the socket close.
    pub fn hang_up(&mut self) {
        self.inbound = None;
    }
}

/// Next accepted connection; panics after a minute, which leaves room for
/// reconnect delays under a paused clock.
pub async fn accept(rx: &mut mpsc::UnboundedReceiver<Peer>) -> Peer {
    timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for a connection")
        .expect("transport dropped")
}

/// Poll `cond` while letting background tasks run.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// Let background tasks drain their queues.
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
