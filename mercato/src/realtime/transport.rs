//! Socket transport seam for realtime connections.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use mercato_core::MercatoError;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Opens text-frame sessions to a URL.
#[async_trait]
pub trait WsConnect: Send + Sync {
    /// Open a session.
    ///
    /// # Errors
    /// `Stream` when the handshake fails.
    async fn connect(&self, url: &str) -> Result<Box<dyn WsSession>, MercatoError>;
}

/// One open socket carrying text frames.
#[async_trait]
pub trait WsSession: Send {
    /// Send a text frame.
    ///
    /// # Errors
    /// `Stream` when the socket is gone.
    async fn send(&mut self, text: String) -> Result<(), MercatoError>;

    /// Next inbound text frame; `None` once the peer closed the socket.
    ///
    /// Must be cancel safe: it is raced against other events.
    async fn recv(&mut self) -> Option<Result<String, MercatoError>>;

    /// Close politely. Errors are ignored.
    async fn close(&mut self) {}
}

/// `tokio-tungstenite` transport used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnect;

#[async_trait]
impl WsConnect for TungsteniteConnect {
    async fn connect(&self, url: &str) -> Result<Box<dyn WsSession>, MercatoError> {
        let (ws, _response) = connect_async(url)
            .await
            .map_err(|e| MercatoError::Stream(format!("connect failed: {e}")))?;
        Ok(Box::new(TungsteniteSession { ws }))
    }
}

struct TungsteniteSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl WsSession for TungsteniteSession {
    async fn send(&mut self, text: String) -> Result<(), MercatoError> {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| MercatoError::Stream(format!("send failed: {e}")))
    }

    async fn recv(&mut self) -> Option<Result<String, MercatoError>> {
        loop {
            match self.ws.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => {
                    // some providers send JSON as binary frames
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| MercatoError::Data(format!("non-utf8 frame: {e}"))),
                    );
                }
                Ok(Message::Ping(payload)) => {
                    if let Err(e) = self.ws.send(Message::Pong(payload)).await {
                        return Some(Err(MercatoError::Stream(format!("pong failed: {e}"))));
                    }
                }
                Ok(Message::Close(_)) => return None,
                Ok(Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(MercatoError::Stream(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
