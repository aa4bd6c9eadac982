use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use panel_core::Envelope;
use panel_logging::{panel_debug, panel_info, panel_warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("connecting to {url} timed out after {timeout:?}")]
    ConnectTimeout { url: String, timeout: Duration },
    #[error("not connected")]
    NotConnected,
    #[error("connection closed")]
    Closed,
    #[error("could not encode frame: {0}")]
    Encode(String),
}

/// Outbound half of a live connection.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError>;
}

/// A live connection. `inbound` yields `None` once the peer is gone.
pub struct Connection {
    pub sender: Arc<dyn Transport>,
    pub inbound: mpsc::UnboundedReceiver<Envelope>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, TransportError>;
}

/// Text-frame WebSocket connection to the backend.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        let (stream, _) =
            match tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str())).await
            {
                Ok(Ok(ok)) => ok,
                Ok(Err(err)) => {
                    return Err(TransportError::Connect {
                        url: self.url.clone(),
                        message: err.to_string(),
                    })
                }
                Err(_) => {
                    return Err(TransportError::ConnectTimeout {
                        url: self.url.clone(),
                        timeout: self.connect_timeout,
                    })
                }
            };
        panel_info!("Connected to {}", self.url);

        let (mut write, mut read) = stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(frame) = outgoing_rx.recv().await {
                if write.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            while let Some(next) = read.next().await {
                let text = match next {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        panel_warn!("Socket read failed: {err}");
                        break;
                    }
                };
                match Envelope::from_wire(text.as_str()) {
                    Ok(envelope) => {
                        if inbound_tx.send(envelope).is_err() {
                            break;
                        }
                    }
                    Err(err) => panel_warn!("Dropping malformed frame: {err}"),
                }
            }
            panel_debug!("Socket reader finished");
        });

        Ok(Connection {
            sender: Arc::new(WebSocketSender { tx: outgoing_tx }),
            inbound: inbound_rx,
        })
    }
}

struct WebSocketSender {
    tx: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Transport for WebSocketSender {
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let frame = envelope
            .to_wire()
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        self.tx.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// The backend side of one in-memory connection.
///
/// Dropping it closes the connection as seen by the client.
pub struct ChannelBackend {
    pub sent: mpsc::UnboundedReceiver<Envelope>,
    pub push: mpsc::UnboundedSender<Envelope>,
}

impl ChannelBackend {
    pub async fn next_sent(&mut self) -> Option<Envelope> {
        self.sent.recv().await
    }

    pub fn reply(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.push.send(envelope).map_err(|_| TransportError::Closed)
    }
}

/// In-memory connector. Every successful `connect` hands a fresh
/// [`ChannelBackend`] to the receiver returned by [`ChannelConnector::new`].
#[derive(Clone)]
pub struct ChannelConnector {
    backends: mpsc::UnboundedSender<ChannelBackend>,
    online: Arc<AtomicBool>,
}

impl ChannelConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelBackend>) {
        let (backends, rx) = mpsc::unbounded_channel();
        let connector = Self {
            backends,
            online: Arc::new(AtomicBool::new(true)),
        };
        (connector, rx)
    }

    /// While offline, `connect` fails.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                url: "channel".to_string(),
                message: "backend offline".to_string(),
            });
        }
        let (to_backend, sent) = mpsc::unbounded_channel();
        let (push, inbound) = mpsc::unbounded_channel();
        self.backends
            .send(ChannelBackend { sent, push })
            .map_err(|_| TransportError::Closed)?;
        Ok(Connection {
            sender: Arc::new(ChannelSender { tx: to_backend }),
            inbound,
        })
    }
}

struct ChannelSender {
    tx: mpsc::UnboundedSender<Envelope>,
}

#[async_trait]
impl Transport for ChannelSender {
    /// Goes through the wire encoding so tests see exactly what a socket would carry.
    async fn send(&self, envelope: Envelope) -> Result<(), TransportError> {
        let frame = envelope
            .to_wire()
            .map_err(|err| TransportError::Encode(err.to_string()))?;
        let decoded =
            Envelope::from_wire(&frame).map_err(|err| TransportError::Encode(err.to_string()))?;
        self.tx.send(decoded).map_err(|_| TransportError::Closed)
    }
}
