use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::connection::{Connection, Connector, TransportEvent};
use crate::error::{Result, SessionError};

const OUTGOING_CAPACITY: usize = 8;
const INCOMING_CAPACITY: usize = 64;

/// WebSocket transport: one JSON record per text frame
pub struct WebSocketConnector {
    connect_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait::async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, endpoint: &str) -> Result<Connection> {
        info!("Connecting to recognition server at {}", endpoint);

        let (ws, _) = timeout(self.connect_timeout, connect_async(endpoint))
            .await
            .map_err(|_| {
                SessionError::Connection(format!(
                    "Timed out after {:?} connecting to {}",
                    self.connect_timeout, endpoint
                ))
            })?
            .map_err(|e| SessionError::Connection(format!("Failed to connect to {}: {}", endpoint, e)))?;

        info!("Connected to {}", endpoint);

        let (mut sink, mut stream) = ws.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(OUTGOING_CAPACITY);
        let (incoming_tx, incoming_rx) = mpsc::channel(INCOMING_CAPACITY);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = outgoing_rx.recv() => match outgoing {
                        Some(text) => {
                            if let Err(e) = sink.send(Message::Text(text.into())).await {
                                let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                                break;
                            }
                        }
                        None => {
                            // Session released the connection
                            if let Err(e) = sink.close().await {
                                debug!("Error closing WebSocket: {}", e);
                            }
                            break;
                        }
                    },
                    incoming = stream.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if incoming_tx.send(TransportEvent::Text(text.as_str().to_owned())).await.is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.as_str().to_owned())
                                .filter(|r| !r.is_empty());
                            // Flush the queued close reply
                            if let Err(e) = sink.close().await {
                                debug!("Error completing close handshake: {}", e);
                            }
                            let _ = incoming_tx.send(TransportEvent::Closed(reason)).await;
                            break;
                        }
                        Some(Ok(Message::Binary(data))) => {
                            warn!("Ignoring {}-byte binary frame", data.len());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                            break;
                        }
                        None => {
                            let _ = incoming_tx.send(TransportEvent::Closed(None)).await;
                            break;
                        }
                    },
                }
            }

            debug!("WebSocket pump stopped");
        });

        Ok(Connection {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }

    fn name(&self) -> &str {
        "websocket"
    }
}
