// Shared helpers for session tests
//
// MockConnector hands out channel-backed connections; each successful
// connect delivers the server side (MockServer) to the test.

#![allow(dead_code)]

use serde_json::Value;
use signflow::{Connection, Connector, SessionConfig, SessionError, TransportEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

pub struct MockServer {
    /// Frames written by the session
    pub received: mpsc::Receiver<String>,
    /// Events to deliver to the session
    pub events: mpsc::Sender<TransportEvent>,
}

impl MockServer {
    /// Next frame from the session, parsed
    pub async fn next_message(&mut self) -> Option<Value> {
        let text = tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .ok()??;
        Some(serde_json::from_str(&text).expect("session sent invalid JSON"))
    }

    /// Everything already written, without waiting
    pub fn drain(&mut self) -> Vec<Value> {
        let mut messages = Vec::new();
        while let Ok(text) = self.received.try_recv() {
            messages.push(serde_json::from_str(&text).expect("session sent invalid JSON"));
        }
        messages
    }

    pub async fn send_text(&self, text: &str) {
        self.events
            .send(TransportEvent::Text(text.to_string()))
            .await
            .expect("session dropped the connection");
    }
}

pub struct MockConnector {
    servers: mpsc::UnboundedSender<MockServer>,
    failure: Option<String>,
    /// Held by connect() until the test releases it
    gate: Mutex<Option<mpsc::Receiver<()>>>,
    pub attempts: AtomicUsize,
}

impl MockConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MockServer>) {
        let (servers, servers_rx) = mpsc::unbounded_channel();
        (
            Self {
                servers,
                failure: None,
                gate: Mutex::new(None),
                attempts: AtomicUsize::new(0),
            },
            servers_rx,
        )
    }

    pub fn failing(reason: &str) -> Self {
        let (mut connector, _) = Self::new();
        connector.failure = Some(reason.to_string());
        connector
    }

    /// Connects block until the returned sender sends `()` (once per connect)
    pub fn gated() -> (Self, mpsc::UnboundedReceiver<MockServer>, mpsc::Sender<()>) {
        let (connector, servers) = Self::new();
        let (gate_tx, gate_rx) = mpsc::channel(4);
        *connector.gate.try_lock().expect("fresh mutex") = Some(gate_rx);
        (connector, servers, gate_tx)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    async fn connect(&self, _endpoint: &str) -> Result<Connection, SessionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = self.gate.lock().await.as_mut() {
            gate.recv().await;
        }

        if let Some(reason) = &self.failure {
            return Err(SessionError::Connection(reason.clone()));
        }

        let (outgoing_tx, outgoing_rx) = mpsc::channel(256);
        let (incoming_tx, incoming_rx) = mpsc::channel(64);

        let _ = self.servers.send(MockServer {
            received: outgoing_rx,
            events: incoming_tx,
        });

        Ok(Connection {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        session_id: "test-session".to_string(),
        endpoint: "ws://mock/".to_string(),
        initial_language: "en".to_string(),
        ..SessionConfig::default()
    }
}
