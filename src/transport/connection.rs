use tokio::sync::mpsc;

use crate::error::Result;

/// Something that happened on an open connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A text frame arrived
    Text(String),
    /// Peer closed the connection, with its close reason if any
    Closed(Option<String>),
    /// Transport failed; the connection is unusable
    Error(String),
}

/// An open, text-framed, bidirectional connection
///
/// Dropping `outgoing` releases the connection: the transport closes it
/// once the frames already handed over are written.
pub struct Connection {
    pub outgoing: mpsc::Sender<String>,
    pub incoming: mpsc::Receiver<TransportEvent>,
}

/// Opens connections to the recognition server
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Connection>;

    /// Connector name for logging
    fn name(&self) -> &str;
}
