pub mod connection;
pub mod websocket;

pub use connection::{Connection, Connector, TransportEvent};
pub use websocket::WebSocketConnector;
