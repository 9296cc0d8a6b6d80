pub mod capture;
pub mod config;
pub mod encoder;
pub mod error;
pub mod http;
pub mod protocol;
pub mod session;
pub mod transport;

pub use capture::{
    CaptureSource, CaptureSourceFactory, CaptureSourceKind, Dimensions, StillImageSource,
    TestPatternSource, VideoFrame,
};
pub use config::Config;
pub use encoder::{EncodedFrame, FrameEncoder, FrameThrottle};
pub use error::{DecodeError, EncodeError, SessionError};
pub use http::{create_router, AppState};
pub use protocol::{InboundMessage, Mode, OutboundMessage};
pub use session::{
    Notification, RecognizedWord, SessionConfig, SessionState, SessionStats, StreamingSession,
};
pub use transport::{Connection, Connector, TransportEvent, WebSocketConnector};
