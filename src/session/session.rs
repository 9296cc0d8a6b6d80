use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, warn};

use super::config::{normalize_language, SessionConfig};
use super::notification::Notification;
use super::outbound::OutboundQueue;
use super::state::SessionState;
use super::stats::{RecognizedWord, SessionStats};
use crate::capture::{CaptureSource, Dimensions};
use crate::encoder::{FrameEncoder, FrameThrottle};
use crate::error::{Result, SessionError};
use crate::protocol::{self, InboundMessage, Mode, OutboundMessage};
use crate::transport::{Connection, Connector, TransportEvent, WebSocketConnector};

/// A streaming session: one connection to the recognition server at a time,
/// a throttled frame loop while connected, and the control messages that
/// go with it
///
/// All mutable state sits behind one lock. Every event (connect result,
/// inbound frame, throttle tick, caller operation) takes the lock, checks
/// that it still belongs to the current connection, and runs to completion.
/// Each `start()` begins a new connection epoch, so events left over from an
/// earlier connection are dropped on arrival.
pub struct StreamingSession {
    config: SessionConfig,
    source: Arc<dyn CaptureSource>,
    connector: Arc<dyn Connector>,
    shared: Arc<Mutex<SessionInner>>,
}

struct SessionInner {
    session_id: String,
    state: SessionState,
    mode: Mode,
    language: String,

    /// Bumped on every `start()`
    epoch: u64,

    /// Present iff the state is `Open`
    outbound: Option<OutboundQueue>,
    writer_task: Option<JoinHandle<()>>,
    connection_task: Option<JoinHandle<()>>,
    throttle: FrameThrottle,

    notifications: mpsc::UnboundedSender<Notification>,

    started_at: DateTime<Utc>,
    connected_at: Option<DateTime<Utc>>,
    connection_attempts: u64,
    frames_encoded: u64,
    frames_superseded: u64,
    last_frame_size: Option<Dimensions>,
    words: Vec<RecognizedWord>,
}

impl StreamingSession {
    /// Create an idle session
    ///
    /// Returns the session and the receiver for its notifications.
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn CaptureSource>,
        connector: Arc<dyn Connector>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>)> {
        config.validate()?;
        let language = normalize_language(&config.initial_language)?;

        info!(
            "Creating streaming session: {} ({} via {}, {} fps)",
            config.session_id,
            source.name(),
            connector.name(),
            config.target_frame_rate
        );

        let (notifications, notifications_rx) = mpsc::unbounded_channel();

        let inner = SessionInner {
            session_id: config.session_id.clone(),
            state: SessionState::Idle,
            mode: config.initial_mode,
            language,
            epoch: 0,
            outbound: None,
            writer_task: None,
            connection_task: None,
            throttle: FrameThrottle::new(config.target_frame_rate),
            notifications,
            started_at: Utc::now(),
            connected_at: None,
            connection_attempts: 0,
            frames_encoded: 0,
            frames_superseded: 0,
            last_frame_size: None,
            words: Vec::new(),
        };

        Ok((
            Self {
                config,
                source,
                connector,
                shared: Arc::new(Mutex::new(inner)),
            },
            notifications_rx,
        ))
    }

    /// Create a session that connects over WebSocket
    pub fn with_websocket(
        config: SessionConfig,
        source: Arc<dyn CaptureSource>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>)> {
        let connector = Arc::new(WebSocketConnector::new(config.connect_timeout));
        Self::new(config, source, connector)
    }

    /// Begin connecting
    ///
    /// Valid from `Idle` and `Closed`. Returns once the connection attempt
    /// is under way; the outcome arrives as a notification. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self) -> Result<()> {
        let mut inner = self.shared.lock();

        if !inner.state.can_start() {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: inner.state,
            });
        }

        inner.epoch += 1;
        inner.connection_attempts += 1;
        inner.set_state(SessionState::Connecting);

        info!(
            "Starting streaming session {} (connection {})",
            inner.session_id, inner.epoch
        );

        let context = ConnectionContext {
            shared: Arc::clone(&self.shared),
            connector: Arc::clone(&self.connector),
            source: Arc::clone(&self.source),
            endpoint: self.config.endpoint.clone(),
            jpeg_quality: self.config.jpeg_quality,
            max_frame_width: self.config.max_frame_width,
            epoch: inner.epoch,
        };
        inner.connection_task = Some(tokio::spawn(run_connection(context)));

        Ok(())
    }

    /// Stop streaming and release the connection
    ///
    /// Takes effect immediately: once this returns no frame or control
    /// message from the stopped connection reaches the transport. Safe to
    /// call in any state.
    pub fn stop(&self) -> SessionStats {
        {
            let mut inner = self.shared.lock();
            if inner.state.is_active() {
                info!("Stopping streaming session {}", inner.session_id);
                inner.teardown();
            } else {
                debug!("Session {} not active", inner.session_id);
            }
        }

        self.stats()
    }

    /// Switch operating mode; announced immediately if connected,
    /// otherwise on the next connect
    ///
    /// Returns `false` if `mode` was already current.
    pub fn set_mode(&self, mode: Mode) -> bool {
        let mut inner = self.shared.lock();

        if inner.mode == mode {
            return false;
        }

        inner.mode = mode;
        info!("Mode set to {}", mode);

        if inner.state == SessionState::Open {
            inner.send_control(&OutboundMessage::Mode { mode });
        }

        true
    }

    /// Switch recognition language; announced immediately if connected,
    /// otherwise on the next connect
    ///
    /// Returns `Ok(false)` if the language was already current.
    pub fn set_language(&self, lang: &str) -> Result<bool> {
        let lang = normalize_language(lang)?;
        let mut inner = self.shared.lock();

        if inner.language == lang {
            return Ok(false);
        }

        info!("Language set to {}", lang);
        inner.language = lang.clone();

        if inner.state == SessionState::Open {
            inner.send_control(&OutboundMessage::Language { lang });
        } else {
            debug!("Language change deferred until connected");
        }

        Ok(true)
    }

    /// Tell the server which gesture will be demonstrated next
    pub fn send_gloss(&self, text: &str) -> Result<()> {
        let gloss = text.trim();
        if gloss.is_empty() {
            return Err(SessionError::Validation("gloss must not be empty".to_string()));
        }

        let inner = self.shared.lock();
        if inner.state != SessionState::Open {
            return Err(SessionError::NotConnected);
        }
        let queue = inner.outbound.as_ref().ok_or(SessionError::NotConnected)?;

        queue.send_control(&OutboundMessage::Gloss {
            gloss: gloss.to_string(),
        })?;

        if inner.mode != Mode::Training {
            debug!("Gloss sent outside TRAINING mode; the server will ignore it");
        }
        info!("Gloss '{}' sent for training", gloss);

        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    pub fn mode(&self) -> Mode {
        self.shared.lock().mode
    }

    pub fn language(&self) -> String {
        self.shared.lock().language.clone()
    }

    pub fn target_frame_rate(&self) -> u32 {
        self.config.target_frame_rate
    }

    /// Size of the last frame sent
    pub fn last_frame_size(&self) -> Option<Dimensions> {
        self.shared.lock().last_frame_size
    }

    /// Whether the frame throttle timer is armed
    pub fn has_active_timer(&self) -> bool {
        self.shared.lock().throttle.is_running()
    }

    /// Whether a connection handle is currently held
    pub fn has_connection(&self) -> bool {
        self.shared.lock().outbound.is_some()
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let inner = self.shared.lock();

        SessionStats {
            session_id: inner.session_id.clone(),
            state: inner.state,
            mode: inner.mode,
            language: inner.language.clone(),
            started_at: inner.started_at,
            connected_at: inner.connected_at,
            connection_attempts: inner.connection_attempts,
            frames_encoded: inner.frames_encoded,
            frames_superseded: inner.frames_superseded,
            words_recognized: inner.words.len() as u64,
            last_frame_size: inner.last_frame_size,
        }
    }

    /// Words recognized so far, oldest first
    pub fn recognized_words(&self) -> Vec<RecognizedWord> {
        self.shared.lock().words.clone()
    }
}

impl Drop for StreamingSession {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if inner.state.is_active() {
            inner.teardown();
        }
    }
}

impl SessionInner {
    fn set_state(&mut self, state: SessionState) {
        debug!("Session {}: {} -> {}", self.session_id, self.state, state);
        self.state = state;
    }

    /// Whether an event from connection `epoch` still applies
    fn is_current(&self, epoch: u64, state: SessionState) -> bool {
        self.epoch == epoch && self.state == state
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }

    fn send_control(&self, message: &OutboundMessage) {
        if let Some(queue) = &self.outbound {
            if let Err(e) = queue.send_control(message) {
                warn!("Failed to send {} message: {}", message.kind(), e);
            }
        }
    }

    /// Connecting -> Open: flush language, arm the throttle, flush mode
    fn open(
        &mut self,
        shared: Weak<Mutex<SessionInner>>,
        source: Arc<dyn CaptureSource>,
        encoder: FrameEncoder,
        transport: mpsc::Sender<String>,
    ) {
        let (queue, writer) = OutboundQueue::open(transport);
        self.outbound = Some(queue);
        self.writer_task = Some(writer);
        self.connected_at = Some(Utc::now());
        self.set_state(SessionState::Open);

        // The server must know language and mode before it interprets frames
        self.send_control(&OutboundMessage::Language {
            lang: self.language.clone(),
        });
        let tick = FrameTick::new(shared, source, encoder, self.epoch);
        self.throttle.start(move || tick.clone().run());
        self.send_control(&OutboundMessage::Mode { mode: self.mode });

        info!(
            "Session {} connected (language {}, mode {})",
            self.session_id, self.language, self.mode
        );
        self.notify(Notification::Connected);
    }

    /// Cancel the throttle, release the connection, end in `Closed`
    fn teardown(&mut self) {
        self.set_state(SessionState::Closing);

        self.throttle.stop();
        self.outbound = None;
        if let Some(writer) = self.writer_task.take() {
            writer.abort();
        }
        if let Some(task) = self.connection_task.take() {
            task.abort();
        }

        self.set_state(SessionState::Closed);
    }

    fn handle_inbound(&mut self, payload: &str) {
        match protocol::decode(payload) {
            Ok(InboundMessage::Word { text }) => {
                info!("Recognized gesture: {}", text);
                self.words.push(RecognizedWord {
                    text: text.clone(),
                    received_at: Utc::now(),
                });
                self.notify(Notification::RecognizedWord { text });
            }
            Ok(InboundMessage::Status { status, message }) if status >= 400 => {
                warn!(
                    "Server reported status {}: {}",
                    status,
                    message.as_deref().unwrap_or("")
                );
                self.notify(Notification::ServerError { status, message });
            }
            Ok(InboundMessage::Status { status, message }) => {
                debug!("Server status {}: {:?}", status, message);
            }
            Ok(InboundMessage::Unknown { tag }) => {
                debug!("Ignoring inbound message with type {:?}", tag);
            }
            Err(e) => {
                warn!("Failed to decode inbound message: {}", e);
            }
        }
    }
}

struct ConnectionContext {
    shared: Arc<Mutex<SessionInner>>,
    connector: Arc<dyn Connector>,
    source: Arc<dyn CaptureSource>,
    endpoint: String,
    jpeg_quality: f32,
    max_frame_width: Option<u32>,
    epoch: u64,
}

/// Connect, then dispatch transport events until the connection ends
async fn run_connection(context: ConnectionContext) {
    let ConnectionContext {
        shared,
        connector,
        source,
        endpoint,
        jpeg_quality,
        max_frame_width,
        epoch,
    } = context;

    let connected = connector.connect(&endpoint).await;

    let mut incoming = match connected {
        Ok(Connection { outgoing, incoming }) => {
            let mut inner = shared.lock();
            if !inner.is_current(epoch, SessionState::Connecting) {
                debug!("Discarding connection {} opened after stop", epoch);
                return;
            }
            inner.open(
                Arc::downgrade(&shared),
                source,
                FrameEncoder::new(jpeg_quality, max_frame_width),
                outgoing,
            );
            incoming
        }
        Err(e) => {
            let mut inner = shared.lock();
            if inner.is_current(epoch, SessionState::Connecting) {
                error!("Failed to connect to {}: {}", endpoint, e);
                // This task is finishing on its own
                inner.connection_task = None;
                inner.teardown();
                inner.notify(Notification::ConnectionError {
                    reason: e.to_string(),
                });
            }
            return;
        }
    };

    while let Some(event) = incoming.recv().await {
        let mut inner = shared.lock();
        if !inner.is_current(epoch, SessionState::Open) {
            return;
        }

        match event {
            TransportEvent::Text(payload) => inner.handle_inbound(&payload),
            TransportEvent::Closed(reason) => {
                info!("Server closed connection: {:?}", reason);
                inner.connection_task = None;
                inner.teardown();
                inner.notify(Notification::ConnectionClosed { reason });
                return;
            }
            TransportEvent::Error(reason) => {
                error!("Connection error: {}", reason);
                inner.connection_task = None;
                inner.teardown();
                inner.notify(Notification::ConnectionError { reason });
                return;
            }
        }
    }

    let mut inner = shared.lock();
    if inner.is_current(epoch, SessionState::Open) {
        warn!("Transport ended without a close frame");
        inner.connection_task = None;
        inner.teardown();
        inner.notify(Notification::ConnectionClosed { reason: None });
    }
}

/// Per-tick frame capture for connection `epoch`
///
/// Polling, encoding and serializing run on the blocking pool so a large
/// frame never stalls the runtime. The session lock is taken before and
/// after that work to check the connection is still current; the frame is
/// handed to the writer only if it is.
#[derive(Clone)]
struct FrameTick {
    shared: Weak<Mutex<SessionInner>>,
    source: Arc<dyn CaptureSource>,
    encoder: Arc<Mutex<FrameEncoder>>,
    dimensions_rx: Arc<Mutex<watch::Receiver<Option<Dimensions>>>>,
    epoch: u64,
}

/// A frame ready for the writer
struct CapturedFrame {
    payload: String,
    dimensions: Dimensions,
}

impl FrameTick {
    fn new(
        shared: Weak<Mutex<SessionInner>>,
        source: Arc<dyn CaptureSource>,
        encoder: FrameEncoder,
        epoch: u64,
    ) -> Self {
        let dimensions_rx = source.subscribe_dimensions();

        Self {
            shared,
            source,
            encoder: Arc::new(Mutex::new(encoder)),
            dimensions_rx: Arc::new(Mutex::new(dimensions_rx)),
            epoch,
        }
    }

    fn is_current(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        let current = shared.lock().is_current(self.epoch, SessionState::Open);
        current
    }

    async fn run(self) {
        if !self.is_current() {
            return;
        }

        {
            let mut dimensions_rx = self.dimensions_rx.lock();
            if dimensions_rx.has_changed().unwrap_or(false) {
                let dimensions = *dimensions_rx.borrow_and_update();
                debug!("Capture source {} now reports {:?}", self.source.name(), dimensions);
            }
        }

        let source = Arc::clone(&self.source);
        let encoder = Arc::clone(&self.encoder);
        let captured = match task::spawn_blocking(move || {
            let mut encoder = encoder.lock();
            capture_frame(source.as_ref(), &mut encoder)
        })
        .await
        {
            Ok(Some(captured)) => captured,
            Ok(None) => return,
            Err(e) => {
                warn!("Frame capture task failed: {}", e);
                return;
            }
        };

        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let mut inner = shared.lock();
        if !inner.is_current(self.epoch, SessionState::Open) {
            return;
        }
        let Some(queue) = inner.outbound.as_ref() else {
            return;
        };
        let superseded = queue.offer_frame(captured.payload);

        inner.frames_encoded += 1;
        if superseded {
            inner.frames_superseded += 1;
        }
        inner.last_frame_size = Some(captured.dimensions);
    }
}

/// Poll, encode and serialize one frame. Blocking.
fn capture_frame(source: &dyn CaptureSource, encoder: &mut FrameEncoder) -> Option<CapturedFrame> {
    // Dimensions are read once per tick, with the frame
    let frame = source.current_frame()?;
    let dimensions = frame.dimensions();
    if dimensions.is_empty() {
        return None;
    }

    let encoded = match encoder.encode(&frame) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!("Dropping frame: {}", e);
            return None;
        }
    };

    let message = OutboundMessage::Image {
        image: encoded.data_url,
        timestamp: encoded.timestamp_ms,
    };
    match message.to_json() {
        Ok(payload) => Some(CapturedFrame {
            payload,
            dimensions,
        }),
        Err(e) => {
            warn!("Failed to serialize frame: {}", e);
            None
        }
    }
}
