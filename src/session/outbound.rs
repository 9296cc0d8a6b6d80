use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::protocol::OutboundMessage;

/// Per-connection send queue
///
/// Control messages are queued in order and never dropped. Frames go into
/// a single slot: a newer frame replaces one the writer has not taken yet,
/// so a slow transport sees the freshest frame rather than a backlog. The
/// writer always drains pending control messages before the frame slot.
pub(crate) struct OutboundQueue {
    control: mpsc::UnboundedSender<String>,
    frame: Arc<FrameSlot>,
}

#[derive(Default)]
struct FrameSlot {
    pending: Mutex<Option<String>>,
    ready: Notify,
}

impl OutboundQueue {
    /// Spawn the writer feeding `transport`; it stops when the queue is dropped
    pub(crate) fn open(transport: mpsc::Sender<String>) -> (Self, JoinHandle<()>) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let frame = Arc::new(FrameSlot::default());

        let writer = tokio::spawn(write_loop(control_rx, Arc::clone(&frame), transport));

        (
            Self {
                control: control_tx,
                frame,
            },
            writer,
        )
    }

    pub(crate) fn send_control(&self, message: &OutboundMessage) -> Result<()> {
        let payload = message.to_json()?;
        self.control
            .send(payload)
            .map_err(|_| SessionError::Connection("Connection writer has stopped".to_string()))?;
        debug!("Queued {} message", message.kind());
        Ok(())
    }

    /// Offer a serialized frame; returns `true` if it replaced an unsent one
    pub(crate) fn offer_frame(&self, payload: String) -> bool {
        let replaced = self.frame.pending.lock().replace(payload).is_some();
        self.frame.ready.notify_one();
        replaced
    }
}

async fn write_loop(
    mut control: mpsc::UnboundedReceiver<String>,
    frame: Arc<FrameSlot>,
    transport: mpsc::Sender<String>,
) {
    loop {
        let payload = tokio::select! {
            biased;
            message = control.recv() => match message {
                Some(message) => message,
                None => break,
            },
            _ = frame.ready.notified() => {
                let pending = frame.pending.lock().take();
                match pending {
                    Some(payload) => payload,
                    None => continue,
                }
            }
        };

        if transport.send(payload).await.is_err() {
            break;
        }
    }

    debug!("Outbound writer stopped");
}
