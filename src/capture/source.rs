use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

use super::pattern::TestPatternSource;
use super::still::StillImageSource;

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero width or height means the source has nothing usable yet
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Byte length of a tightly packed RGB8 buffer of this size
    pub fn rgb_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// A still frame polled from a capture source
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Tightly packed RGB8 pixels, row-major
    pub pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Live video feed consumed by the streaming session
///
/// The session only polls this contract on its own clock and never
/// mutates the source, so one source may back several readers.
pub trait CaptureSource: Send + Sync {
    /// Latest frame, or `None` while the feed is not ready
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Notified whenever the native frame size changes
    fn subscribe_dimensions(&self) -> watch::Receiver<Option<Dimensions>>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Which capture source to build
#[derive(Debug, Clone)]
pub enum CaptureSourceKind {
    /// Animated gradient at a fixed size
    TestPattern { width: u32, height: u32 },
    /// A single image file served on every poll
    StillImage(PathBuf),
}

/// Capture source factory
pub struct CaptureSourceFactory;

impl CaptureSourceFactory {
    pub fn create(kind: CaptureSourceKind) -> Result<Arc<dyn CaptureSource>> {
        match kind {
            CaptureSourceKind::TestPattern { width, height } => {
                Ok(Arc::new(TestPatternSource::new(width, height)))
            }
            CaptureSourceKind::StillImage(path) => {
                let source = StillImageSource::open(&path)
                    .with_context(|| format!("Failed to open capture image {:?}", path))?;
                Ok(Arc::new(source))
            }
        }
    }
}
