use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::info;

use super::source::{CaptureSource, Dimensions, VideoFrame};

/// Synthetic capture source producing a moving colour gradient
///
/// Useful without a camera: the CLI falls back to it and the tests drive
/// resizes and outages through [`resize`](Self::resize) and
/// [`set_available`](Self::set_available).
pub struct TestPatternSource {
    state: Mutex<PatternState>,
    dimensions_tx: watch::Sender<Option<Dimensions>>,
}

struct PatternState {
    dimensions: Dimensions,
    available: bool,
    frame_index: u32,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        let dimensions = Dimensions::new(width, height);
        let (dimensions_tx, _) = watch::channel(Some(dimensions).filter(|d| !d.is_empty()));

        info!("Test pattern source ready ({}x{})", width, height);

        Self {
            state: Mutex::new(PatternState {
                dimensions,
                available: true,
                frame_index: 0,
            }),
            dimensions_tx,
        }
    }

    /// Change the native frame size and notify subscribers
    pub fn resize(&self, width: u32, height: u32) {
        let dimensions = Dimensions::new(width, height);
        let visible = {
            let mut state = self.state.lock();
            state.dimensions = dimensions;
            state.available
        };
        if visible {
            self.dimensions_tx
                .send_replace(Some(dimensions).filter(|d| !d.is_empty()));
        }
    }

    /// Simulate the feed dropping out (`false`) or coming back (`true`)
    pub fn set_available(&self, available: bool) {
        let dimensions = {
            let mut state = self.state.lock();
            state.available = available;
            state.dimensions
        };
        let reported = if available {
            Some(dimensions).filter(|d| !d.is_empty())
        } else {
            None
        };
        self.dimensions_tx.send_replace(reported);
    }

    fn render(dimensions: Dimensions, frame_index: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(dimensions.rgb_len());
        let shift = frame_index.wrapping_mul(4);

        for y in 0..dimensions.height {
            for x in 0..dimensions.width {
                let r = (x * 255 / dimensions.width.max(1)).wrapping_add(shift) as u8;
                let g = (y * 255 / dimensions.height.max(1)) as u8;
                let b = (x ^ y).wrapping_add(shift) as u8;
                pixels.extend_from_slice(&[r, g, b]);
            }
        }

        pixels
    }
}

impl CaptureSource for TestPatternSource {
    fn current_frame(&self) -> Option<VideoFrame> {
        let (dimensions, frame_index) = {
            let mut state = self.state.lock();
            if !state.available || state.dimensions.is_empty() {
                return None;
            }
            state.frame_index = state.frame_index.wrapping_add(1);
            (state.dimensions, state.frame_index)
        };

        Some(VideoFrame {
            width: dimensions.width,
            height: dimensions.height,
            pixels: Self::render(dimensions, frame_index),
        })
    }

    fn subscribe_dimensions(&self) -> watch::Receiver<Option<Dimensions>> {
        self.dimensions_tx.subscribe()
    }

    fn name(&self) -> &str {
        "test pattern"
    }
}
