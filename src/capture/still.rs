use anyhow::{Context, Result};
use std::path::Path;
use tokio::sync::watch;
use tracing::info;

use super::source::{CaptureSource, Dimensions, VideoFrame};

/// Serves one decoded image file as every frame
pub struct StillImageSource {
    name: String,
    frame: VideoFrame,
    dimensions_tx: watch::Sender<Option<Dimensions>>,
}

impl StillImageSource {
    /// Decode a PNG or JPEG file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path)
            .with_context(|| format!("Failed to decode image: {:?}", path))?
            .to_rgb8();

        let (width, height) = image.dimensions();
        info!("Loaded still image {:?} ({}x{})", path, width, height);

        Ok(Self::from_frame(
            path.display().to_string(),
            VideoFrame {
                width,
                height,
                pixels: image.into_raw(),
            },
        ))
    }

    pub fn from_frame(name: String, frame: VideoFrame) -> Self {
        let dimensions = Some(frame.dimensions()).filter(|d| !d.is_empty());
        let (dimensions_tx, _) = watch::channel(dimensions);

        Self {
            name,
            frame,
            dimensions_tx,
        }
    }
}

impl CaptureSource for StillImageSource {
    fn current_frame(&self) -> Option<VideoFrame> {
        if self.frame.dimensions().is_empty() {
            return None;
        }
        Some(self.frame.clone())
    }

    fn subscribe_dimensions(&self) -> watch::Receiver<Option<Dimensions>> {
        self.dimensions_tx.subscribe()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
