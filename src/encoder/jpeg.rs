use base64::Engine;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use crate::capture::{Dimensions, VideoFrame};
use crate::error::EncodeError;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// One frame ready to be sent
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// `data:image/jpeg;base64,...`
    pub data_url: String,
    /// Size of the encoded image (after any downscale)
    pub dimensions: Dimensions,
    /// Capture time, milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// JPEG byte count before base64
    pub jpeg_bytes: usize,
}

/// Encodes polled frames as JPEG data URLs
///
/// Keeps a render target sized to the last frame seen; when the source
/// changes size the target is reallocated before the next encode, never
/// during one.
pub struct FrameEncoder {
    quality: u8,
    max_width: Option<u32>,
    render_target: Option<RgbImage>,
}

impl FrameEncoder {
    /// `quality` is on a 0..1 scale, clamped to the JPEG range 1..=100
    pub fn new(quality: f32, max_width: Option<u32>) -> Self {
        let quality = (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8;

        Self {
            quality,
            max_width: max_width.filter(|w| *w > 0),
            render_target: None,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Size of the current render target, if any frame has been encoded
    pub fn target_dimensions(&self) -> Option<Dimensions> {
        self.render_target
            .as_ref()
            .map(|t| Dimensions::new(t.width(), t.height()))
    }

    pub fn encode(&mut self, frame: &VideoFrame) -> Result<EncodedFrame, EncodeError> {
        let dimensions = frame.dimensions();
        let expected = dimensions.rgb_len();
        if dimensions.is_empty() || frame.pixels.len() != expected {
            return Err(EncodeError::InvalidFrame {
                width: frame.width,
                height: frame.height,
                expected,
                actual: frame.pixels.len(),
            });
        }

        let quality = self.quality;
        let max_width = self.max_width;
        let target = self.prepare_target(dimensions);
        target.copy_from_slice(&frame.pixels);

        let scaled;
        let source: &RgbImage = match max_width {
            Some(max_width) if dimensions.width > max_width => {
                let height = ((dimensions.height as u64 * max_width as u64)
                    / dimensions.width as u64)
                    .max(1) as u32;
                scaled = imageops::resize(&*target, max_width, height, FilterType::Triangle);
                &scaled
            }
            _ => &*target,
        };

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality).encode_image(source)?;

        let mut data_url = String::with_capacity(DATA_URL_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
        data_url.push_str(DATA_URL_PREFIX);
        base64::engine::general_purpose::STANDARD.encode_string(&jpeg, &mut data_url);

        Ok(EncodedFrame {
            data_url,
            dimensions: Dimensions::new(source.width(), source.height()),
            timestamp_ms: Utc::now().timestamp_millis(),
            jpeg_bytes: jpeg.len(),
        })
    }

    fn prepare_target(&mut self, dimensions: Dimensions) -> &mut RgbImage {
        let stale = self
            .render_target
            .as_ref()
            .map_or(true, |t| t.width() != dimensions.width || t.height() != dimensions.height);

        if stale {
            debug!(
                "Resizing render target to {}x{}",
                dimensions.width, dimensions.height
            );
            self.render_target = Some(RgbImage::new(dimensions.width, dimensions.height));
        }

        self.render_target.get_or_insert_with(|| RgbImage::new(dimensions.width, dimensions.height))
    }
}
