//! Frame sampling and encoding
//!
//! [`FrameThrottle`] fixes the capture rate independently of the source's
//! native rate; [`FrameEncoder`] turns each sample into a JPEG data URL.

pub mod jpeg;
pub mod throttle;

pub use jpeg::{EncodedFrame, FrameEncoder};
pub use throttle::FrameThrottle;
