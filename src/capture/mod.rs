//! Capture sources polled by the frame throttle
//!
//! Camera drivers live outside this crate; anything that can hand out
//! RGB frames implements [`CaptureSource`].

pub mod pattern;
pub mod source;
pub mod still;

pub use pattern::TestPatternSource;
pub use source::{CaptureSource, CaptureSourceFactory, CaptureSourceKind, Dimensions, VideoFrame};
pub use still::StillImageSource;
