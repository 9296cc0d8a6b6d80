use base64::Engine;
use signflow::{Dimensions, EncodeError, FrameEncoder, VideoFrame};

fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
    VideoFrame {
        width,
        height,
        pixels: rgb.repeat((width * height) as usize),
    }
}

fn decode_data_url(data_url: &str) -> image::DynamicImage {
    let encoded = data_url
        .strip_prefix("data:image/jpeg;base64,")
        .expect("missing data URL prefix");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg).unwrap()
}

#[test]
fn test_encode_produces_jpeg_data_url() {
    let mut encoder = FrameEncoder::new(0.8, None);
    let encoded = encoder.encode(&solid_frame(64, 48, [200, 10, 10])).unwrap();

    assert!(encoded.data_url.starts_with("data:image/jpeg;base64,"));
    assert_eq!(encoded.dimensions, Dimensions::new(64, 48));
    assert!(encoded.jpeg_bytes > 0);
    assert!(encoded.timestamp_ms > 0);

    let decoded = decode_data_url(&encoded.data_url);
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[test]
fn test_quality_mapping() {
    assert_eq!(FrameEncoder::new(0.8, None).quality(), 80);
    assert_eq!(FrameEncoder::new(1.0, None).quality(), 100);
    assert_eq!(FrameEncoder::new(0.0, None).quality(), 1);
    assert_eq!(FrameEncoder::new(3.0, None).quality(), 100);
}

#[test]
fn test_render_target_follows_source_size() {
    let mut encoder = FrameEncoder::new(0.8, None);
    assert!(encoder.target_dimensions().is_none());

    encoder.encode(&solid_frame(64, 48, [0, 0, 0])).unwrap();
    assert_eq!(encoder.target_dimensions(), Some(Dimensions::new(64, 48)));

    let encoded = encoder.encode(&solid_frame(32, 24, [0, 0, 0])).unwrap();
    assert_eq!(encoder.target_dimensions(), Some(Dimensions::new(32, 24)));
    assert_eq!(encoded.dimensions, Dimensions::new(32, 24));

    let decoded = decode_data_url(&encoded.data_url);
    assert_eq!((decoded.width(), decoded.height()), (32, 24));
}

#[test]
fn test_downscale_wide_frames() {
    let mut encoder = FrameEncoder::new(0.8, Some(320));

    let encoded = encoder.encode(&solid_frame(640, 480, [10, 200, 10])).unwrap();
    assert_eq!(encoded.dimensions, Dimensions::new(320, 240));

    let decoded = decode_data_url(&encoded.data_url);
    assert_eq!((decoded.width(), decoded.height()), (320, 240));

    // Narrow frames are left alone
    let encoded = encoder.encode(&solid_frame(160, 120, [10, 200, 10])).unwrap();
    assert_eq!(encoded.dimensions, Dimensions::new(160, 120));
}

#[test]
fn test_invalid_frame_rejected() {
    let mut encoder = FrameEncoder::new(0.8, None);

    let short = VideoFrame {
        width: 4,
        height: 4,
        pixels: vec![0; 10],
    };
    assert!(matches!(
        encoder.encode(&short),
        Err(EncodeError::InvalidFrame {
            expected: 48,
            actual: 10,
            ..
        })
    ));

    let empty = VideoFrame {
        width: 0,
        height: 4,
        pixels: Vec::new(),
    };
    assert!(encoder.encode(&empty).is_err());
}
