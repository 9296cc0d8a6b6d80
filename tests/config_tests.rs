use signflow::config::CaptureKind;
use signflow::session::{language_from_locale, normalize_language, BASELINE_LANGUAGE};
use signflow::{CaptureSourceKind, Config, Mode, SessionConfig, SessionError};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::load(dir.path().join("absent").to_str().unwrap()).unwrap();

    assert_eq!(cfg.stream.endpoint, "ws://localhost:3003/");
    assert_eq!(cfg.stream.target_frame_rate, 30);
    assert_eq!(cfg.service.http.port, 3004);
    assert_eq!(cfg.capture.source, CaptureKind::TestPattern);
    assert!(cfg.session.initial_mode.is_none());
}

#[test]
fn test_load_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signflow.toml");
    fs::write(
        &path,
        r#"
[stream]
endpoint = "ws://recognizer:3003/"
target_frame_rate = 15
jpeg_quality = 0.6
max_frame_width = 320

[session]
initial_mode = "TRAINING"
initial_language = "ru"

[capture]
source = "image"
image_path = "/tmp/hand.png"
"#,
    )
    .unwrap();

    let cfg = Config::load(path.to_str().unwrap()).unwrap();
    let session = cfg.session_config();

    assert_eq!(session.endpoint, "ws://recognizer:3003/");
    assert_eq!(session.target_frame_rate, 15);
    assert_eq!(session.jpeg_quality, 0.6);
    assert_eq!(session.max_frame_width, Some(320));
    assert_eq!(session.initial_mode, Mode::Training);
    assert_eq!(session.initial_language, "ru");
    assert_eq!(session.connect_timeout, Duration::from_secs(10));
    assert!(session.validate().is_ok());

    match cfg.capture_source().unwrap() {
        CaptureSourceKind::StillImage(path) => assert_eq!(path.to_str(), Some("/tmp/hand.png")),
        other => panic!("unexpected capture source: {:?}", other),
    }
}

#[test]
fn test_environment_override() {
    std::env::set_var("SIGNFLOW__SERVICE__NAME", "signflow-test");

    let dir = TempDir::new().unwrap();
    let cfg = Config::load(dir.path().join("absent").to_str().unwrap()).unwrap();

    std::env::remove_var("SIGNFLOW__SERVICE__NAME");
    assert_eq!(cfg.service.name, "signflow-test");
}

#[test]
fn test_image_capture_requires_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signflow.toml");
    fs::write(&path, "[capture]\nsource = \"image\"\n").unwrap();

    let cfg = Config::load(path.to_str().unwrap()).unwrap();
    assert!(cfg.capture_source().is_err());
}

#[test]
fn test_image_path_tilde_expansion() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signflow.toml");
    fs::write(
        &path,
        "[capture]\nsource = \"image\"\nimage_path = \"~/hand.png\"\n",
    )
    .unwrap();

    let cfg = Config::load(path.to_str().unwrap()).unwrap();
    match cfg.capture_source().unwrap() {
        CaptureSourceKind::StillImage(path) => {
            if std::env::var_os("HOME").is_some() {
                assert!(!path.to_string_lossy().starts_with('~'));
            }
            assert!(path.ends_with("hand.png"));
        }
        other => panic!("unexpected capture source: {:?}", other),
    }
}

#[test]
fn test_session_config_validation() {
    let valid = SessionConfig {
        initial_language: "en".to_string(),
        ..SessionConfig::default()
    };
    assert!(valid.validate().is_ok());
    assert!(valid.session_id.starts_with("session-"));

    let bad_rate = SessionConfig {
        target_frame_rate: 0,
        ..valid.clone()
    };
    assert!(matches!(bad_rate.validate(), Err(SessionError::Validation(_))));

    let bad_quality = SessionConfig {
        jpeg_quality: 1.5,
        ..valid.clone()
    };
    assert!(bad_quality.validate().is_err());

    let no_language = SessionConfig {
        initial_language: " ".to_string(),
        ..valid
    };
    assert!(no_language.validate().is_err());
}

#[test]
fn test_language_from_locale() {
    assert_eq!(language_from_locale("ru_RU.UTF-8"), Some("ru"));
    assert_eq!(language_from_locale("en-US"), Some("en"));
    assert_eq!(language_from_locale("EN"), Some("en"));
    assert_eq!(language_from_locale("de_DE.UTF-8"), None);
    assert_eq!(language_from_locale("C"), None);
    assert_eq!(BASELINE_LANGUAGE, "en");
}

#[test]
fn test_normalize_language() {
    assert_eq!(normalize_language(" RU ").unwrap(), "ru");
    assert!(normalize_language("").is_err());
    assert!(normalize_language("   ").is_err());
}
