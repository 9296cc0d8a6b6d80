use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::capture::CaptureSourceKind;
use crate::protocol::Mode;
use crate::session::{detect_language, SessionConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub stream: StreamConfig,
    pub session: SessionDefaults,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub endpoint: String,
    pub target_frame_rate: u32,
    pub jpeg_quality: f32,
    pub max_frame_width: Option<u32>,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub initial_mode: Option<Mode>,
    /// Falls back to locale detection
    pub initial_language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureKind {
    TestPattern,
    Image,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub source: CaptureKind,
    pub image_path: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "signflow".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3004,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://localhost:3003/".to_string(),
            target_frame_rate: 30,
            jpeg_quality: 0.8,
            max_frame_width: None,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: CaptureKind::TestPattern,
            image_path: None,
            width: 640,
            height: 480,
        }
    }
}

impl Config {
    /// Load `path` (any extension the `config` crate knows, optional) and
    /// overlay `SIGNFLOW__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("SIGNFLOW").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.stream.endpoint.clone(),
            target_frame_rate: self.stream.target_frame_rate,
            initial_mode: self.session.initial_mode.unwrap_or_default(),
            initial_language: self
                .session
                .initial_language
                .clone()
                .unwrap_or_else(detect_language),
            jpeg_quality: self.stream.jpeg_quality,
            max_frame_width: self.stream.max_frame_width,
            connect_timeout: Duration::from_secs(self.stream.connect_timeout_secs),
            ..SessionConfig::default()
        }
    }

    pub fn capture_source(&self) -> Result<CaptureSourceKind> {
        match self.capture.source {
            CaptureKind::TestPattern => Ok(CaptureSourceKind::TestPattern {
                width: self.capture.width,
                height: self.capture.height,
            }),
            CaptureKind::Image => {
                let raw = self
                    .capture
                    .image_path
                    .as_deref()
                    .context("capture.image_path is required when capture.source = \"image\"")?;
                let expanded = shellexpand::tilde(raw);
                Ok(CaptureSourceKind::StillImage(PathBuf::from(expanded.as_ref())))
            }
        }
    }
}
