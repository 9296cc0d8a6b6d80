use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// Operating mode of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Continuous recognition
    #[default]
    Live,
    /// Supervised gesture collection
    Training,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Live => "LIVE",
            Mode::Training => "TRAINING",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Ok(Mode::Live),
            "TRAINING" => Ok(Mode::Training),
            other => Err(format!("unknown mode '{}' (expected LIVE or TRAINING)", other)),
        }
    }
}

/// Message sent to the recognition server, one per text frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum OutboundMessage {
    Language { lang: String },
    Mode { mode: Mode },
    Gloss { gloss: String },
    Image {
        /// `data:image/jpeg;base64,...` URL
        image: String,
        /// Capture time, milliseconds since the Unix epoch
        timestamp: i64,
    },
}

impl OutboundMessage {
    /// Wire tag, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Language { .. } => "LANGUAGE",
            OutboundMessage::Mode { .. } => "MODE",
            OutboundMessage::Gloss { .. } => "GLOSS",
            OutboundMessage::Image { .. } => "IMAGE",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Message received from the recognition server
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// A gesture was recognized
    Word { text: String },
    /// Untagged `{"status": .., "message": ..}` acknowledgement
    Status { status: u16, message: Option<String> },
    /// Tag this client does not understand; ignored
    Unknown { tag: Option<String> },
}

/// Decode one inbound text frame
pub fn decode(payload: &str) -> Result<InboundMessage, DecodeError> {
    let value: Value = serde_json::from_str(payload)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    match object.get("type").and_then(Value::as_str) {
        Some("WORD") => {
            let text = object
                .get("text")
                .and_then(Value::as_str)
                .ok_or(DecodeError::MissingField {
                    tag: "WORD",
                    field: "text",
                })?;
            Ok(InboundMessage::Word {
                text: text.to_string(),
            })
        }
        Some(tag) => Ok(InboundMessage::Unknown {
            tag: Some(tag.to_string()),
        }),
        None => match object
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
        {
            Some(status) => Ok(InboundMessage::Status {
                status,
                message: object
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            None => Ok(InboundMessage::Unknown { tag: None }),
        },
    }
}
