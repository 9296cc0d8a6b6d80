//! Wire messages exchanged with the recognition server
//!
//! Every message is a flat JSON object with a `type` discriminator, sent as
//! a single text frame.

pub mod messages;

pub use messages::{decode, InboundMessage, Mode, OutboundMessage};
