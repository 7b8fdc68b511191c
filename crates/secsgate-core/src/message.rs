//! Outgoing/incoming message shape and the assembler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::Item;
use crate::template::TemplateHeader;

/// Device id used when the template does not name one.
pub const DEFAULT_DEVICE: u16 = 1;

/// Opaque reply-matching key assigned by the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(pub u32);

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wire-ready message (header + built item tree).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub device: u16,
    pub stream: u8,
    #[serde(rename = "func")]
    pub function: u8,
    pub reply_expected: bool,
    pub items: Vec<Item>,
    pub token: CorrelationToken,
}

impl Message {
    /// `S1F1`-style label for logs.
    pub fn label(&self) -> String {
        format!("S{}F{}", self.stream, self.function)
    }

    /// Secondary (reply) messages carry an even function number.
    pub fn is_reply(&self) -> bool {
        self.function % 2 == 0
    }
}

/// Attach built items to a resolved header. Only applies defaults
/// (`device = 1`, `reply_expected = false`); validation happens upstream.
pub fn assemble(header: &TemplateHeader, items: Vec<Item>, token: CorrelationToken) -> Message {
    Message {
        device: header.device.unwrap_or(DEFAULT_DEVICE),
        stream: header.stream,
        function: header.function,
        reply_expected: header.reply_expected.unwrap_or(false),
        items,
        token,
    }
}
