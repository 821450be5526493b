//! Relayed message payloads.

use crate::ids::MessageRef;
use serde::{Deserialize, Serialize};

/// Longest text excerpt included in a surveillance summary, in characters.
pub const SUMMARY_TEXT_LIMIT: usize = 200;

/// What kind of content an inbound message carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum PayloadKind {
    /// Plain text message.
    Text(String),
    /// Photo, optionally captioned.
    Photo,
    /// Video clip.
    Video,
    /// Audio file.
    Audio,
    /// Voice note.
    Voice,
    /// Sticker.
    Sticker,
    /// Arbitrary file.
    Document,
    /// Anything the transport does not classify.
    Other,
}

impl PayloadKind {
    /// Short label used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            PayloadKind::Text(_) => "text",
            PayloadKind::Photo => "photo",
            PayloadKind::Video => "video",
            PayloadKind::Audio => "audio",
            PayloadKind::Voice => "voice",
            PayloadKind::Sticker => "sticker",
            PayloadKind::Document => "document",
            PayloadKind::Other => "other",
        }
    }
}

/// A message a paired user wants delivered to their partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Where the original message lives.
    pub message: MessageRef,
    /// Content classification.
    pub kind: PayloadKind,
}

impl MessagePayload {
    /// Create a new payload.
    pub fn new(message: MessageRef, kind: PayloadKind) -> Self {
        Self { message, kind }
    }

    /// Create a text payload.
    pub fn text(message: MessageRef, text: impl Into<String>) -> Self {
        Self::new(message, PayloadKind::Text(text.into()))
    }

    /// One-line description of the content.
    ///
    /// Text is truncated to [`SUMMARY_TEXT_LIMIT`] characters; media is
    /// described by its kind.
    pub fn summary(&self) -> String {
        match &self.kind {
            PayloadKind::Text(text) => {
                let mut chars = text.chars();
                let excerpt: String = chars.by_ref().take(SUMMARY_TEXT_LIMIT).collect();
                if chars.next().is_some() {
                    format!("{excerpt}…")
                } else {
                    excerpt
                }
            }
            other => format!("[{}]", other.label()),
        }
    }
}
