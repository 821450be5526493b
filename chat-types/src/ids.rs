//! Identity types for anonchat.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier for a platform account.
///
/// On Telegram this is the private chat id of the user, which equals the
/// user id. The value is opaque to the matchmaker; only equality and
/// hashing matter.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a UserId from the platform's numeric id.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this UserId.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

/// Destination that receives mirrored lifecycle events and messages.
///
/// Usually a group chat, so the id is negative on Telegram.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SinkId(i64);

impl SinkId {
    /// Create a SinkId from the platform's chat id.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this SinkId.
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SinkId({})", self.0)
    }
}

/// Reference to a message already held by the platform.
///
/// Copying or forwarding by reference avoids re-uploading media.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    /// Chat the message was posted in.
    pub chat: UserId,
    /// Platform message id within that chat.
    pub message_id: i64,
}

impl MessageRef {
    /// Create a new message reference.
    pub const fn new(chat: UserId, message_id: i64) -> Self {
        Self { chat, message_id }
    }
}

impl fmt::Debug for MessageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageRef({}#{})", self.chat, self.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_display_is_numeric() {
        assert_eq!(UserId::new(42).to_string(), "42");
        assert_eq!(format!("{:?}", UserId::new(42)), "UserId(42)");
    }

    #[test]
    fn sink_id_keeps_negative_group_ids() {
        let sink = SinkId::new(-1001234567890);
        assert_eq!(sink.value(), -1001234567890);
        assert_eq!(sink.to_string(), "-1001234567890");
    }

    #[test]
    fn user_id_serializes_transparently() {
        let json = serde_json::to_string(&UserId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: UserId = serde_json::from_str("7").unwrap();
        assert_eq!(back, UserId::new(7));
    }

    #[test]
    fn message_ref_debug_names_chat_and_id() {
        let r = MessageRef::new(UserId::new(5), 99);
        assert_eq!(format!("{:?}", r), "MessageRef(5#99)");
    }
}
