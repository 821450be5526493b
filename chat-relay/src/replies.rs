//! User-facing reply texts.
//!
//! Constant names say which situation they answer.

#![allow(missing_docs)]

/// Greeting sent on `/start`.
pub fn welcome(first_name: &str) -> String {
    format!(
        "👋 Hi {first_name}! Welcome to Anonymous Chat Bot.\n\n\
         You can chat with random people anonymously.\n\n\
         Choose an option below to get started:"
    )
}

/// Name used in the greeting when the platform gives none.
pub const FALLBACK_NAME: &str = "there";

pub const PARTNER_FOUND: &str = "✅ Partner found! Say hi 👋";
pub const WAITING: &str = "⌛ Waiting for a partner...";
pub const ALREADY_IN_CHAT: &str = "⚠ You are already in a chat!";
pub const ALREADY_WAITING: &str = "⌛ You're already waiting for a partner...";
pub const CHAT_ENDED: &str = "❌ Chat ended.";
pub const PARTNER_LEFT: &str = "❌ Your partner ended the chat.";
pub const NOT_IN_CHAT: &str = "⚠ You're not in a chat. Use /start to begin.";
pub const REPORTED: &str =
    "⚠ You reported your partner. Thank you for keeping the community safe.";
pub const NOTHING_TO_REPORT: &str = "⚠ You're not in a chat to report someone.";
pub const SEARCH_CANCELLED: &str = "✖ Search cancelled.";
pub const NOT_SEARCHING: &str = "⚠ You're not searching for a partner.";
pub const SETTINGS: &str = "⚙️ Settings coming soon!";
pub const HELP: &str = "ℹ️ Help:\n\n\
    1. Use 'Find Partner' to connect.\n\
    2. Use 'Next' to skip.\n\
    3. 'Report' if someone violates rules.\n\n\
    Commands: /find /next /end /report /cancel /help";
