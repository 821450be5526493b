//! Telegram Bot API request and response shapes.
//!
//! Only the fields anonchat reads or writes are modelled; everything else
//! in the platform's JSON is ignored.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Payload on success.
    pub result: Option<T>,
    /// Reason on failure.
    pub description: Option<String>,
    /// Error code on failure.
    pub error_code: Option<i64>,
}

/// An incoming update from `getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// New incoming message.
    pub message: Option<Message>,
    /// Inline button press.
    pub callback_query: Option<CallbackQuery>,
}

/// A Telegram user or bot.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: i64,
    /// First name shown in the client.
    pub first_name: String,
}

/// A chat the bot takes part in.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Unique identifier.
    pub id: i64,
    /// `private`, `group`, `supergroup` or `channel`.
    #[serde(rename = "type")]
    pub kind: String,
}

/// A message. Media fields are only checked for presence.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    /// Identifier inside the chat.
    pub message_id: i64,
    /// Sender; empty for channel posts.
    pub from: Option<User>,
    /// Chat the message belongs to.
    pub chat: Chat,
    /// Text for text messages.
    pub text: Option<String>,
    /// Photo sizes.
    pub photo: Option<IgnoredAny>,
    /// Video.
    pub video: Option<IgnoredAny>,
    /// Audio file.
    pub audio: Option<IgnoredAny>,
    /// Voice note.
    pub voice: Option<IgnoredAny>,
    /// Sticker.
    pub sticker: Option<IgnoredAny>,
    /// General file.
    pub document: Option<IgnoredAny>,
}

/// An inline button press.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    /// Identifier to acknowledge with `answerCallbackQuery`.
    pub id: String,
    /// Who pressed the button.
    pub from: User,
    /// The button's callback data.
    pub data: Option<String>,
}

/// Inline keyboard attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    /// Button rows.
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    /// Label.
    pub text: String,
    /// Data sent back when pressed.
    pub callback_data: String,
}

/// `sendMessage` parameters.
#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    /// Target chat.
    pub chat_id: i64,
    /// Message text.
    pub text: &'a str,
    /// Optional keyboard.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

/// `copyMessage` and `forwardMessage` parameters.
#[derive(Debug, Serialize)]
pub struct MessageTransfer {
    /// Target chat.
    pub chat_id: i64,
    /// Source chat.
    pub from_chat_id: i64,
    /// Message in the source chat.
    pub message_id: i64,
}

/// `sendChatAction` parameters.
#[derive(Debug, Serialize)]
pub struct SendChatAction {
    /// Target chat.
    pub chat_id: i64,
    /// Action name, e.g. `typing`.
    pub action: &'static str,
}

/// `getUpdates` parameters.
#[derive(Debug, Serialize)]
pub struct GetUpdates {
    /// First update id to return.
    pub offset: i64,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    /// Update kinds to receive.
    pub allowed_updates: &'static [&'static str],
}

/// `answerCallbackQuery` parameters.
#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    /// Query to acknowledge.
    pub callback_query_id: &'a str,
}
