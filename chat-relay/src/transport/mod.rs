//! Outbound transport abstraction for anonchat.
//!
//! The relay core never talks to the messaging platform directly. It
//! calls a [`Transport`], which is implemented by the Telegram Bot API
//! client in production and by [`MockTransport`] in tests.
//!
//! # Design
//!
//! Every method is a single best-effort delivery:
//! - `send()` posts a text reply with an optional keyboard
//! - `copy_message()` re-posts a user's message to their partner
//! - `notify()` posts a text line to the surveillance sink
//! - `forward_to_sink()` forwards an original message to the sink
//! - `send_typing()` shows a typing indicator
//!
//! Failures are returned, never retried here. The caller decides whether
//! a failure matters; for anonchat it only gets logged.

mod mock;
pub mod telegram;

pub use mock::{MockTransport, Outbound};
pub use telegram::TelegramTransport;

use async_trait::async_trait;
use chat_types::{Controls, MessageRef, SinkId, UserId};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform refused the call (blocked bot, unknown chat, ...).
    #[error("rejected by platform ({code}): {description}")]
    Rejected {
        /// Platform error code (HTTP-like).
        code: i64,
        /// Human-readable reason.
        description: String,
    },

    /// The request did not complete.
    #[error("http error: {0}")]
    Http(String),

    /// The platform answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request timed out.
    #[error("request timeout")]
    Timeout,
}

impl TransportError {
    /// Whether the recipient has blocked the bot or deleted their account.
    pub fn is_blocked(&self) -> bool {
        matches!(self, TransportError::Rejected { code: 403, .. })
    }
}

/// Capability the relay core needs from the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message to a user, with an optional keyboard.
    async fn send(&self, to: UserId, text: &str, controls: Controls)
        -> Result<(), TransportError>;

    /// Copy a message from one user's chat into another user's chat.
    ///
    /// The copy carries no "forwarded from" header, which keeps the sender
    /// anonymous.
    async fn copy_message(
        &self,
        from: UserId,
        to: UserId,
        message: MessageRef,
    ) -> Result<(), TransportError>;

    /// Post a text line to the surveillance sink.
    async fn notify(&self, sink: SinkId, text: &str) -> Result<(), TransportError>;

    /// Forward an original message to the surveillance sink.
    async fn forward_to_sink(&self, sink: SinkId, message: MessageRef)
        -> Result<(), TransportError>;

    /// Show a typing indicator in a user's chat.
    async fn send_typing(&self, to: UserId) -> Result<(), TransportError>;
}
