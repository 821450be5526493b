//! Telegram Bot API transport.
//!
//! Talks to `https://api.telegram.org/bot<token>/<method>` with JSON
//! bodies. Outbound calls implement [`Transport`]; `get_updates` and
//! `answer_callback` are used by the poller.

pub mod api;

use super::{Transport, TransportError};
use crate::config::TelegramConfig;
use api::{
    AnswerCallbackQuery, ApiResponse, GetUpdates, InlineKeyboardButton, InlineKeyboardMarkup,
    MessageTransfer, SendChatAction, SendMessage, Update,
};
use async_trait::async_trait;
use chat_types::{Controls, MessageRef, SinkId, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Update kinds the bot subscribes to.
const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

/// Slack added on top of the long-poll timeout before the HTTP request
/// itself is abandoned.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::InvalidResponse(e.to_string())
        } else {
            TransportError::Http(e.to_string())
        }
    }
}

/// Render a keyboard layout as Telegram inline keyboard markup.
pub fn inline_keyboard(controls: Controls) -> Option<InlineKeyboardMarkup> {
    if controls.is_empty() {
        return None;
    }
    let inline_keyboard = controls
        .rows()
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|button| InlineKeyboardButton {
                    text: button.label.to_string(),
                    callback_data: button.action.as_str().to_string(),
                })
                .collect()
        })
        .collect();
    Some(InlineKeyboardMarkup { inline_keyboard })
}

/// Bot API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct TelegramTransport {
    http: reqwest::Client,
    /// `<api_base_url>/bot<token>`, never logged.
    endpoint: String,
    poll_timeout_secs: u64,
}

impl std::fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("endpoint", &"[REDACTED]")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl TelegramTransport {
    /// Create a client from configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs) + HTTP_TIMEOUT_SLACK)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.token
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    /// Call a Bot API method and unwrap its response envelope.
    async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, TransportError>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        // Error responses still carry the JSON envelope, so the status code
        // is not checked separately.
        let response: ApiResponse<R> = self.http.post(url).json(params).send().await?.json().await?;

        if !response.ok {
            return Err(TransportError::Rejected {
                code: response.error_code.unwrap_or_default(),
                description: response.description.unwrap_or_default(),
            });
        }
        response.result.ok_or_else(|| {
            TransportError::InvalidResponse(format!("{method}: ok response without result"))
        })
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            },
        )
        .await
    }

    /// Acknowledge a button press so the client stops its spinner.
    pub async fn answer_callback(&self, callback_query_id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery { callback_query_id },
            )
            .await?;
        Ok(())
    }

    async fn transfer(
        &self,
        method: &str,
        chat_id: i64,
        message: MessageRef,
    ) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                method,
                &MessageTransfer {
                    chat_id,
                    from_chat_id: message.chat.value(),
                    message_id: message.message_id,
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(
        &self,
        to: UserId,
        text: &str,
        controls: Controls,
    ) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id: to.value(),
                    text,
                    reply_markup: inline_keyboard(controls),
                },
            )
            .await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        from: UserId,
        to: UserId,
        message: MessageRef,
    ) -> Result<(), TransportError> {
        let message = MessageRef::new(from, message.message_id);
        self.transfer("copyMessage", to.value(), message).await
    }

    async fn notify(&self, sink: SinkId, text: &str) -> Result<(), TransportError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id: sink.value(),
                    text,
                    reply_markup: None,
                },
            )
            .await?;
        Ok(())
    }

    async fn forward_to_sink(
        &self,
        sink: SinkId,
        message: MessageRef,
    ) -> Result<(), TransportError> {
        self.transfer("forwardMessage", sink.value(), message).await
    }

    async fn send_typing(&self, to: UserId) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "sendChatAction",
                &SendChatAction {
                    chat_id: to.value(),
                    action: "typing",
                },
            )
            .await?;
        Ok(())
    }
}
