//! Mock transport for testing.
//!
//! Records every outbound call and lets tests force failures for
//! particular recipients.

use super::{Transport, TransportError};
use async_trait::async_trait;
use chat_types::{Controls, MessageRef, SinkId, UserId};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// `send()`
    Text {
        /// Recipient.
        to: UserId,
        /// Message text.
        text: String,
        /// Attached keyboard.
        controls: Controls,
    },
    /// `copy_message()`
    Copy {
        /// Source chat.
        from: UserId,
        /// Destination chat.
        to: UserId,
        /// Copied message.
        message: MessageRef,
    },
    /// `notify()`
    Notify {
        /// Surveillance sink.
        sink: SinkId,
        /// Notification text.
        text: String,
    },
    /// `forward_to_sink()`
    Forward {
        /// Surveillance sink.
        sink: SinkId,
        /// Forwarded message.
        message: MessageRef,
    },
    /// `send_typing()`
    Typing {
        /// Recipient.
        to: UserId,
    },
}

/// Mock transport for testing.
///
/// Clones share state, so a test can keep one handle while the relay owns
/// another. Failed calls are not recorded.
#[derive(Debug, Default, Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    outbound: Vec<Outbound>,
    unreachable_users: HashSet<UserId>,
    sink_down: bool,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every delivery to `user` fail as if they had blocked the bot.
    pub fn block_user(&self, user: UserId) {
        self.inner().unreachable_users.insert(user);
    }

    /// Undo [`block_user`](Self::block_user).
    pub fn unblock_user(&self, user: UserId) {
        self.inner().unreachable_users.remove(&user);
    }

    /// Make every delivery to the surveillance sink fail.
    pub fn set_sink_down(&self, down: bool) {
        self.inner().sink_down = down;
    }

    /// All recorded calls, oldest first.
    pub fn outbound(&self) -> Vec<Outbound> {
        self.inner().outbound.clone()
    }

    /// Texts sent to `user`, oldest first.
    pub fn texts_to(&self, user: UserId) -> Vec<String> {
        self.inner()
            .outbound
            .iter()
            .filter_map(|o| match o {
                Outbound::Text { to, text, .. } if *to == user => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recent text sent to `user` and its keyboard.
    pub fn last_text_to(&self, user: UserId) -> Option<(String, Controls)> {
        self.inner().outbound.iter().rev().find_map(|o| match o {
            Outbound::Text { to, text, controls } if *to == user => {
                Some((text.clone(), *controls))
            }
            _ => None,
        })
    }

    /// Messages copied into `user`'s chat, oldest first.
    pub fn copies_to(&self, user: UserId) -> Vec<MessageRef> {
        self.inner()
            .outbound
            .iter()
            .filter_map(|o| match o {
                Outbound::Copy { to, message, .. } if *to == user => Some(*message),
                _ => None,
            })
            .collect()
    }

    /// Text notifications posted to any sink, oldest first.
    pub fn notifications(&self) -> Vec<String> {
        self.inner()
            .outbound
            .iter()
            .filter_map(|o| match o {
                Outbound::Notify { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages forwarded to any sink, oldest first.
    pub fn forwards(&self) -> Vec<MessageRef> {
        self.inner()
            .outbound
            .iter()
            .filter_map(|o| match o {
                Outbound::Forward { message, .. } => Some(*message),
                _ => None,
            })
            .collect()
    }

    /// Forget all recorded calls. Failure settings are kept.
    pub fn clear(&self) {
        self.inner().outbound.clear();
    }

    fn deliver_to_user(&self, to: UserId, call: Outbound) -> Result<(), TransportError> {
        let mut inner = self.inner();
        if inner.unreachable_users.contains(&to) {
            return Err(TransportError::Rejected {
                code: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        inner.outbound.push(call);
        Ok(())
    }

    fn deliver_to_sink(&self, call: Outbound) -> Result<(), TransportError> {
        let mut inner = self.inner();
        if inner.sink_down {
            return Err(TransportError::Rejected {
                code: 400,
                description: "Bad Request: chat not found".to_string(),
            });
        }
        inner.outbound.push(call);
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        to: UserId,
        text: &str,
        controls: Controls,
    ) -> Result<(), TransportError> {
        self.deliver_to_user(
            to,
            Outbound::Text {
                to,
                text: text.to_string(),
                controls,
            },
        )
    }

    async fn copy_message(
        &self,
        from: UserId,
        to: UserId,
        message: MessageRef,
    ) -> Result<(), TransportError> {
        self.deliver_to_user(to, Outbound::Copy { from, to, message })
    }

    async fn notify(&self, sink: SinkId, text: &str) -> Result<(), TransportError> {
        self.deliver_to_sink(Outbound::Notify {
            sink,
            text: text.to_string(),
        })
    }

    async fn forward_to_sink(
        &self,
        sink: SinkId,
        message: MessageRef,
    ) -> Result<(), TransportError> {
        self.deliver_to_sink(Outbound::Forward { sink, message })
    }

    async fn send_typing(&self, to: UserId) -> Result<(), TransportError> {
        self.deliver_to_user(to, Outbound::Typing { to })
    }
}
