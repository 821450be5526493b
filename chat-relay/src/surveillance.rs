//! Moderation mirror.
//!
//! Posts session lifecycle events and message summaries to a fixed sink
//! chat. Every call is a single best-effort delivery; the caller logs
//! failures and carries on.

use crate::transport::{Transport, TransportError};
use chat_types::{MessagePayload, SinkId, UserId};
use std::sync::Arc;

/// Sends moderation notices to the surveillance sink.
#[derive(Clone)]
pub struct SurveillanceNotifier {
    transport: Arc<dyn Transport>,
    sink: SinkId,
    mirror_messages: bool,
}

impl std::fmt::Debug for SurveillanceNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurveillanceNotifier")
            .field("sink", &self.sink)
            .field("mirror_messages", &self.mirror_messages)
            .finish_non_exhaustive()
    }
}

impl SurveillanceNotifier {
    /// Create a notifier posting to `sink`.
    ///
    /// With `mirror_messages` set, every relayed message is also forwarded
    /// in full after its summary line.
    pub fn new(transport: Arc<dyn Transport>, sink: SinkId, mirror_messages: bool) -> Self {
        Self {
            transport,
            sink,
            mirror_messages,
        }
    }

    /// A user opened the bot.
    pub async fn user_started(&self, user: UserId, name: &str) -> Result<(), TransportError> {
        self.post(&format!("User {user} ({name}) started the bot."))
            .await
    }

    /// Two users were paired.
    pub async fn chat_started(&self, a: UserId, b: UserId) -> Result<(), TransportError> {
        self.post(&format!("New chat started between {a} and {b}"))
            .await
    }

    /// A pairing was removed.
    pub async fn chat_ended(&self, by: UserId, partner: UserId) -> Result<(), TransportError> {
        self.post(&format!("Chat ended by {by} (partner {partner})"))
            .await
    }

    /// A user reported their partner.
    pub async fn report_filed(
        &self,
        reporter: UserId,
        reported: UserId,
    ) -> Result<(), TransportError> {
        self.post(&format!("🚨 REPORT: User {reporter} reported {reported}"))
            .await
    }

    /// A message was relayed from `from` to `to`.
    ///
    /// The summary line is posted first. The forward is still attempted
    /// when the summary fails; the first error is returned.
    pub async fn message(
        &self,
        from: UserId,
        to: UserId,
        payload: &MessagePayload,
    ) -> Result<(), TransportError> {
        let summary = self
            .post(&format!("💬 {from} → {to}: {}", payload.summary()))
            .await;
        if !self.mirror_messages {
            return summary;
        }
        let forward = self
            .transport
            .forward_to_sink(self.sink, payload.message)
            .await;
        summary.and(forward)
    }

    async fn post(&self, text: &str) -> Result<(), TransportError> {
        self.transport.notify(self.sink, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, Outbound};
    use chat_types::{MessageRef, PayloadKind};

    const SINK: SinkId = SinkId::new(-100);
    const A: UserId = UserId::new(11);
    const B: UserId = UserId::new(22);

    fn notifier(mirror: bool) -> (MockTransport, SurveillanceNotifier) {
        let transport = MockTransport::new();
        let notifier = SurveillanceNotifier::new(Arc::new(transport.clone()), SINK, mirror);
        (transport, notifier)
    }

    #[tokio::test]
    async fn lifecycle_lines_reference_both_users() {
        let (transport, notifier) = notifier(true);
        notifier.user_started(A, "Sam").await.unwrap();
        notifier.chat_started(A, B).await.unwrap();
        notifier.report_filed(A, B).await.unwrap();
        notifier.chat_ended(A, B).await.unwrap();

        assert_eq!(
            transport.notifications(),
            vec![
                "User 11 (Sam) started the bot.",
                "New chat started between 11 and 22",
                "🚨 REPORT: User 11 reported 22",
                "Chat ended by 11 (partner 22)",
            ]
        );
    }

    #[tokio::test]
    async fn message_posts_summary_then_forwards() {
        let (transport, notifier) = notifier(true);
        let payload = MessagePayload::text(MessageRef::new(A, 7), "hi");
        notifier.message(A, B, &payload).await.unwrap();

        assert_eq!(transport.notifications(), vec!["💬 11 → 22: hi"]);
        assert_eq!(transport.forwards(), vec![MessageRef::new(A, 7)]);
    }

    #[tokio::test]
    async fn mirroring_disabled_skips_forward() {
        let (transport, notifier) = notifier(false);
        let payload = MessagePayload::new(MessageRef::new(A, 8), PayloadKind::Photo);
        notifier.message(A, B, &payload).await.unwrap();

        assert_eq!(transport.notifications(), vec!["💬 11 → 22: [photo]"]);
        assert!(transport.forwards().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_is_returned() {
        let (transport, notifier) = notifier(true);
        transport.set_sink_down(true);
        assert!(notifier.chat_started(A, B).await.is_err());
        let payload = MessagePayload::text(MessageRef::new(A, 9), "x");
        assert!(notifier.message(A, B, &payload).await.is_err());
    }

    #[tokio::test]
    async fn every_sink_call_targets_the_configured_sink() {
        let (transport, notifier) = notifier(true);
        notifier.chat_started(A, B).await.unwrap();
        let payload = MessagePayload::text(MessageRef::new(B, 3), "yo");
        notifier.message(B, A, &payload).await.unwrap();

        let calls = transport.outbound();
        assert_eq!(calls.len(), 3);
        for call in calls {
            match call {
                Outbound::Notify { sink, .. } | Outbound::Forward { sink, .. } => {
                    assert_eq!(sink, SINK)
                }
                other => panic!("user-facing call from notifier: {other:?}"),
            }
        }
    }
}
