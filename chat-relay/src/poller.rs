//! Telegram update poller.
//!
//! Long-polls `getUpdates`, acknowledges button presses, converts updates
//! into [`InboundEvent`]s and hands them to the [`Dispatcher`].

use crate::dispatch::Dispatcher;
use crate::transport::telegram::api::{Message, Update};
use crate::transport::TelegramTransport;
use chat_types::{
    CallbackAction, Command, InboundEvent, InboundKind, MessagePayload, MessageRef, PayloadKind,
    UserId,
};
use std::time::Duration;
use tokio::sync::watch;

/// Convert an update into an inbound event.
///
/// Returns `None` for updates the bot ignores: anything outside private
/// chats, messages without a sender and unknown button data.
pub fn update_to_event(update: &Update) -> Option<InboundEvent> {
    if let Some(query) = &update.callback_query {
        let action: CallbackAction = query.data.as_deref()?.parse().ok()?;
        let event = InboundEvent::new(UserId::new(query.from.id), InboundKind::Callback(action));
        return Some(event.with_name(query.from.first_name.clone()));
    }

    let message = update.message.as_ref()?;
    if message.chat.kind != "private" {
        return None;
    }
    let from = message.from.as_ref()?;
    let sender = UserId::new(from.id);

    let kind = match message.text.as_deref() {
        Some(text) if text.starts_with('/') => match Command::parse(text) {
            Ok(command) => InboundKind::Command(command),
            // Unknown commands are ordinary text.
            Err(_) => InboundKind::Message(payload_of(message)),
        },
        _ => InboundKind::Message(payload_of(message)),
    };
    Some(InboundEvent::new(sender, kind).with_name(from.first_name.clone()))
}

fn payload_of(message: &Message) -> MessagePayload {
    let kind = if let Some(text) = &message.text {
        PayloadKind::Text(text.clone())
    } else if message.photo.is_some() {
        PayloadKind::Photo
    } else if message.video.is_some() {
        PayloadKind::Video
    } else if message.audio.is_some() {
        PayloadKind::Audio
    } else if message.voice.is_some() {
        PayloadKind::Voice
    } else if message.sticker.is_some() {
        PayloadKind::Sticker
    } else if message.document.is_some() {
        PayloadKind::Document
    } else {
        PayloadKind::Other
    };
    MessagePayload::new(
        MessageRef::new(UserId::new(message.chat.id), message.message_id),
        kind,
    )
}

/// Poll for updates until `shutdown` flips to `true`.
pub async fn run(
    transport: TelegramTransport,
    dispatcher: Dispatcher,
    retry_delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut offset: i64 = 0;
    tracing::info!("Bot is polling...");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let updates = tokio::select! {
            result = transport.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("Polling failed: {}, retrying in {:?}", e, retry_delay);
                tokio::select! {
                    _ = tokio::time::sleep(retry_delay) => continue,
                    _ = shutdown.changed() => break,
                }
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            if let Some(query) = &update.callback_query {
                let transport = transport.clone();
                let id = query.id.clone();
                tokio::spawn(async move {
                    if let Err(e) = transport.answer_callback(&id).await {
                        tracing::debug!("Failed to answer callback query: {}", e);
                    }
                });
            }

            match update_to_event(&update) {
                Some(event) => dispatcher.submit(event),
                None => tracing::debug!(update_id = update.update_id, "Ignoring update"),
            }
        }
    }

    tracing::info!("Poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: serde_json::Value) -> Update {
        serde_json::from_value(json).unwrap()
    }

    fn private_message(extra: serde_json::Value) -> Update {
        let mut message = serde_json::json!({
            "message_id": 77,
            "from": {"id": 5, "first_name": "Kim"},
            "chat": {"id": 5, "type": "private"},
        });
        if let (Some(base), Some(extra)) = (message.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        update(serde_json::json!({"update_id": 1, "message": message}))
    }

    #[test]
    fn start_command_carries_name() {
        let event = update_to_event(&private_message(serde_json::json!({"text": "/start"})))
            .unwrap();
        assert_eq!(event.sender, UserId::new(5));
        assert_eq!(event.sender_name.as_deref(), Some("Kim"));
        assert_eq!(event.kind, InboundKind::Command(Command::Start));
    }

    #[test]
    fn command_with_bot_suffix_is_recognised() {
        let event =
            update_to_event(&private_message(serde_json::json!({"text": "/next@anon_bot"})))
                .unwrap();
        assert_eq!(event.kind, InboundKind::Command(Command::Next));
    }

    #[test]
    fn unknown_command_is_relayed_as_text() {
        let event = update_to_event(&private_message(serde_json::json!({"text": "/shrug"})))
            .unwrap();
        assert_eq!(
            event.kind,
            InboundKind::Message(MessagePayload::text(
                MessageRef::new(UserId::new(5), 77),
                "/shrug"
            ))
        );
    }

    #[test]
    fn media_kinds_are_classified() {
        let cases = [
            (serde_json::json!({"photo": [{"file_id": "p"}]}), PayloadKind::Photo),
            (serde_json::json!({"video": {"file_id": "v"}}), PayloadKind::Video),
            (serde_json::json!({"voice": {"file_id": "o"}}), PayloadKind::Voice),
            (serde_json::json!({"sticker": {"file_id": "s"}}), PayloadKind::Sticker),
            (serde_json::json!({"location": {"latitude": 0.0}}), PayloadKind::Other),
        ];
        for (extra, expected) in cases {
            let event = update_to_event(&private_message(extra)).unwrap();
            match event.kind {
                InboundKind::Message(payload) => assert_eq!(payload.kind, expected),
                other => panic!("unexpected kind {other:?}"),
            }
        }
    }

    #[test]
    fn callback_query_maps_to_action() {
        let event = update_to_event(&update(serde_json::json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 9, "first_name": "Lee"},
                "data": "find_partner"
            }
        })))
        .unwrap();
        assert_eq!(event.sender, UserId::new(9));
        assert_eq!(
            event.kind,
            InboundKind::Callback(CallbackAction::FindPartner)
        );
    }

    #[test]
    fn unknown_callback_data_is_ignored() {
        let u = update(serde_json::json!({
            "update_id": 3,
            "callback_query": {"id": "cb2", "from": {"id": 9, "first_name": "Lee"}, "data": "dance"}
        }));
        assert!(update_to_event(&u).is_none());
    }

    #[test]
    fn group_messages_are_ignored() {
        let u = update(serde_json::json!({
            "update_id": 4,
            "message": {
                "message_id": 1,
                "from": {"id": 5, "first_name": "Kim"},
                "chat": {"id": -100, "type": "supergroup"},
                "text": "hello group"
            }
        }));
        assert!(update_to_event(&u).is_none());
    }
}
