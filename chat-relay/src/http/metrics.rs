//! Prometheus metrics endpoint.

use crate::server::ChatRelay;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Gauges describe the current matchmaker state; counters are monotonic
/// since startup.
pub async fn metrics_handler(Extension(relay): Extension<Arc<ChatRelay>>) -> impl IntoResponse {
    let m = relay.metrics();

    // Gauges
    let waiting = relay.waiting_len().await;
    let chats = relay.pair_count().await;

    // Counters
    let events = m.events_total.load(Ordering::Relaxed);
    let matches = m.matches_total.load(Ordering::Relaxed);
    let ended = m.chats_ended_total.load(Ordering::Relaxed);
    let reports = m.reports_total.load(Ordering::Relaxed);
    let relayed = m.messages_relayed_total.load(Ordering::Relaxed);
    let delivery_failures = m.delivery_failures_total.load(Ordering::Relaxed);
    let surveillance_failures = m.surveillance_failures_total.load(Ordering::Relaxed);

    let body = format!(
        r#"# HELP anonchat_waiting_users Users waiting for a partner
# TYPE anonchat_waiting_users gauge
anonchat_waiting_users {waiting}

# HELP anonchat_active_chats Active one-to-one conversations
# TYPE anonchat_active_chats gauge
anonchat_active_chats {chats}

# HELP anonchat_info Server information
# TYPE anonchat_info gauge
anonchat_info{{version="{version}"}} 1

# HELP anonchat_events_total Inbound events handled
# TYPE anonchat_events_total counter
anonchat_events_total {events}

# HELP anonchat_matches_total Pairings created
# TYPE anonchat_matches_total counter
anonchat_matches_total {matches}

# HELP anonchat_chats_ended_total Pairings removed by end, skip or report
# TYPE anonchat_chats_ended_total counter
anonchat_chats_ended_total {ended}

# HELP anonchat_reports_total Reports filed
# TYPE anonchat_reports_total counter
anonchat_reports_total {reports}

# HELP anonchat_messages_relayed_total Messages copied to a partner
# TYPE anonchat_messages_relayed_total counter
anonchat_messages_relayed_total {relayed}

# HELP anonchat_delivery_failures_total Failed deliveries to users
# TYPE anonchat_delivery_failures_total counter
anonchat_delivery_failures_total {delivery_failures}

# HELP anonchat_surveillance_failures_total Failed posts to the surveillance sink
# TYPE anonchat_surveillance_failures_total counter
anonchat_surveillance_failures_total {surveillance_failures}
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use axum::body::to_bytes;
    use chat_types::{SinkId, UserId};

    #[tokio::test]
    async fn exposes_gauges_and_counters() {
        let relay = Arc::new(ChatRelay::new(
            Arc::new(MockTransport::new()),
            SinkId::new(-1),
            false,
        ));
        relay.on_find_partner(UserId::new(1)).await;
        relay.on_find_partner(UserId::new(2)).await;
        relay.on_find_partner(UserId::new(3)).await;

        let response = metrics_handler(Extension(relay)).await.into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("anonchat_waiting_users 1\n"));
        assert!(text.contains("anonchat_active_chats 1\n"));
        assert!(text.contains("anonchat_matches_total 1\n"));
        assert!(text.contains("# TYPE anonchat_reports_total counter"));
    }
}
