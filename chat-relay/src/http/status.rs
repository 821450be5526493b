//! Liveness banner and JSON status snapshot.

use crate::server::ChatRelay;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Text served at `/` for host liveness checks.
pub const BANNER: &str = "Anonymous chat bot is running ✅";

/// Snapshot served at `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// Always `"ok"` while the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Users waiting for a partner.
    pub waiting_users: usize,
    /// Active conversations.
    pub active_chats: usize,
    /// Seconds since the relay was created.
    pub uptime_seconds: u64,
}

impl HealthStatus {
    /// Read queue and pairing sizes from `relay`.
    pub async fn capture(relay: &ChatRelay) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            waiting_users: relay.waiting_len().await,
            active_chats: relay.pair_count().await,
            uptime_seconds: relay.uptime().as_secs(),
        }
    }
}

pub(super) async fn banner_handler() -> &'static str {
    BANNER
}

pub(super) async fn health_handler(
    Extension(relay): Extension<Arc<ChatRelay>>,
) -> Json<HealthStatus> {
    Json(HealthStatus::capture(&relay).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use chat_types::{SinkId, UserId};

    #[tokio::test]
    async fn capture_counts_queue_and_pairs() {
        let relay = ChatRelay::new(Arc::new(MockTransport::new()), SinkId::new(-1), false);
        for id in 1..=3 {
            relay.on_find_partner(UserId::new(id)).await;
        }

        let status = HealthStatus::capture(&relay).await;
        assert_eq!(status.waiting_users, 1);
        assert_eq!(status.active_chats, 1);
        assert_eq!(status.uptime_seconds, 0);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["active_chats"], 1);
    }
}
