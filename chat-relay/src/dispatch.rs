//! Per-user event dispatch.
//!
//! Every sender gets a lane: an unbounded channel drained by its own
//! worker task. Events from one user are handled strictly in arrival
//! order, while different users proceed concurrently.
//!
//! A worker that sees no event for the idle period retires its lane. The
//! retirement check and [`Dispatcher::submit`] both run under the lane's
//! map entry lock, so an event is either picked up by the retiring worker
//! or lands in a fresh lane; it is never dropped or reordered.

use crate::server::ChatRelay;
use chat_types::{InboundEvent, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug)]
struct Lane {
    id: u64,
    tx: mpsc::UnboundedSender<InboundEvent>,
}

/// Routes inbound events to per-user workers.
///
/// Cheap to clone; clones share the same lanes. Must be used from inside
/// a tokio runtime.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    relay: Arc<ChatRelay>,
    lanes: Arc<DashMap<UserId, Lane>>,
    next_lane_id: Arc<AtomicU64>,
    idle: Duration,
}

impl Dispatcher {
    /// Create a dispatcher whose lanes retire after `idle` without events.
    pub fn new(relay: Arc<ChatRelay>, idle: Duration) -> Self {
        Self {
            relay,
            lanes: Arc::new(DashMap::new()),
            next_lane_id: Arc::new(AtomicU64::new(0)),
            idle,
        }
    }

    /// Queue an event on its sender's lane.
    pub fn submit(&self, event: InboundEvent) {
        let user = event.sender;
        match self.lanes.entry(user) {
            Entry::Occupied(mut entry) => {
                if let Err(mpsc::error::SendError(event)) = entry.get().tx.send(event) {
                    tracing::warn!(%user, "Lane worker gone, restarting lane");
                    entry.insert(self.spawn_lane(user, event));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(self.spawn_lane(user, event));
            }
        }
    }

    /// Number of lanes with a live worker.
    pub fn active_lanes(&self) -> usize {
        self.lanes.len()
    }

    /// Drop every lane. Workers finish the events already queued and exit.
    pub fn close(&self) {
        self.lanes.clear();
    }

    fn spawn_lane(&self, user: UserId, first: InboundEvent) -> Lane {
        let (tx, mut rx) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = tx.send(first);

        let id = self.next_lane_id.fetch_add(1, Ordering::Relaxed);
        let relay = self.relay.clone();
        let lanes = self.lanes.clone();
        let idle = self.idle;
        tracing::debug!(%user, lane = id, "Lane opened");

        tokio::spawn(async move {
            loop {
                let event = match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(_elapsed) => match retire(&lanes, user, id, &mut rx) {
                        Some(event) => event,
                        None => break,
                    },
                };
                relay.handle(event).await;
            }
            tracing::debug!(%user, lane = id, "Lane closed");
        });

        Lane { id, tx }
    }
}

/// Remove the lane unless an event slipped in; returns that event if so.
fn retire(
    lanes: &DashMap<UserId, Lane>,
    user: UserId,
    id: u64,
    rx: &mut mpsc::UnboundedReceiver<InboundEvent>,
) -> Option<InboundEvent> {
    match lanes.entry(user) {
        Entry::Occupied(entry) if entry.get().id == id => match rx.try_recv() {
            Ok(event) => Some(event),
            Err(_) => {
                entry.remove();
                None
            }
        },
        // Already replaced or cleared.
        _ => rx.try_recv().ok(),
    }
}
