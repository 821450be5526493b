//! Relay server state and event handlers.
//!
//! [`ChatRelay`] owns the [`Matchmaker`] behind a single async mutex and
//! turns each inbound event into one matchmaker call plus the outbound
//! notifications that follow from its outcome. The lock is only held for
//! the matchmaker call itself; every send happens after it is released.

use crate::replies;
use crate::surveillance::SurveillanceNotifier;
use crate::transport::{Transport, TransportError};
use chat_core::{
    CancelOutcome, EndOutcome, InvariantViolation, Matchmaker, ReportOutcome, RequestOutcome,
    SkipOutcome, UserStatus,
};
use chat_types::{
    CallbackAction, Command, Controls, InboundEvent, InboundKind, MessagePayload, SessionEvent,
    SessionEventKind, SinkId, UserId,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Operational counters (monotonic since startup).
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Inbound events handled.
    pub events_total: AtomicU64,
    /// Pairings created.
    pub matches_total: AtomicU64,
    /// Pairings removed (end, skip or report).
    pub chats_ended_total: AtomicU64,
    /// Reports filed.
    pub reports_total: AtomicU64,
    /// Messages copied to a partner successfully.
    pub messages_relayed_total: AtomicU64,
    /// Failed deliveries to users.
    pub delivery_failures_total: AtomicU64,
    /// Failed posts to the surveillance sink.
    pub surveillance_failures_total: AtomicU64,
}

/// Result of [`ChatRelay::on_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The sender is not paired; nothing was forwarded.
    NotConnected,
    /// The message was handed to the transport for `partner`.
    Relayed {
        /// Recipient.
        partner: UserId,
        /// Whether the copy reached the partner.
        delivered: bool,
    },
}

/// Main relay server.
pub struct ChatRelay {
    /// Wait queue and pairing table, guarded together.
    matchmaker: Mutex<Matchmaker>,
    transport: Arc<dyn Transport>,
    surveillance: SurveillanceNotifier,
    metrics: RelayMetrics,
    started_at: Instant,
}

impl std::fmt::Debug for ChatRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRelay")
            .field("surveillance", &self.surveillance)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl ChatRelay {
    /// Create a relay that talks through `transport` and mirrors to `sink`.
    pub fn new(transport: Arc<dyn Transport>, sink: SinkId, mirror_messages: bool) -> Self {
        let surveillance = SurveillanceNotifier::new(transport.clone(), sink, mirror_messages);
        Self {
            matchmaker: Mutex::new(Matchmaker::new()),
            transport,
            surveillance,
            metrics: RelayMetrics::default(),
            started_at: Instant::now(),
        }
    }

    /// Get relay metrics.
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Time since the relay was created.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Where `user` currently stands.
    pub async fn status(&self, user: UserId) -> UserStatus {
        self.matchmaker.lock().await.status(user)
    }

    /// Number of users waiting for a partner.
    pub async fn waiting_len(&self) -> usize {
        self.matchmaker.lock().await.waiting_len()
    }

    /// Number of active pairings.
    pub async fn pair_count(&self) -> usize {
        self.matchmaker.lock().await.pair_count()
    }

    /// Verify the matchmaker's structural invariants.
    pub async fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.matchmaker.lock().await.check_invariants()
    }

    /// Route one inbound event to its handler.
    pub async fn handle(&self, event: InboundEvent) {
        self.metrics.events_total.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(user = %event.sender, kind = ?event.kind, "Handling event");

        if let Some(session_event) = event.session_event() {
            self.apply(session_event).await;
            return;
        }
        match &event.kind {
            InboundKind::Command(Command::Start) => {
                self.on_start(event.sender, event.sender_name.as_deref())
                    .await
            }
            InboundKind::Callback(CallbackAction::Settings) => self.on_settings(event.sender).await,
            _ => self.on_help(event.sender).await,
        }
    }

    /// Run a matchmaking or relay request.
    pub async fn apply(&self, event: SessionEvent) {
        let user = event.user;
        match event.kind {
            SessionEventKind::RequestPartner => {
                self.on_find_partner(user).await;
            }
            SessionEventKind::SkipPartner => {
                self.on_skip(user).await;
            }
            SessionEventKind::EndChat => {
                self.on_end(user).await;
            }
            SessionEventKind::ReportPartner => {
                self.on_report(user).await;
            }
            SessionEventKind::CancelSearch => {
                self.on_cancel_search(user).await;
            }
            SessionEventKind::RelayMessage(payload) => {
                self.on_message(user, payload).await;
            }
        }
    }

    /// Greet a user and tell the sink they arrived.
    pub async fn on_start(&self, user: UserId, name: Option<&str>) {
        let name = name.unwrap_or(replies::FALLBACK_NAME);
        tracing::info!(%user, "Bot started");
        let welcome = replies::welcome(name);
        let (_, notice) = tokio::join!(
            self.reply(user, &welcome, Controls::MainMenu),
            self.surveillance.user_started(user, name),
        );
        self.observe("user started", notice);
    }

    /// Queue the user or pair them with the oldest waiting user.
    pub async fn on_find_partner(&self, user: UserId) -> RequestOutcome {
        let outcome = self.matchmaker.lock().await.request_partner(user);
        self.announce_request(user, outcome).await;
        outcome
    }

    /// End the current chat, if any, and look for a new partner.
    pub async fn on_skip(&self, user: UserId) -> SkipOutcome {
        let outcome = self.matchmaker.lock().await.skip_partner(user);
        if let Some(partner) = outcome.ended {
            self.metrics.chats_ended_total.fetch_add(1, Ordering::Relaxed);
            tracing::info!(%user, %partner, "Chat skipped");
            let (_, _, notice) = tokio::join!(
                self.reply(partner, replies::PARTNER_LEFT, Controls::MainMenu),
                self.reply(user, replies::CHAT_ENDED, Controls::None),
                self.surveillance.chat_ended(user, partner),
            );
            self.observe("chat ended", notice);
        }
        self.announce_request(user, outcome.request).await;
        outcome
    }

    /// End the current chat for both sides.
    pub async fn on_end(&self, user: UserId) -> EndOutcome {
        let outcome = self.matchmaker.lock().await.end_chat(user);
        match outcome {
            EndOutcome::NotInChat => {
                self.reply(user, replies::NOT_IN_CHAT, Controls::MainMenu)
                    .await;
            }
            EndOutcome::Ended { partner } => {
                self.metrics.chats_ended_total.fetch_add(1, Ordering::Relaxed);
                tracing::info!(%user, %partner, "Chat ended");
                let (_, _, notice) = tokio::join!(
                    self.reply(partner, replies::PARTNER_LEFT, Controls::MainMenu),
                    self.reply(user, replies::CHAT_ENDED, Controls::MainMenu),
                    self.surveillance.chat_ended(user, partner),
                );
                self.observe("chat ended", notice);
            }
        }
        outcome
    }

    /// Report the partner to the sink and end the chat.
    pub async fn on_report(&self, user: UserId) -> ReportOutcome {
        let outcome = self.matchmaker.lock().await.report_partner(user);
        match outcome {
            ReportOutcome::NothingToReport => {
                self.reply(user, replies::NOTHING_TO_REPORT, Controls::MainMenu)
                    .await;
            }
            ReportOutcome::Reported { partner } => {
                self.metrics.reports_total.fetch_add(1, Ordering::Relaxed);
                self.metrics.chats_ended_total.fetch_add(1, Ordering::Relaxed);
                tracing::info!(%user, %partner, "Partner reported");
                let reporter = async {
                    self.reply(user, replies::REPORTED, Controls::None).await;
                    self.reply(user, replies::CHAT_ENDED, Controls::MainMenu)
                        .await;
                };
                let sink = async {
                    let report = self.surveillance.report_filed(user, partner).await;
                    self.observe("report", report);
                    let ended = self.surveillance.chat_ended(user, partner).await;
                    self.observe("chat ended", ended);
                };
                tokio::join!(
                    reporter,
                    self.reply(partner, replies::PARTNER_LEFT, Controls::MainMenu),
                    sink,
                );
            }
        }
        outcome
    }

    /// Leave the waiting queue.
    pub async fn on_cancel_search(&self, user: UserId) -> CancelOutcome {
        let (outcome, status) = {
            let mut matchmaker = self.matchmaker.lock().await;
            let outcome = matchmaker.cancel_search(user);
            (outcome, matchmaker.status(user))
        };
        let text = match outcome {
            CancelOutcome::Cancelled => replies::SEARCH_CANCELLED,
            CancelOutcome::NotSearching => replies::NOT_SEARCHING,
        };
        self.reply(user, text, controls_for(status)).await;
        outcome
    }

    /// Copy a message to the sender's partner and mirror it to the sink.
    ///
    /// The partner is read once, under the lock, and the lock is released
    /// before anything is sent. Delivery goes to the partner as of that
    /// lookup: if the chat ends or either side is re-paired while the copy
    /// is in flight, the copy still lands with the old partner and is never
    /// redirected to a new one.
    ///
    /// The typing indicator, the copy and the mirror are independent: a
    /// failure of one does not stop the others and never touches state.
    pub async fn on_message(&self, user: UserId, payload: MessagePayload) -> RelayOutcome {
        let partner = self.matchmaker.lock().await.partner_of(user);
        let Some(partner) = partner else {
            self.reply(user, replies::NOT_IN_CHAT, Controls::MainMenu)
                .await;
            return RelayOutcome::NotConnected;
        };

        let to_partner = async {
            if let Err(e) = self.transport.send_typing(partner).await {
                tracing::debug!(user = %partner, "Typing indicator failed: {}", e);
            }
            match self
                .transport
                .copy_message(user, partner, payload.message)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    self.delivery_failed(partner, "copy message", &e);
                    false
                }
            }
        };
        let (delivered, mirror) =
            tokio::join!(to_partner, self.surveillance.message(user, partner, &payload));
        self.observe("message mirror", mirror);

        if delivered {
            self.metrics
                .messages_relayed_total
                .fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%user, %partner, kind = payload.kind.label(), "Message relayed");
        }
        RelayOutcome::Relayed { partner, delivered }
    }

    /// Show the help text.
    pub async fn on_help(&self, user: UserId) {
        let status = self.status(user).await;
        self.reply(user, replies::HELP, controls_for(status)).await;
    }

    /// Settings placeholder.
    pub async fn on_settings(&self, user: UserId) {
        let status = self.status(user).await;
        self.reply(user, replies::SETTINGS, controls_for(status))
            .await;
    }

    async fn announce_request(&self, user: UserId, outcome: RequestOutcome) {
        match outcome {
            RequestOutcome::AlreadyConnected { .. } => {
                self.reply(user, replies::ALREADY_IN_CHAT, Controls::Chat)
                    .await;
            }
            RequestOutcome::AlreadySearching => {
                self.reply(user, replies::ALREADY_WAITING, Controls::Waiting)
                    .await;
            }
            RequestOutcome::Queued => {
                tracing::debug!(%user, "Waiting for a partner");
                self.reply(user, replies::WAITING, Controls::Waiting).await;
            }
            RequestOutcome::Matched { partner } => {
                self.metrics.matches_total.fetch_add(1, Ordering::Relaxed);
                tracing::info!(%user, %partner, "Chat started");
                let (_, _, notice) = tokio::join!(
                    self.reply(user, replies::PARTNER_FOUND, Controls::Chat),
                    self.reply(partner, replies::PARTNER_FOUND, Controls::Chat),
                    self.surveillance.chat_started(user, partner),
                );
                self.observe("chat started", notice);
            }
        }
    }

    /// Best-effort text reply. Returns whether it was delivered.
    async fn reply(&self, to: UserId, text: &str, controls: Controls) -> bool {
        match self.transport.send(to, text, controls).await {
            Ok(()) => true,
            Err(e) => {
                self.delivery_failed(to, "send reply", &e);
                false
            }
        }
    }

    fn delivery_failed(&self, to: UserId, what: &str, error: &TransportError) {
        self.metrics
            .delivery_failures_total
            .fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            user = %to,
            blocked = error.is_blocked(),
            "Failed to {}: {}",
            what,
            error
        );
    }

    fn observe(&self, what: &str, result: Result<(), TransportError>) {
        if let Err(e) = result {
            self.metrics
                .surveillance_failures_total
                .fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Surveillance {} failed: {}", what, e);
        }
    }
}

/// Keyboard matching where the user stands.
fn controls_for(status: UserStatus) -> Controls {
    match status {
        UserStatus::Idle => Controls::MainMenu,
        UserStatus::Waiting { .. } => Controls::Waiting,
        UserStatus::Paired { .. } => Controls::Chat,
    }
}
