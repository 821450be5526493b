//! Results of matchmaker operations.
//!
//! Requests that do not fit the user's current state are not errors:
//! they come back as informational variants and leave state untouched.

use chat_types::UserId;

/// Result of [`Matchmaker::request_partner`](crate::Matchmaker::request_partner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Already paired; nothing changed.
    AlreadyConnected {
        /// The current partner.
        partner: UserId,
    },
    /// Already in the waiting queue; nothing changed.
    AlreadySearching,
    /// Paired with the oldest eligible waiting user.
    Matched {
        /// The new partner, removed from the queue.
        partner: UserId,
    },
    /// Nobody eligible was waiting; appended to the queue.
    Queued,
}

impl RequestOutcome {
    /// The partner after the call, if the user is paired.
    pub fn partner(&self) -> Option<UserId> {
        match self {
            RequestOutcome::AlreadyConnected { partner } | RequestOutcome::Matched { partner } => {
                Some(*partner)
            }
            RequestOutcome::AlreadySearching | RequestOutcome::Queued => None,
        }
    }
}

/// Result of [`Matchmaker::end_chat`](crate::Matchmaker::end_chat).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndOutcome {
    /// The user was not paired.
    NotInChat,
    /// The pairing was removed for both sides.
    Ended {
        /// The former partner, to be told the chat is over.
        partner: UserId,
    },
}

/// Result of [`Matchmaker::skip_partner`](crate::Matchmaker::skip_partner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipOutcome {
    /// The partner that was left behind, if the user was paired.
    pub ended: Option<UserId>,
    /// What happened when the user asked for a new partner.
    pub request: RequestOutcome,
}

/// Result of [`Matchmaker::cancel_search`](crate::Matchmaker::cancel_search).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Removed from the waiting queue.
    Cancelled,
    /// Was not waiting.
    NotSearching,
}

/// Result of [`Matchmaker::report_partner`](crate::Matchmaker::report_partner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The user was not paired.
    NothingToReport,
    /// The partner was reported and the pairing removed for both sides.
    Reported {
        /// The reported user.
        partner: UserId,
    },
}

/// Where a user currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    /// Neither waiting nor paired.
    Idle,
    /// In the waiting queue.
    Waiting {
        /// Zero-based position, 0 being next in line.
        position: usize,
    },
    /// In a conversation.
    Paired {
        /// The partner.
        partner: UserId,
    },
}
