//! Waiting queue and pairing table for anonchat.
//!
//! The [`Matchmaker`] owns both structures and only exposes whole
//! transitions, so a caller can never observe a user that is half paired
//! or both waiting and paired. It is deliberately synchronous: the server
//! wraps it in a single lock and runs each method as one critical section.
//!
//! State transitions:
//!
//! ```text
//!            request (nobody waiting)          request (someone waiting)
//!   Idle ──────────────────────────► Waiting ──────────────────────────► Paired
//!    ▲  ◄────────────────────────────  │ ▲                                 │
//!    │           cancel                │ └──── skip (requeue) ◄────────────┤
//!    └──────────────── end / report / partner left ◄───────────────────────┘
//! ```

use crate::outcome::{
    CancelOutcome, EndOutcome, ReportOutcome, RequestOutcome, SkipOutcome, UserStatus,
};
use chat_types::UserId;
use std::collections::{HashMap, HashSet, VecDeque};

/// A broken structural invariant. Only a bug in this module can produce one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A user is paired with themselves.
    #[error("user {0} is paired with itself")]
    SelfPairing(UserId),
    /// `a → b` exists but `b → a` does not.
    #[error("pairing {user} -> {partner} has no reciprocal entry")]
    AsymmetricPairing {
        /// Key of the one-sided entry.
        user: UserId,
        /// Value of the one-sided entry.
        partner: UserId,
    },
    /// A user appears twice in the waiting queue.
    #[error("user {0} is queued more than once")]
    DuplicateWaiter(UserId),
    /// A user is both waiting and paired.
    #[error("user {0} is both waiting and paired")]
    WaitingWhilePaired(UserId),
}

/// Matchmaking state: who is waiting and who is talking to whom.
#[derive(Debug, Default, Clone)]
pub struct Matchmaker {
    /// Users waiting for a partner, oldest first.
    waiting: VecDeque<UserId>,
    /// Symmetric partner map: `pairs[a] == b` iff `pairs[b] == a`.
    pairs: HashMap<UserId, UserId>,
}

impl Matchmaker {
    /// Create an empty matchmaker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a partner.
    ///
    /// Matches with the oldest waiting user that is neither `user` nor
    /// already paired; otherwise queues `user` at the back.
    pub fn request_partner(&mut self, user: UserId) -> RequestOutcome {
        if let Some(&partner) = self.pairs.get(&user) {
            return RequestOutcome::AlreadyConnected { partner };
        }
        if self.is_waiting(user) {
            return RequestOutcome::AlreadySearching;
        }

        let outcome = match self.take_first_eligible_waiter(user) {
            Some(partner) => {
                self.pair(user, partner);
                RequestOutcome::Matched { partner }
            }
            None => {
                self.waiting.push_back(user);
                RequestOutcome::Queued
            }
        };
        self.debug_check();
        outcome
    }

    /// Leave the current partner (if any) and ask for a new one.
    ///
    /// The partner being left is not requeued, so the two can never be
    /// matched straight back together by this call.
    pub fn skip_partner(&mut self, user: UserId) -> SkipOutcome {
        let ended = match self.end_chat(user) {
            EndOutcome::Ended { partner } => Some(partner),
            EndOutcome::NotInChat => None,
        };
        let request = self.request_partner(user);
        SkipOutcome { ended, request }
    }

    /// End the current chat for both sides.
    pub fn end_chat(&mut self, user: UserId) -> EndOutcome {
        let Some(partner) = self.pairs.remove(&user) else {
            return EndOutcome::NotInChat;
        };
        self.pairs.remove(&partner);
        self.debug_check();
        EndOutcome::Ended { partner }
    }

    /// Leave the waiting queue. Calling it when not waiting is a no-op.
    pub fn cancel_search(&mut self, user: UserId) -> CancelOutcome {
        match self.waiting.iter().position(|&w| w == user) {
            Some(index) => {
                self.waiting.remove(index);
                self.debug_check();
                CancelOutcome::Cancelled
            }
            None => CancelOutcome::NotSearching,
        }
    }

    /// Report the current partner. The chat always ends for both sides.
    pub fn report_partner(&mut self, user: UserId) -> ReportOutcome {
        match self.end_chat(user) {
            EndOutcome::Ended { partner } => ReportOutcome::Reported { partner },
            EndOutcome::NotInChat => ReportOutcome::NothingToReport,
        }
    }

    /// The user's partner, if paired.
    pub fn partner_of(&self, user: UserId) -> Option<UserId> {
        self.pairs.get(&user).copied()
    }

    /// Whether the user is in the waiting queue.
    pub fn is_waiting(&self, user: UserId) -> bool {
        self.waiting.contains(&user)
    }

    /// Where the user currently stands.
    pub fn status(&self, user: UserId) -> UserStatus {
        if let Some(partner) = self.partner_of(user) {
            return UserStatus::Paired { partner };
        }
        match self.waiting.iter().position(|&w| w == user) {
            Some(position) => UserStatus::Waiting { position },
            None => UserStatus::Idle,
        }
    }

    /// Number of users waiting.
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Number of active pairings (each counts both users once).
    pub fn pair_count(&self) -> usize {
        self.pairs.len() / 2
    }

    /// Waiting users, oldest first.
    pub fn waiting(&self) -> impl Iterator<Item = UserId> + '_ {
        self.waiting.iter().copied()
    }

    /// Verify every structural invariant.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (&user, &partner) in &self.pairs {
            if user == partner {
                return Err(InvariantViolation::SelfPairing(user));
            }
            if self.pairs.get(&partner) != Some(&user) {
                return Err(InvariantViolation::AsymmetricPairing { user, partner });
            }
        }

        let mut seen = HashSet::with_capacity(self.waiting.len());
        for &user in &self.waiting {
            if !seen.insert(user) {
                return Err(InvariantViolation::DuplicateWaiter(user));
            }
            if self.pairs.contains_key(&user) {
                return Err(InvariantViolation::WaitingWhilePaired(user));
            }
        }
        Ok(())
    }

    /// Remove and return the oldest waiter that `user` may be matched with.
    ///
    /// Entries for `user` itself or for already-paired users are not
    /// eligible. Neither can be queued while the invariants hold; if one is
    /// found ahead of the match it is stale and gets dropped.
    fn take_first_eligible_waiter(&mut self, user: UserId) -> Option<UserId> {
        while let Some(candidate) = self.waiting.pop_front() {
            if candidate == user || self.pairs.contains_key(&candidate) {
                continue;
            }
            return Some(candidate);
        }
        None
    }

    fn pair(&mut self, a: UserId, b: UserId) {
        self.pairs.insert(a, b);
        self.pairs.insert(b, a);
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: UserId = UserId::new(1);
    const B: UserId = UserId::new(2);
    const C: UserId = UserId::new(3);
    const D: UserId = UserId::new(4);

    // ===========================================
    // request_partner
    // ===========================================

    #[test]
    fn first_request_is_queued() {
        let mut mm = Matchmaker::new();
        assert_eq!(mm.request_partner(A), RequestOutcome::Queued);
        assert_eq!(mm.status(A), UserStatus::Waiting { position: 0 });
        assert_eq!(mm.pair_count(), 0);
    }

    #[test]
    fn second_request_matches_waiter() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        assert_eq!(mm.request_partner(B), RequestOutcome::Matched { partner: A });
        assert_eq!(mm.partner_of(A), Some(B));
        assert_eq!(mm.partner_of(B), Some(A));
        assert_eq!(mm.waiting_len(), 0);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn repeated_request_while_waiting_is_rejected() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        assert_eq!(mm.request_partner(A), RequestOutcome::AlreadySearching);
        assert_eq!(mm.waiting_len(), 1);
    }

    #[test]
    fn request_while_paired_reports_current_partner() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);
        assert_eq!(
            mm.request_partner(A),
            RequestOutcome::AlreadyConnected { partner: B }
        );
        assert_eq!(mm.pair_count(), 1);
    }

    #[test]
    fn oldest_waiter_is_matched_first() {
        let mut mm = Matchmaker::new();
        mm.waiting.extend([A, B]);
        mm.check_invariants().unwrap();

        assert_eq!(mm.request_partner(C), RequestOutcome::Matched { partner: A });
        assert_eq!(mm.status(B), UserStatus::Waiting { position: 0 });
    }

    #[test]
    fn scan_drops_stale_paired_entry() {
        let mut mm = Matchmaker::new();
        mm.pair(A, B);
        // Stale entry that cannot arise through the public API.
        mm.waiting.push_back(A);
        mm.waiting.push_back(C);

        assert_eq!(mm.request_partner(D), RequestOutcome::Matched { partner: C });
        assert_eq!(mm.partner_of(A), Some(B));
        assert_eq!(mm.waiting_len(), 0);
        mm.check_invariants().unwrap();
    }

    #[test]
    fn request_outcome_partner_helper() {
        assert_eq!(RequestOutcome::Queued.partner(), None);
        assert_eq!(RequestOutcome::Matched { partner: B }.partner(), Some(B));
    }

    // ===========================================
    // end_chat / report_partner
    // ===========================================

    #[test]
    fn end_chat_clears_both_sides() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);

        assert_eq!(mm.end_chat(A), EndOutcome::Ended { partner: B });
        assert_eq!(mm.status(A), UserStatus::Idle);
        assert_eq!(mm.status(B), UserStatus::Idle);
        assert_eq!(mm.end_chat(A), EndOutcome::NotInChat);
        assert_eq!(mm.end_chat(B), EndOutcome::NotInChat);
    }

    #[test]
    fn end_chat_for_waiting_user_is_not_in_chat() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        assert_eq!(mm.end_chat(A), EndOutcome::NotInChat);
        assert!(mm.is_waiting(A));
    }

    #[test]
    fn report_ends_pairing() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);

        assert_eq!(mm.report_partner(A), ReportOutcome::Reported { partner: B });
        assert_eq!(mm.pair_count(), 0);
        assert_eq!(mm.report_partner(A), ReportOutcome::NothingToReport);
    }

    // ===========================================
    // skip_partner / cancel_search
    // ===========================================

    #[test]
    fn skip_requeues_skipper_only() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);

        let outcome = mm.skip_partner(A);
        assert_eq!(outcome.ended, Some(B));
        assert_eq!(outcome.request, RequestOutcome::Queued);
        assert!(mm.is_waiting(A));
        assert_eq!(mm.status(B), UserStatus::Idle);
    }

    #[test]
    fn skip_matches_immediately_when_someone_waits() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);
        mm.request_partner(C);

        let outcome = mm.skip_partner(B);
        assert_eq!(outcome.ended, Some(A));
        assert_eq!(outcome.request, RequestOutcome::Matched { partner: C });
        assert_eq!(mm.status(A), UserStatus::Idle);
    }

    #[test]
    fn skip_when_idle_is_plain_request() {
        let mut mm = Matchmaker::new();
        let outcome = mm.skip_partner(A);
        assert_eq!(outcome.ended, None);
        assert_eq!(outcome.request, RequestOutcome::Queued);
    }

    #[test]
    fn cancel_search_is_idempotent() {
        let mut mm = Matchmaker::new();
        mm.request_partner(A);
        mm.request_partner(B);
        mm.request_partner(C);

        assert_eq!(mm.cancel_search(C), CancelOutcome::Cancelled);
        let after_once = mm.clone();
        assert_eq!(mm.cancel_search(C), CancelOutcome::NotSearching);
        assert_eq!(mm.waiting_len(), after_once.waiting_len());
        assert_eq!(mm.pair_count(), after_once.pair_count());
    }

    #[test]
    fn cancel_keeps_order_of_remaining_waiters() {
        let mut mm = Matchmaker::new();
        mm.waiting.extend([A, B, C]);
        mm.cancel_search(B);
        assert_eq!(mm.waiting().collect::<Vec<_>>(), vec![A, C]);
    }

    // ===========================================
    // Invariant checker
    // ===========================================

    #[test]
    fn checker_detects_asymmetry() {
        let mut mm = Matchmaker::new();
        mm.pairs.insert(A, B);
        assert_eq!(
            mm.check_invariants(),
            Err(InvariantViolation::AsymmetricPairing {
                user: A,
                partner: B
            })
        );
    }

    #[test]
    fn checker_detects_self_pairing() {
        let mut mm = Matchmaker::new();
        mm.pairs.insert(A, A);
        assert_eq!(
            mm.check_invariants(),
            Err(InvariantViolation::SelfPairing(A))
        );
    }

    #[test]
    fn checker_detects_duplicate_and_paired_waiters() {
        let mut mm = Matchmaker::new();
        mm.waiting.extend([A, A]);
        assert_eq!(
            mm.check_invariants(),
            Err(InvariantViolation::DuplicateWaiter(A))
        );

        let mut mm = Matchmaker::new();
        mm.pair(A, B);
        mm.waiting.push_back(B);
        assert_eq!(
            mm.check_invariants(),
            Err(InvariantViolation::WaitingWhilePaired(B))
        );
    }
}
