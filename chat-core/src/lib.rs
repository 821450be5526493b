//! # chat-core
//!
//! Pure matchmaking logic for anonchat (no I/O, instant tests).
//!
//! This crate owns the waiting queue and the pairing table and implements
//! every transition between the `idle`, `waiting` and `paired` states.
//!
//! ## Design Philosophy
//!
//! The [`Matchmaker`] is **pure** - each method takes a user id, mutates
//! in-memory state and returns an outcome describing what happened. It
//! never sends anything. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same sequence of calls → same state)
//! - A single lock around the whole struct in the server
//!
//! The actual notifications are performed by `chat-relay`, which turns
//! outcomes into messages after releasing the lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod matchmaker;
pub mod outcome;

pub use matchmaker::{InvariantViolation, Matchmaker};
pub use outcome::{
    CancelOutcome, EndOutcome, ReportOutcome, RequestOutcome, SkipOutcome, UserStatus,
};
