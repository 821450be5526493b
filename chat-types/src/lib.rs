//! # chat-types
//!
//! Shared vocabulary for the anonchat relay.
//!
//! This crate provides the types used across all anonchat crates:
//! - [`UserId`], [`SinkId`], [`MessageRef`] - Identity types
//! - [`MessagePayload`] - Relayed message content
//! - [`InboundEvent`], [`SessionEvent`] - What users ask for
//! - [`Controls`] - Keyboard layouts attached to replies

#![warn(missing_docs)]
#![warn(clippy::all)]

mod controls;
mod events;
mod ids;
mod payload;

pub use controls::{Button, Controls};
pub use events::{
    CallbackAction, Command, InboundEvent, InboundKind, ParseEventError, SessionEvent,
    SessionEventKind,
};
pub use ids::{MessageRef, SinkId, UserId};
pub use payload::{MessagePayload, PayloadKind, SUMMARY_TEXT_LIMIT};
