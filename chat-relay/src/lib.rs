//! # anonchat-relay
//!
//! Anonymous one-to-one chat relay for Telegram.
//!
//! This crate implements the server that:
//! - Pairs users who ask for a partner, oldest waiter first
//! - Copies messages between partners without revealing who sent them
//! - Mirrors session events and message content to a moderation chat
//! - Serves health and metrics endpoints for process hosting
//!
//! ## Architecture
//!
//! ```text
//!  Telegram ──getUpdates──► poller ──► dispatcher lanes (one per user)
//!                                              │
//!                                   ┌──────────▼──────────┐
//!                                   │      ChatRelay      │
//!                                   │  Mutex<Matchmaker>  │
//!                                   └──────────┬──────────┘
//!                                              │ after the lock is released
//!                        ┌─────────────────────┼──────────────────┐
//!                        ▼                     ▼                  ▼
//!                 replies to users    copyMessage to partner   surveillance sink
//! ```
//!
//! ## Events
//!
//! - `/start`: greeting and main menu
//! - Find Partner, `/find`: queue or match
//! - Next, `/next`: end the chat and queue again
//! - End Chat, `/end`: end the chat for both sides
//! - Report, `/report`: report the partner and end the chat
//! - Cancel search, `/cancel`: leave the queue
//! - any other message: relayed to the partner

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod poller;
pub mod replies;
pub mod server;
pub mod surveillance;
pub mod transport;

pub use error::{RelayError, Result};
