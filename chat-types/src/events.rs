//! Inbound events and the session events derived from them.
//!
//! The transport produces [`InboundEvent`]s (commands, button presses,
//! messages). Those that change matchmaking state map onto a
//! [`SessionEvent`]; the rest (start, help, settings) are purely
//! informational.

use crate::ids::UserId;
use crate::payload::MessagePayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a callback payload or command is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEventError {
    /// Unknown callback data string.
    #[error("unknown callback action: {0}")]
    UnknownAction(String),
    /// Text that is not a bot command, or an unknown one.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Action carried by an inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackAction {
    /// Look for a partner.
    FindPartner,
    /// Leave the current partner and look for another.
    Next,
    /// Leave the current partner.
    End,
    /// Report the current partner.
    Report,
    /// Stop waiting for a partner.
    Cancel,
    /// Settings placeholder.
    Settings,
    /// Usage help.
    Help,
}

impl CallbackAction {
    /// The callback data string sent to and received from the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackAction::FindPartner => "find_partner",
            CallbackAction::Next => "next",
            CallbackAction::End => "end",
            CallbackAction::Report => "report",
            CallbackAction::Cancel => "cancel",
            CallbackAction::Settings => "settings",
            CallbackAction::Help => "help",
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackAction {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "find_partner" => Ok(CallbackAction::FindPartner),
            "next" => Ok(CallbackAction::Next),
            "end" => Ok(CallbackAction::End),
            "report" => Ok(CallbackAction::Report),
            "cancel" => Ok(CallbackAction::Cancel),
            "settings" => Ok(CallbackAction::Settings),
            "help" => Ok(CallbackAction::Help),
            other => Err(ParseEventError::UnknownAction(other.to_string())),
        }
    }
}

/// Slash command typed by a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// `/start`: greeting and main menu.
    Start,
    /// `/find`
    Find,
    /// `/next`
    Next,
    /// `/end`
    End,
    /// `/report`
    Report,
    /// `/cancel`
    Cancel,
    /// `/help`
    Help,
}

impl Command {
    /// Parse the first word of a message as a command.
    ///
    /// Accepts the `/cmd@botname` form used in groups and ignores any
    /// arguments after the command.
    pub fn parse(text: &str) -> Result<Self, ParseEventError> {
        let word = text.split_whitespace().next().unwrap_or_default();
        let Some(name) = word.strip_prefix('/') else {
            return Err(ParseEventError::UnknownCommand(word.to_string()));
        };
        let name = name.split('@').next().unwrap_or_default();
        match name {
            "start" => Ok(Command::Start),
            "find" => Ok(Command::Find),
            "next" => Ok(Command::Next),
            "end" => Ok(Command::End),
            "report" => Ok(Command::Report),
            "cancel" => Ok(Command::Cancel),
            "help" => Ok(Command::Help),
            _ => Err(ParseEventError::UnknownCommand(word.to_string())),
        }
    }
}

/// What the user did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundKind {
    /// Typed a slash command.
    Command(Command),
    /// Pressed an inline button.
    Callback(CallbackAction),
    /// Sent a regular message.
    Message(MessagePayload),
}

/// An event from the platform, tagged with its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Originating user.
    pub sender: UserId,
    /// Display name of the sender, when the platform provides one.
    pub sender_name: Option<String>,
    /// What happened.
    pub kind: InboundKind,
}

impl InboundEvent {
    /// Create an event without a display name.
    pub fn new(sender: UserId, kind: InboundKind) -> Self {
        Self {
            sender,
            sender_name: None,
            kind,
        }
    }

    /// Attach the sender's display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// The matchmaking event this maps to, if any.
    pub fn session_event(&self) -> Option<SessionEvent> {
        let kind = match &self.kind {
            InboundKind::Command(Command::Find)
            | InboundKind::Callback(CallbackAction::FindPartner) => SessionEventKind::RequestPartner,
            InboundKind::Command(Command::Next) | InboundKind::Callback(CallbackAction::Next) => {
                SessionEventKind::SkipPartner
            }
            InboundKind::Command(Command::End) | InboundKind::Callback(CallbackAction::End) => {
                SessionEventKind::EndChat
            }
            InboundKind::Command(Command::Report)
            | InboundKind::Callback(CallbackAction::Report) => SessionEventKind::ReportPartner,
            InboundKind::Command(Command::Cancel)
            | InboundKind::Callback(CallbackAction::Cancel) => SessionEventKind::CancelSearch,
            InboundKind::Message(payload) => SessionEventKind::RelayMessage(payload.clone()),
            InboundKind::Command(Command::Start | Command::Help)
            | InboundKind::Callback(CallbackAction::Settings | CallbackAction::Help) => {
                return None
            }
        };
        Some(SessionEvent {
            user: self.sender,
            kind,
        })
    }
}

/// A matchmaking or relay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// Find a partner.
    RequestPartner,
    /// End the current chat and find a new partner.
    SkipPartner,
    /// End the current chat.
    EndChat,
    /// Report the current partner and end the chat.
    ReportPartner,
    /// Leave the waiting queue.
    CancelSearch,
    /// Forward a message to the current partner.
    RelayMessage(MessagePayload),
}

/// A [`SessionEventKind`] tagged with the user it originates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Originating user.
    pub user: UserId,
    /// The request.
    pub kind: SessionEventKind,
}
