//! Inline keyboard layouts attached to outgoing messages.
//!
//! The layouts are platform-neutral; the transport renders them into
//! whatever button markup the platform expects.

use crate::events::CallbackAction;

/// A single button: visible label plus the action it triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    /// Text shown on the button.
    pub label: &'static str,
    /// Action delivered back as a callback when pressed.
    pub action: CallbackAction,
}

impl Button {
    const fn new(label: &'static str, action: CallbackAction) -> Self {
        Self { label, action }
    }
}

/// Which keyboard to attach to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Controls {
    /// No keyboard.
    #[default]
    None,
    /// Idle user: find a partner, settings, help.
    MainMenu,
    /// Paired user: next, end, report.
    Chat,
    /// Waiting user: cancel the search.
    Waiting,
}

impl Controls {
    /// Button rows, top to bottom.
    pub fn rows(&self) -> Vec<Vec<Button>> {
        match self {
            Controls::None => Vec::new(),
            Controls::MainMenu => vec![
                vec![Button::new("🔍 Find Partner", CallbackAction::FindPartner)],
                vec![
                    Button::new("⚙️ Settings", CallbackAction::Settings),
                    Button::new("ℹ️ Help", CallbackAction::Help),
                ],
            ],
            Controls::Chat => vec![
                vec![Button::new("⏭ Next", CallbackAction::Next)],
                vec![
                    Button::new("🚫 End Chat", CallbackAction::End),
                    Button::new("⚠ Report", CallbackAction::Report),
                ],
            ],
            Controls::Waiting => vec![vec![Button::new(
                "✖ Cancel search",
                CallbackAction::Cancel,
            )]],
        }
    }

    /// Whether this layout carries any buttons.
    pub fn is_empty(&self) -> bool {
        matches!(self, Controls::None)
    }
}
