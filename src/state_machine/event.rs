//! Events that drive the wizard

use super::state::MediaRef;

/// Commands the operator can issue at any point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    NewReport,
    Cancel,
}

impl Command {
    /// Parse a command name as typed after the slash. A `@botname` suffix
    /// is ignored, unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.split('@').next().unwrap_or_default();
        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "help" => Some(Command::Help),
            "new_report" | "newreport" => Some(Command::NewReport),
            "cancel" => Some(Command::Cancel),
            _ => None,
        }
    }

    /// Commands that are subject to the access guard
    pub fn is_guarded(self) -> bool {
        matches!(self, Command::Start | Command::Help | Command::NewReport)
    }
}

/// An ordinary (non-command) inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Text(String),
    Media(MediaRef),
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Command(Command),
    Input(Input),
}

impl Event {
    pub fn text(text: impl Into<String>) -> Self {
        Event::Input(Input::Text(text.into()))
    }

    pub fn media(media: MediaRef) -> Self {
        Event::Input(Input::Media(media))
    }
}
