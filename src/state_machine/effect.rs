//! Effects produced by state transitions

use super::state::ReportDraft;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a message back to the operator
    Reply { text: String, rich: bool },

    /// Render the finished draft and send it, followed by its media.
    /// The draft is moved out of the wizard state, which is already idle.
    PublishReport { draft: Box<ReportDraft> },
}

impl Effect {
    /// Reply rendered with the platform's rich text (HTML) mode
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            rich: true,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Effect::Reply {
            text: text.into(),
            rich: false,
        }
    }

    pub fn publish(draft: ReportDraft) -> Self {
        Effect::PublishReport {
            draft: Box::new(draft),
        }
    }
}
