//! Report wizard state machine
//!
//! Pure transitions in the Elm style: `(state, context, event)` goes in,
//! the next state and a list of effects come out. The runtime owns the
//! state and executes the effects.

mod effect;
pub mod event;
mod messages;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{Command, Event, Input};
pub use state::{MediaKind, MediaRef, ReportDraft, WizardContext, WizardState};
pub use transition::transition;
