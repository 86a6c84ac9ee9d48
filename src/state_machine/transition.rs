//! Pure state transition function
//!
//! Every step is one row of [`RULES`]: the prompt that asks for it, the step
//! that follows it, and the function that validates an answer and writes it
//! into the draft. Commands are handled before the table is consulted.

use super::event::{Command, Event, Input};
use super::messages::{self, Decision};
use super::state::{ReportDraft, Screenshots, Step, WizardContext, WizardState};
use super::Effect;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: WizardState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: WizardState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// What an answer does to the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Accepted, move to the rule's `next` step
    Next,
    /// Accepted, move to a step other than `next`
    Jump(Step),
    /// Accepted, stay on this step without replying
    Stay,
    /// Wrong shape of input, ask the same question again
    Reprompt,
    /// Invalid answer, reply with a corrective hint and stay
    Reject(&'static str),
    /// Confirmed: hand the draft over for publishing
    Publish,
    /// Declined: drop the draft
    Discard,
}

/// One row of the wizard table
pub struct StepRule {
    pub step: Step,
    pub prompt: &'static str,
    pub next: Option<Step>,
    /// Validates the input and, only when accepting it, records it in the draft
    pub accept: fn(&mut ReportDraft, &Input) -> Outcome,
}

pub static RULES: [StepRule; 11] = [
    StepRule {
        step: Step::Title,
        prompt: messages::ASK_TITLE,
        next: Some(Step::Period),
        accept: accept_title,
    },
    StepRule {
        step: Step::Period,
        prompt: messages::ASK_PERIOD,
        next: Some(Step::PaidLinks),
        accept: accept_period,
    },
    StepRule {
        step: Step::PaidLinks,
        prompt: messages::ASK_PAID_LINKS,
        next: Some(Step::PlannedReach),
        accept: accept_paid_links,
    },
    StepRule {
        step: Step::PlannedReach,
        prompt: messages::ASK_PLANNED_REACH,
        next: Some(Step::ActualReach),
        accept: accept_planned_reach,
    },
    StepRule {
        step: Step::ActualReach,
        prompt: messages::ASK_ACTUAL_REACH,
        next: Some(Step::Mediaplan),
        accept: accept_actual_reach,
    },
    StepRule {
        step: Step::Mediaplan,
        prompt: messages::ASK_MEDIAPLAN,
        next: Some(Step::OrganicLinks),
        accept: accept_mediaplan,
    },
    StepRule {
        step: Step::OrganicLinks,
        prompt: messages::ASK_ORGANIC_LINKS,
        next: Some(Step::OrganicReach),
        accept: accept_organic_links,
    },
    StepRule {
        step: Step::OrganicReach,
        prompt: messages::ASK_ORGANIC_REACH,
        next: Some(Step::ScreenshotsChoice),
        accept: accept_organic_reach,
    },
    StepRule {
        step: Step::ScreenshotsChoice,
        prompt: messages::ASK_SCREENSHOTS,
        next: Some(Step::Confirm),
        accept: accept_screenshots_choice,
    },
    StepRule {
        step: Step::ScreenshotsCollect,
        prompt: messages::ASK_MORE_SCREENSHOTS,
        next: Some(Step::Confirm),
        accept: accept_screenshots_collect,
    },
    StepRule {
        step: Step::Confirm,
        prompt: messages::ASK_CONFIRM,
        next: None,
        accept: accept_confirm,
    },
];

/// The table row for `step`
pub fn rule(step: Step) -> &'static StepRule {
    &RULES[step.index()]
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; sending
/// messages and publishing happen in the runtime.
pub fn transition(state: WizardState, context: &WizardContext, event: Event) -> TransitionResult {
    match event {
        Event::Command(Command::Cancel) => {
            TransitionResult::new(WizardState::Idle).with_effect(Effect::plain(messages::CANCELLED))
        }

        Event::Command(command) if command.is_guarded() && !context.authorized => {
            TransitionResult::new(state).with_effect(Effect::plain(messages::ACCESS_DENIED))
        }

        Event::Command(Command::Start | Command::Help) => {
            TransitionResult::new(state).with_effect(Effect::plain(messages::GREETING))
        }

        Event::Command(Command::NewReport) => enter(ReportDraft::new(), Step::Title),

        Event::Input(input) => match state {
            // Nothing to answer; stray messages are ignored
            WizardState::Idle => TransitionResult::new(WizardState::Idle),
            WizardState::Active { draft } => answer(draft, &input),
        },
    }
}

fn answer(mut draft: ReportDraft, input: &Input) -> TransitionResult {
    let rule = rule(draft.step);

    match (rule.accept)(&mut draft, input) {
        Outcome::Next => match rule.next {
            Some(next) => enter(draft, next),
            None => stay(draft),
        },
        Outcome::Jump(step) => enter(draft, step),
        Outcome::Stay => stay(draft),
        Outcome::Reprompt => stay(draft).with_effect(Effect::reply(rule.prompt)),
        Outcome::Reject(hint) => stay(draft).with_effect(Effect::reply(hint)),
        Outcome::Publish => {
            TransitionResult::new(WizardState::Idle).with_effect(Effect::publish(draft))
        }
        Outcome::Discard => {
            TransitionResult::new(WizardState::Idle).with_effect(Effect::plain(messages::NOT_SENT))
        }
    }
}

fn enter(mut draft: ReportDraft, step: Step) -> TransitionResult {
    draft.step = step;
    TransitionResult::new(WizardState::Active { draft })
        .with_effect(Effect::reply(rule(step).prompt))
}

fn stay(draft: ReportDraft) -> TransitionResult {
    TransitionResult::new(WizardState::Active { draft })
}

// ============================================================================
// Input parsing
// ============================================================================

/// Reach numbers: every non-digit is dropped, so `1 233 500`, `1,233,500`
/// and `1.233.500` all read as 1233500. No digits (or overflow) is `None`.
pub fn parse_reach(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Trimmed non-empty lines
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_text(input: &Input) -> Option<&str> {
    match input {
        Input::Text(text) => Some(text.trim()).filter(|t| !t.is_empty()),
        Input::Media(_) => None,
    }
}

// ============================================================================
// Step rules
// ============================================================================

fn accept_title(draft: &mut ReportDraft, input: &Input) -> Outcome {
    let Some(text) = non_empty_text(input) else {
        return Outcome::Reprompt;
    };
    draft.title = Some(text.to_string());
    Outcome::Next
}

fn accept_period(draft: &mut ReportDraft, input: &Input) -> Outcome {
    let Some(text) = non_empty_text(input) else {
        return Outcome::Reprompt;
    };
    draft.period = Some(text.to_string());
    Outcome::Next
}

fn accept_paid_links(draft: &mut ReportDraft, input: &Input) -> Outcome {
    let Some(text) = non_empty_text(input) else {
        return Outcome::Reprompt;
    };
    if !messages::is_skip(text) {
        draft.paid_links = split_lines(text);
    }
    Outcome::Next
}

fn accept_reach(input: &Input, hint: &'static str) -> Result<u64, Outcome> {
    let Some(text) = non_empty_text(input) else {
        return Err(Outcome::Reject(hint));
    };
    parse_reach(text).ok_or(Outcome::Reject(hint))
}

fn accept_planned_reach(draft: &mut ReportDraft, input: &Input) -> Outcome {
    match accept_reach(input, messages::NOT_A_NUMBER_PLANNED) {
        Ok(value) => {
            draft.planned_reach = Some(value);
            Outcome::Next
        }
        Err(outcome) => outcome,
    }
}

fn accept_actual_reach(draft: &mut ReportDraft, input: &Input) -> Outcome {
    match accept_reach(input, messages::NOT_A_NUMBER_ACTUAL) {
        Ok(value) => {
            draft.actual_reach = Some(value);
            Outcome::Next
        }
        Err(outcome) => outcome,
    }
}

fn accept_organic_reach(draft: &mut ReportDraft, input: &Input) -> Outcome {
    match accept_reach(input, messages::NOT_A_NUMBER_ORGANIC) {
        Ok(value) => {
            draft.organic_reach = Some(value);
            Outcome::Next
        }
        Err(outcome) => outcome,
    }
}

fn accept_mediaplan(draft: &mut ReportDraft, input: &Input) -> Outcome {
    let Some(text) = non_empty_text(input) else {
        return Outcome::Reprompt;
    };
    if !messages::is_skip(text) {
        draft.mediaplan_url = Some(text.to_string());
    }
    Outcome::Next
}

fn accept_organic_links(draft: &mut ReportDraft, input: &Input) -> Outcome {
    let Some(text) = non_empty_text(input) else {
        return Outcome::Reprompt;
    };
    if !messages::is_skip(text) {
        draft.organic_links = split_lines(text);
    }
    Outcome::Next
}

fn accept_screenshots_choice(draft: &mut ReportDraft, input: &Input) -> Outcome {
    match input {
        Input::Media(media) => {
            draft.screenshots = Screenshots::Uploaded {
                media: vec![media.clone()],
            };
            Outcome::Jump(Step::ScreenshotsCollect)
        }
        Input::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Outcome::Reprompt;
            }
            let url = (!messages::is_done(text) && !messages::is_skip(text))
                .then(|| text.to_string());
            draft.screenshots = Screenshots::Folder { url };
            Outcome::Next
        }
    }
}

fn accept_screenshots_collect(draft: &mut ReportDraft, input: &Input) -> Outcome {
    match input {
        Input::Media(media) => {
            if let Screenshots::Uploaded { media: collected } = &mut draft.screenshots {
                collected.push(media.clone());
            } else {
                draft.screenshots = Screenshots::Uploaded {
                    media: vec![media.clone()],
                };
            }
            Outcome::Stay
        }
        Input::Text(text) if messages::is_done(text) => Outcome::Next,
        Input::Text(_) => Outcome::Reprompt,
    }
}

fn accept_confirm(_draft: &mut ReportDraft, input: &Input) -> Outcome {
    match input {
        Input::Text(text) => match Decision::parse(text) {
            Some(Decision::Yes) => Outcome::Publish,
            Some(Decision::No) | None => Outcome::Discard,
        },
        // A late album straggler is not an answer
        Input::Media(_) => Outcome::Reprompt,
    }
}
