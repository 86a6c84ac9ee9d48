//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_media() -> impl Strategy<Value = MediaRef> {
    prop_oneof![
        "[A-Za-z0-9_-]{8}".prop_map(MediaRef::photo),
        "[A-Za-z0-9_-]{8}".prop_map(MediaRef::document),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        // Free text, often without digits
        "[a-zа-я ]{0,20}",
        // Numbers with assorted grouping
        "[0-9]{1,3}([ ,.][0-9]{3}){0,3}",
        // Links
        "[a-z]{1,8} — https://t\\.me/[a-z]{1,8}/[0-9]{1,4}",
        Just("готово".to_string()),
        Just("да".to_string()),
        Just("нет".to_string()),
        Just("-".to_string()),
    ]
}

fn arb_input() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => arb_text().prop_map(Input::Text),
        1 => arb_media().prop_map(Input::Media),
    ]
}

fn arb_command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start),
        Just(Command::Help),
        Just(Command::NewReport),
        Just(Command::Cancel),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        8 => arb_input().prop_map(Event::Input),
        1 => arb_command().prop_map(Event::Command),
    ]
}

/// A state reached by replaying events from a fresh draft
fn arb_state() -> impl Strategy<Value = WizardState> {
    proptest::collection::vec(arb_input(), 0..20).prop_map(|inputs| {
        let context = WizardContext::authorized();
        let mut state = transition(
            WizardState::Idle,
            &context,
            Event::Command(Command::NewReport),
        )
        .new_state;
        for input in inputs {
            state = transition(state, &context, Event::Input(input)).new_state;
        }
        state
    })
}

fn arb_context() -> impl Strategy<Value = WizardContext> {
    any::<bool>().prop_map(|authorized| WizardContext { authorized })
}

/// Walk a fresh draft forward with valid answers until it waits on `step`
fn state_at(step: Step) -> WizardState {
    let context = WizardContext::authorized();
    let mut state = transition(
        WizardState::Idle,
        &context,
        Event::Command(Command::NewReport),
    )
    .new_state;
    let answers = ["Title", "Period", "https://t.me/a/1", "100", "200", "-", "-", "0"];
    for answer in answers {
        if state.step() == Some(step) {
            break;
        }
        state = transition(state, &context, Event::text(answer)).new_state;
    }
    state
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn draft_stays_consistent(
        events in proptest::collection::vec(arb_event(), 0..40),
    ) {
        let context = WizardContext::authorized();
        let mut state = WizardState::Idle;
        for event in events {
            state = transition(state, &context, event).new_state;
            if let Some(draft) = state.draft() {
                prop_assert!(draft.is_consistent(), "inconsistent draft: {:?}", draft);
            }
        }
    }

    #[test]
    fn cancel_always_returns_to_idle(state in arb_state(), context in arb_context()) {
        let result = transition(state, &context, Event::Command(Command::Cancel));
        prop_assert_eq!(result.new_state, WizardState::Idle);
    }

    #[test]
    fn new_report_always_starts_fresh(state in arb_state()) {
        let result = transition(
            state,
            &WizardContext::authorized(),
            Event::Command(Command::NewReport),
        );
        prop_assert_eq!(
            result.new_state,
            WizardState::Active { draft: ReportDraft::new() }
        );
    }

    #[test]
    fn unauthorized_never_creates_draft(
        events in proptest::collection::vec(arb_event(), 0..20),
    ) {
        let context = WizardContext::unauthorized();
        let mut state = WizardState::Idle;
        for event in events {
            state = transition(state, &context, event).new_state;
            prop_assert_eq!(&state, &WizardState::Idle);
        }
    }

    #[test]
    fn steps_never_move_backwards(state in arb_state(), input in arb_input()) {
        let before = state.step();
        let result = transition(state, &WizardContext::authorized(), Event::Input(input));
        if let (Some(before), Some(after)) = (before, result.new_state.step()) {
            prop_assert!(after >= before);
        }
    }

    #[test]
    fn non_numeric_reach_never_advances(
        step in prop_oneof![
            Just(Step::PlannedReach),
            Just(Step::ActualReach),
            Just(Step::OrganicReach),
        ],
        text in "[a-zа-я ,.\\-]{0,12}",
    ) {
        let state = state_at(step);
        let result = transition(state.clone(), &WizardContext::authorized(), Event::text(text));
        prop_assert_eq!(result.new_state, state);
        prop_assert_eq!(result.effects.len(), 1);
    }

    #[test]
    fn digits_are_read_regardless_of_grouping(n in 0u64..10_000_000_000) {
        let plain = n.to_string();
        let spaced = crate::report::format_int(n);
        let dotted = spaced.replace(' ', ".");
        let commas = spaced.replace(' ', ",");
        for text in [plain, spaced, dotted, commas] {
            prop_assert_eq!(parse_reach(&text), Some(n));
        }
    }

    #[test]
    fn publish_only_from_confirm(state in arb_state(), input in arb_input()) {
        let step = state.step();
        let result = transition(state, &WizardContext::authorized(), Event::Input(input));
        let published = result
            .effects
            .iter()
            .any(|e| matches!(e, Effect::PublishReport { .. }));
        if published {
            prop_assert_eq!(step, Some(Step::Confirm));
            prop_assert_eq!(result.new_state, WizardState::Idle);
        }
    }
}
