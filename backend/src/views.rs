use shared::error::ErrorCode;
use shared::flow::{Action, Screen};
use shared::models::*;
use shared::tally::Tally;

pub const START_TEXT: &str = "Press the button below to start voting!";
pub const WELCOME_TEXT: &str =
    "Welcome to Agora Voting! Please vote for or against or abstain from the motion below.";
pub const RESULTS_HEADING: &str = "Results";

fn choice_label(choice: Choice) -> &'static str {
    match choice {
        Choice::For => "▲ For",
        Choice::Against => "▲ Against",
        Choice::Abstain => "▲ Abstain",
    }
}

fn action(label: &str, next_screen: Screen, action: Action) -> ViewAction {
    ViewAction::new(label, next_screen, Some(action.value()))
}

fn voting_actions() -> Vec<ViewAction> {
    Choice::ALL
        .into_iter()
        .map(|choice| action(choice_label(choice), Screen::Voting, Action::Cast(choice)))
        .chain([action("◉ Result", Screen::Results, Action::ShowResults)])
        .collect()
}

pub fn start() -> ViewModel {
    ViewModel {
        screen: Screen::Start,
        text: START_TEXT.into(),
        avatar_ref: None,
        counts: None,
        actions: vec![action("⇧ Lets Get Started!", Screen::Voting, Action::Begin)],
        error: None,
    }
}

/// Greeting plus the three choices and the results link. Without a profile
/// the greeting is generic and the fallback avatar is shown.
pub fn voting(profile: Option<&Profile>, fallback_avatar: &str) -> ViewModel {
    let greeting = match profile {
        Some(profile) => format!("Hi, {} 👋🏻", profile.display_name),
        None => "Hi there 👋🏻".to_string(),
    };

    let avatar_ref = profile
        .and_then(|p| p.avatar_ref.clone())
        .unwrap_or_else(|| fallback_avatar.to_string());

    ViewModel {
        screen: Screen::Voting,
        text: format!("{greeting}\n{WELCOME_TEXT}"),
        avatar_ref: Some(avatar_ref),
        counts: None,
        actions: voting_actions(),
        error: None,
    }
}

pub fn results(tally: &Tally) -> ViewModel {
    let lines: Vec<String> = tally
        .iter()
        .map(|(choice, count)| format!("Total vote for {choice} is {count}"))
        .collect();

    ViewModel {
        screen: Screen::Results,
        text: format!("{RESULTS_HEADING}\n{}", lines.join("\n")),
        avatar_ref: None,
        counts: Some(tally.clone()),
        actions: vec![
            action("⏏︎ Back", Screen::Voting, Action::Back),
            action("⌁ Refresh", Screen::Results, Action::Refresh),
        ],
        error: None,
    }
}

/// Error views stay on `screen`, so a retry without an action value
/// re-renders it.
fn failure(screen: Screen, code: ErrorCode, text: String, actions: Vec<ViewAction>) -> ViewModel {
    ViewModel {
        screen,
        text,
        avatar_ref: None,
        counts: None,
        actions,
        error: Some(code),
    }
}

fn retry(screen: Screen) -> Vec<ViewAction> {
    vec![ViewAction::new("⟲ Try again", screen, None)]
}

pub fn store_unavailable(screen: Screen) -> ViewModel {
    failure(
        screen,
        ErrorCode::StoreUnavailable,
        "The ballot box can't be reached right now. Please try again in a moment.".into(),
        retry(screen),
    )
}

pub fn identity_unavailable() -> ViewModel {
    failure(
        Screen::Voting,
        ErrorCode::IdentityLookupFailed,
        "We couldn't confirm who you are, so your vote was not recorded. Please try again.".into(),
        retry(Screen::Voting),
    )
}

/// Offers the voting choices again; nothing was recorded.
pub fn invalid_choice(raw: &str) -> ViewModel {
    failure(
        Screen::Voting,
        ErrorCode::InvalidChoice,
        format!("\"{raw}\" is not an option. Please vote for or against or abstain."),
        voting_actions(),
    )
}

pub fn invalid_transition(screen: Screen, raw: &str) -> ViewModel {
    failure(
        screen,
        ErrorCode::InvalidTransition,
        format!("\"{raw}\" can't be used here."),
        vec![ViewAction::new("⏏︎ Back", screen, None)],
    )
}
