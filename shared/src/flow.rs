use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ErrorCode;
use crate::models::Choice;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Start,
    Voting,
    Results,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Start, Screen::Voting, Screen::Results];

    pub const fn as_str(self) -> &'static str {
        match self {
            Screen::Start => "start",
            Screen::Voting => "voting",
            Screen::Results => "results",
        }
    }

    /// Screens whose handler needs to know who is asking.
    pub const fn requires_voter(self) -> bool {
        matches!(self, Screen::Voting)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Screen {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Screen::ALL
            .into_iter()
            .find(|screen| screen.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownScreen(s.to_string()))
    }
}

#[cfg(feature = "backend")]
impl<'a> rocket::request::FromParam<'a> for Screen {
    type Error = ValidationError;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse()
    }
}

/// Every action a view can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Begin,
    Cast(Choice),
    ShowResults,
    Back,
    Refresh,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Action> {
        match raw {
            "begin" => Some(Action::Begin),
            "show results" => Some(Action::ShowResults),
            "back" => Some(Action::Back),
            "refresh" => Some(Action::Refresh),
            other => other.parse().ok().map(Action::Cast),
        }
    }

    /// The wire value a transport sends back for this action.
    pub const fn value(self) -> &'static str {
        match self {
            Action::Begin => "begin",
            Action::Cast(choice) => choice.as_str(),
            Action::ShowResults => "show results",
            Action::Back => "back",
            Action::Refresh => "refresh",
        }
    }
}

/// Outcome of the transition table: the screen to render next and the
/// ballot to record before rendering it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub next: Screen,
    pub cast: Option<Choice>,
}

impl Step {
    const fn to(next: Screen) -> Self {
        Self { next, cast: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("'{0}' is not a valid choice")]
    InvalidChoice(String),
    #[error("action '{action}' is not available on the {screen} screen")]
    InvalidTransition { screen: Screen, action: String },
}

impl TransitionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransitionError::InvalidChoice(_) => ErrorCode::InvalidChoice,
            TransitionError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        }
    }
}

/// Maps the screen an action was taken on to the next step.
///
/// A missing or blank action re-renders the current screen. On the voting
/// screen any unrecognised value is an invalid choice; elsewhere an action
/// that is not in the table is an invalid transition.
pub fn transition(screen: Screen, action: Option<&str>) -> Result<Step, TransitionError> {
    let Some(raw) = action.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(Step::to(screen));
    };

    match (screen, Action::parse(raw)) {
        (Screen::Start, Some(Action::Begin)) => Ok(Step::to(Screen::Voting)),
        (Screen::Voting, Some(Action::Cast(choice))) => Ok(Step {
            next: Screen::Voting,
            cast: Some(choice),
        }),
        (Screen::Voting, Some(Action::ShowResults)) => Ok(Step::to(Screen::Results)),
        (Screen::Voting, None) => Err(TransitionError::InvalidChoice(raw.to_string())),
        (Screen::Results, Some(Action::Back)) => Ok(Step::to(Screen::Voting)),
        (Screen::Results, Some(Action::Refresh)) => Ok(Step::to(Screen::Results)),
        (screen, _) => Err(TransitionError::InvalidTransition {
            screen,
            action: raw.to_string(),
        }),
    }
}
