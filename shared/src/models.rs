use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::ErrorCode;
use crate::flow::Screen;
use crate::tally::Tally;
use crate::validation::ValidationError;

/// One of the three options a ballot can carry.
///
/// Declaration order is the display order (for, against, abstain) and is
/// relied on by [`Tally`] iteration.
#[cfg_attr(feature = "backend", derive(sqlx::Type))]
#[cfg_attr(feature = "backend", sqlx(type_name = "ballot_choice", rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    For,
    Against,
    Abstain,
}

impl Choice {
    pub const ALL: [Choice; 3] = [Choice::For, Choice::Against, Choice::Abstain];

    pub const fn as_str(self) -> &'static str {
        match self {
            Choice::For => "for",
            Choice::Against => "against",
            Choice::Abstain => "abstain",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Choice::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidChoice(s.to_string()))
    }
}

/// Opaque voter key supplied by the identity layer. Accepts JSON strings or
/// integers on the way in and always serializes as a string.
#[cfg_attr(feature = "backend", derive(sqlx::Type), sqlx(transparent))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawVoterId", into = "String")]
pub struct VoterId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVoterId {
    Text(String),
    Number(u64),
}

impl From<RawVoterId> for VoterId {
    fn from(raw: RawVoterId) -> Self {
        match raw {
            RawVoterId::Text(s) => VoterId::new(s),
            RawVoterId::Number(n) => VoterId(n.to_string()),
        }
    }
}

impl From<VoterId> for String {
    fn from(id: VoterId) -> Self {
        id.0
    }
}

impl VoterId {
    pub fn new(id: impl Into<String>) -> Self {
        VoterId(id.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The current ballot of one voter. At most one exists per [`VoterId`].
#[cfg_attr(feature = "backend", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub voter_id: VoterId,
    pub choice: Choice,
    pub updated_at: OffsetDateTime,
}

/// Whether an upsert created the voter's first ballot or overwrote it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CastOutcome {
    Recorded,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterStatus {
    pub voter_id: VoterId,
    pub has_voted: bool,
    pub choice: Option<Choice>,
}

/// Display data for a voter. `avatar_ref` is only set when the upstream
/// image reference is renderable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub avatar_ref: Option<String>,
}

/// An inbound interaction as delivered by the transport. `screen` is the
/// screen the action was taken on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub screen: Screen,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub voter_id: Option<VoterId>,
}

/// Interaction body for transports that carry the screen in the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub voter_id: Option<VoterId>,
}

impl InteractionPayload {
    pub fn on(self, screen: Screen) -> Interaction {
        Interaction {
            screen,
            action: self.action,
            voter_id: self.voter_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewAction {
    pub label: String,
    pub next_screen: Screen,
    pub value: Option<String>,
}

impl ViewAction {
    pub fn new(label: impl Into<String>, next_screen: Screen, value: Option<&str>) -> Self {
        Self {
            label: label.into(),
            next_screen,
            value: value.map(str::to_string),
        }
    }
}

/// Renderer-agnostic description of a screen. The transport reports
/// `screen` back with whichever action value the user picks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub screen: Screen,
    pub text: String,
    pub avatar_ref: Option<String>,
    pub counts: Option<Tally>,
    pub actions: Vec<ViewAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
}

impl ViewModel {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
