use crate::models::VoterId;

pub const MAX_VOTER_ID_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid choice: {0} (must be for, against or abstain)")]
    InvalidChoice(String),
    #[error("Unknown screen: {0}")]
    UnknownScreen(String),
    #[error("Voter identifier is missing")]
    MissingVoterId,
    #[error("Voter identifier exceeds maximum length of {MAX_VOTER_ID_LENGTH}")]
    VoterIdTooLong,
}

/// Returns the voter id if one was supplied and is usable as a ballot key.
/// Blank ids count as missing.
pub fn require_voter_id(voter_id: Option<&VoterId>) -> Result<&VoterId, ValidationError> {
    let voter_id = voter_id
        .filter(|id| !id.is_blank())
        .ok_or(ValidationError::MissingVoterId)?;

    if voter_id.as_str().chars().count() > MAX_VOTER_ID_LENGTH {
        return Err(ValidationError::VoterIdTooLong);
    }
    Ok(voter_id)
}

/// Whether an upstream image reference can be handed to the renderer.
/// Only absolute http(s) references are accepted and WebP images are not.
pub fn is_renderable_avatar(reference: &str) -> bool {
    let reference = reference.trim().to_lowercase();
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let Some(rest) = path
        .strip_prefix("https://")
        .or_else(|| path.strip_prefix("http://"))
    else {
        return false;
    };

    !rest.is_empty() && !rest.starts_with('/') && !path.ends_with(".webp")
}
