use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use shared::flow::{transition, Screen, TransitionError};
use shared::models::*;
use shared::tally::Tally;
use shared::validation::{require_voter_id, ValidationError};
use crate::config::Config;
use crate::identity::{IdentityError, IdentityResolver};
use crate::store::{BallotError, BallotStore, StoreError, TallyAggregator};
use crate::views;

/// What happens to a ballot when the voter's identity can't be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Record the ballot and greet generically.
    FailOpen,
    /// Refuse to record the ballot until the lookup succeeds.
    RequiredForCasting,
}

#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub identity_timeout: Duration,
    pub identity_policy: IdentityPolicy,
    pub fallback_avatar: String,
}

impl From<&Config> for RouterSettings {
    fn from(config: &Config) -> Self {
        Self {
            identity_timeout: config.identity.timeout,
            identity_policy: if config.identity.required_for_casting {
                IdentityPolicy::RequiredForCasting
            } else {
                IdentityPolicy::FailOpen
            },
            fallback_avatar: config.fallback_avatar.clone(),
        }
    }
}

/// Interactions refused before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectedInteraction {
    #[error("The {0} screen requires a voter identity")]
    MissingVoterIdentity(Screen),
    #[error("Invalid voter identity: {0}")]
    InvalidVoterIdentity(String),
}

/// Stateless dispatcher from inbound interactions to view-models.
///
/// Store and identity failures are turned into view-models here and never
/// escape as errors; only malformed requests are rejected.
pub struct SessionRouter {
    store: Arc<dyn BallotStore>,
    tally: Arc<dyn TallyAggregator>,
    identity: Arc<dyn IdentityResolver>,
    settings: RouterSettings,
}

impl SessionRouter {
    pub fn new<S>(store: Arc<S>, identity: Arc<dyn IdentityResolver>, settings: RouterSettings) -> Self
    where
        S: BallotStore + TallyAggregator + 'static,
    {
        Self {
            store: store.clone(),
            tally: store,
            identity,
            settings,
        }
    }

    #[instrument(
        skip(self, interaction),
        fields(
            interaction_id = %Uuid::new_v4(),
            screen = %interaction.screen,
            action = ?interaction.action,
        )
    )]
    pub async fn handle(&self, interaction: &Interaction) -> Result<ViewModel, RejectedInteraction> {
        let step = match transition(interaction.screen, interaction.action.as_deref()) {
            Ok(step) => step,
            Err(TransitionError::InvalidChoice(raw)) => {
                warn!("Rejected invalid choice {:?}", raw);
                return Ok(views::invalid_choice(&raw));
            }
            Err(TransitionError::InvalidTransition { screen, action }) => {
                warn!("Rejected action {:?} on the {} screen", action, screen);
                return Ok(views::invalid_transition(screen, &action));
            }
        };

        let voter_id = if step.next.requires_voter() {
            let voter_id = require_voter_id(interaction.voter_id.as_ref()).map_err(|e| match e {
                ValidationError::MissingVoterId => RejectedInteraction::MissingVoterIdentity(step.next),
                other => RejectedInteraction::InvalidVoterIdentity(other.to_string()),
            })?;
            Some(voter_id)
        } else {
            None
        };

        match (step.next, voter_id) {
            (Screen::Voting, Some(voter_id)) => Ok(self.voting(voter_id, step.cast).await),
            (Screen::Voting, None) => Err(RejectedInteraction::MissingVoterIdentity(Screen::Voting)),
            (Screen::Start, _) => Ok(views::start()),
            (Screen::Results, _) => Ok(self.results().await),
        }
    }

    async fn voting(&self, voter_id: &VoterId, cast: Option<Choice>) -> ViewModel {
        let Some(choice) = cast else {
            let profile = self.lookup_profile(voter_id).await;
            return views::voting(profile.ok().as_ref(), &self.settings.fallback_avatar);
        };

        let (profile, recorded) = match self.settings.identity_policy {
            // The write is polled alongside the lookup and never waits on it.
            IdentityPolicy::FailOpen => {
                tokio::join!(self.lookup_profile(voter_id), self.cast(voter_id, choice))
            }
            IdentityPolicy::RequiredForCasting => {
                let profile = self.lookup_profile(voter_id).await;
                if profile.is_err() {
                    warn!(%voter_id, "Ballot not recorded: identity could not be confirmed");
                    return views::identity_unavailable();
                }
                (profile, self.cast(voter_id, choice).await)
            }
        };

        match recorded {
            Ok(()) => views::voting(profile.ok().as_ref(), &self.settings.fallback_avatar),
            Err(failure) => failure,
        }
    }

    /// Records the ballot, or returns the error view to show instead.
    async fn cast(&self, voter_id: &VoterId, choice: Choice) -> Result<(), ViewModel> {
        match self.store.cast_or_update_ballot(voter_id, choice.as_str()).await {
            Ok(CastOutcome::Recorded) => {
                info!(%voter_id, %choice, "Vote recorded");
                Ok(())
            }
            Ok(CastOutcome::Updated) => {
                info!(%voter_id, %choice, "Vote updated");
                Ok(())
            }
            Err(BallotError::InvalidChoice(raw)) => Err(views::invalid_choice(&raw)),
            Err(BallotError::Store(e)) => {
                error!(%voter_id, "Failed to record vote: {}", e);
                Err(views::store_unavailable(Screen::Voting))
            }
        }
    }

    async fn results(&self) -> ViewModel {
        match self.tally.compute_tally().await {
            Ok(tally) => views::results(&tally),
            Err(e) => {
                error!("Failed to compute tally: {}", e);
                views::store_unavailable(Screen::Results)
            }
        }
    }

    /// Bounded identity lookup. Failures are logged and handed back so the
    /// caller can decide whether they matter.
    async fn lookup_profile(&self, voter_id: &VoterId) -> Result<Profile, IdentityError> {
        let limit = self.settings.identity_timeout;
        let result = match timeout(limit, self.identity.resolve(voter_id)).await {
            Ok(result) => result,
            Err(_) => Err(IdentityError::Timeout(limit)),
        };

        if let Err(e) = &result {
            warn!(%voter_id, "Identity lookup failed, using fallback greeting: {}", e);
        }
        result
    }

    pub async fn tally(&self) -> Result<Tally, StoreError> {
        self.tally.compute_tally().await
    }

    pub async fn voter_status(&self, voter_id: &VoterId) -> Result<VoterStatus, StoreError> {
        if !self.store.has_voted(voter_id).await? {
            return Ok(VoterStatus { voter_id: voter_id.clone(), has_voted: false, choice: None });
        }

        let ballot = self.store.ballot(voter_id).await?;
        Ok(VoterStatus {
            voter_id: voter_id.clone(),
            has_voted: true,
            choice: ballot.map(|b| b.choice),
        })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}
