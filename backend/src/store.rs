use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::error;
use shared::models::*;
use shared::tally::{Tally, TallyError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Ballot store unavailable: {0}")]
    Unavailable(String),
    #[error("Ballot store rejected the write: {0}")]
    Rejected(String),
    #[error("Ballot store returned inconsistent data: {0}")]
    Inconsistent(String),
}

impl From<TallyError> for StoreError {
    fn from(e: TallyError) -> Self {
        StoreError::Inconsistent(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BallotError {
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Durable voter -> choice mapping.
///
/// Implementations must make [`BallotStore::upsert_ballot`] a single atomic
/// operation keyed on the voter id: concurrent calls for one voter leave
/// exactly one ballot and the last committed write wins.
#[rocket::async_trait]
pub trait BallotStore: Send + Sync {
    async fn has_voted(&self, voter_id: &VoterId) -> Result<bool, StoreError>;

    async fn ballot(&self, voter_id: &VoterId) -> Result<Option<Ballot>, StoreError>;

    async fn upsert_ballot(&self, voter_id: &VoterId, choice: Choice) -> Result<CastOutcome, StoreError>;

    /// Validates a raw choice value and records it. Invalid values never
    /// reach the backing store.
    async fn cast_or_update_ballot(&self, voter_id: &VoterId, choice: &str) -> Result<CastOutcome, BallotError> {
        let choice = choice
            .parse::<Choice>()
            .map_err(|_| BallotError::InvalidChoice(choice.to_string()))?;
        Ok(self.upsert_ballot(voter_id, choice).await?)
    }

    async fn ping(&self) -> Result<(), StoreError>;

    /// Releases the backing connection. Called once on shutdown.
    async fn close(&self) {}
}

#[rocket::async_trait]
pub trait TallyAggregator: Send + Sync {
    /// Point-in-time count of current ballots per choice.
    async fn compute_tally(&self) -> Result<Tally, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBallotStore {
    ballots: Mutex<HashMap<VoterId, Ballot>>,
}

impl MemoryBallotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<VoterId, Ballot>>, StoreError> {
        self.ballots.lock().map_err(|e| {
            error!("Failed to acquire ballot store lock: {}", e);
            StoreError::Unavailable("ballot store lock poisoned".into())
        })
    }

    pub fn ballot_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }
}

#[rocket::async_trait]
impl BallotStore for MemoryBallotStore {
    async fn has_voted(&self, voter_id: &VoterId) -> Result<bool, StoreError> {
        Ok(self.lock()?.contains_key(voter_id))
    }

    async fn ballot(&self, voter_id: &VoterId) -> Result<Option<Ballot>, StoreError> {
        Ok(self.lock()?.get(voter_id).cloned())
    }

    async fn upsert_ballot(&self, voter_id: &VoterId, choice: Choice) -> Result<CastOutcome, StoreError> {
        let mut ballots = self.lock()?;
        let now = OffsetDateTime::now_utc();

        let outcome = match ballots.entry(voter_id.clone()) {
            Entry::Occupied(mut entry) => {
                let ballot = entry.get_mut();
                ballot.choice = choice;
                ballot.updated_at = now;
                CastOutcome::Updated
            }
            Entry::Vacant(entry) => {
                entry.insert(Ballot {
                    voter_id: voter_id.clone(),
                    choice,
                    updated_at: now,
                });
                CastOutcome::Recorded
            }
        };
        Ok(outcome)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[rocket::async_trait]
impl TallyAggregator for MemoryBallotStore {
    async fn compute_tally(&self) -> Result<Tally, StoreError> {
        let ballots = self.lock()?;
        let mut tally = Tally::new();
        for ballot in ballots.values() {
            tally.record(ballot.choice);
        }
        Ok(tally)
    }
}
