use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::models::Choice;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TallyError {
    #[error("Negative count {count} for {choice}")]
    NegativeCount { choice: Choice, count: i64 },
}

/// Per-choice ballot counts. Every [`Choice`] is always present, with zero
/// when nobody picked it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Choice, u64>", into = "BTreeMap<Choice, u64>")]
pub struct Tally {
    counts: BTreeMap<Choice, u64>,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            counts: Choice::ALL.into_iter().map(|c| (c, 0)).collect(),
        }
    }
}

impl From<BTreeMap<Choice, u64>> for Tally {
    fn from(counts: BTreeMap<Choice, u64>) -> Self {
        let mut tally = Tally::default();
        tally.counts.extend(counts);
        tally
    }
}

impl From<Tally> for BTreeMap<Choice, u64> {
    fn from(tally: Tally) -> Self {
        tally.counts
    }
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tally from grouped `(choice, count)` rows as a database
    /// returns them. Choices missing from `rows` count as zero.
    pub fn from_counts<I>(rows: I) -> Result<Self, TallyError>
    where
        I: IntoIterator<Item = (Choice, i64)>,
    {
        let mut tally = Tally::default();
        for (choice, count) in rows {
            let count = u64::try_from(count)
                .map_err(|_| TallyError::NegativeCount { choice, count })?;
            *tally.counts.entry(choice).or_insert(0) += count;
        }
        Ok(tally)
    }

    pub fn record(&mut self, choice: Choice) {
        *self.counts.entry(choice).or_insert(0) += 1;
    }

    pub fn get(&self, choice: Choice) -> u64 {
        self.counts.get(&choice).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Counts in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Choice, u64)> + '_ {
        self.counts.iter().map(|(&choice, &count)| (choice, count))
    }
}
