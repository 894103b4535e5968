use std::collections::HashMap;
use std::sync::Mutex;
use time::{Duration, OffsetDateTime};
use tracing::error;
use shared::models::{Profile, VoterId};

#[derive(Debug)]
struct CachedProfile {
    profile: Profile,
    fetched_at: OffsetDateTime,
}

/// Resolved profiles kept for a fixed window. A zero window caches nothing.
#[derive(Debug)]
pub struct ProfileCache {
    entries: Mutex<HashMap<VoterId, CachedProfile>>,
    ttl: Duration,
}

impl ProfileCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::try_from(ttl).unwrap_or(Duration::MAX),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_positive()
    }

    pub fn get(&self, voter_id: &VoterId) -> Option<Profile> {
        self.get_at(voter_id, OffsetDateTime::now_utc())
    }

    pub fn insert(&self, voter_id: VoterId, profile: Profile) {
        self.insert_at(voter_id, profile, OffsetDateTime::now_utc())
    }

    pub(crate) fn get_at(&self, voter_id: &VoterId, now: OffsetDateTime) -> Option<Profile> {
        if !self.is_enabled() {
            return None;
        }

        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!("Failed to acquire profile cache lock: {}", e);
                return None;
            }
        };

        entries.retain(|_, cached| now - cached.fetched_at < self.ttl);
        entries.get(voter_id).map(|cached| cached.profile.clone())
    }

    pub(crate) fn insert_at(&self, voter_id: VoterId, profile: Profile, now: OffsetDateTime) {
        if !self.is_enabled() {
            return;
        }

        match self.entries.lock() {
            Ok(mut entries) => {
                entries.insert(voter_id, CachedProfile { profile, fetched_at: now });
            }
            Err(e) => error!("Failed to acquire profile cache lock: {}", e),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
