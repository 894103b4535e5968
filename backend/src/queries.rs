use sqlx::PgPool;
use tracing::{debug, error, info};
use shared::models::*;
use shared::tally::Tally;
use crate::store::{BallotStore, StoreError, TallyAggregator};

/// Constraint violations are rejected writes; everything else means the
/// database could not serve the query.
fn store_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.constraint().is_some() => {
            error!(constraint = ?db.constraint(), "Ballot write violated a constraint: {}", e);
            StoreError::Rejected(e.to_string())
        }
        _ => {
            error!("Ballot store query failed: {}", e);
            StoreError::Unavailable(e.to_string())
        }
    }
}

/// Postgres-backed ballot store. Owns the process-wide pool.
pub struct PgBallotStore {
    pool: PgPool,
}

impl PgBallotStore {
    /// Applies pending migrations and checks the connection. A store that
    /// cannot be reached here is a startup failure.
    pub async fn connect(pool: PgPool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migrations failed: {e}")))?;

        info!("📋 Migrations complete");

        let store = Self { pool };
        store.ping().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[rocket::async_trait]
impl BallotStore for PgBallotStore {
    async fn has_voted(&self, voter_id: &VoterId) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM ballots WHERE voter_id = $1)")
            .bind(voter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn ballot(&self, voter_id: &VoterId) -> Result<Option<Ballot>, StoreError> {
        sqlx::query_as::<_, Ballot>(
            "SELECT voter_id, choice, updated_at FROM ballots WHERE voter_id = $1",
        )
        .bind(voter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)
    }

    async fn upsert_ballot(&self, voter_id: &VoterId, choice: Choice) -> Result<CastOutcome, StoreError> {
        // xmax is zero only on a freshly inserted row version.
        let inserted = sqlx::query_scalar::<_, bool>(
            "INSERT INTO ballots (voter_id, choice)
             VALUES ($1, $2)
             ON CONFLICT (voter_id)
             DO UPDATE SET choice = EXCLUDED.choice, updated_at = NOW()
             RETURNING (xmax = 0) AS inserted",
        )
        .bind(voter_id)
        .bind(choice)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        debug!(%voter_id, %choice, inserted, "Ballot upserted");

        Ok(if inserted { CastOutcome::Recorded } else { CastOutcome::Updated })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }

    async fn close(&self) {
        info!("Closing ballot store connections");
        self.pool.close().await;
    }
}

#[rocket::async_trait]
impl TallyAggregator for PgBallotStore {
    async fn compute_tally(&self) -> Result<Tally, StoreError> {
        let rows = sqlx::query_as::<_, (Choice, i64)>(
            "SELECT choice, COUNT(*) AS count FROM ballots GROUP BY choice",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(Tally::from_counts(rows)?)
    }
}
