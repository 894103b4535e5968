//! Runs against a real Postgres database and is ignored by default:
//! `DATABASE_URL=postgres://localhost/agora cargo test -p agora-backend --test pg_store -- --ignored`

use std::sync::Arc;
use agora_backend::queries::PgBallotStore;
use agora_backend::store::{BallotError, BallotStore, StoreError, TallyAggregator};
use futures::future::join_all;
use shared::{CastOutcome, Choice, Tally, VoterId};
use sqlx::PgPool;

#[sqlx::test(migrations = false)]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn upsert_keeps_one_ballot_per_voter(pool: PgPool) {
    let store = PgBallotStore::connect(pool).await.unwrap();
    let voter = VoterId::new("u1");

    assert_eq!(store.upsert_ballot(&voter, Choice::For).await.unwrap(), CastOutcome::Recorded);
    assert_eq!(store.upsert_ballot(&voter, Choice::Against).await.unwrap(), CastOutcome::Updated);
    assert_eq!(store.ballot(&voter).await.unwrap().unwrap().choice, Choice::Against);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ballots")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_casts_do_not_duplicate(pool: PgPool) {
    let store = Arc::new(PgBallotStore::connect(pool).await.unwrap());

    let casts = (0..32).map(|i| {
        let store = store.clone();
        async move {
            store
                .upsert_ballot(&VoterId::new("u1"), Choice::ALL[i % 3])
                .await
                .unwrap()
        }
    });
    let outcomes = join_all(casts).await;

    assert_eq!(outcomes.iter().filter(|o| **o == CastOutcome::Recorded).count(), 1);
    assert_eq!(store.compute_tally().await.unwrap().total(), 1);
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn tally_counts_current_ballots(pool: PgPool) {
    let store = PgBallotStore::connect(pool).await.unwrap();
    assert_eq!(store.compute_tally().await.unwrap(), Tally::new());

    for (id, choice) in [("u1", "against"), ("u2", "for"), ("u3", "abstain"), ("u2", "against")] {
        store.cast_or_update_ballot(&VoterId::new(id), choice).await.unwrap();
    }
    let tally = store.compute_tally().await.unwrap();
    assert_eq!(tally.get(Choice::For), 0);
    assert_eq!(tally.get(Choice::Against), 2);
    assert_eq!(tally.get(Choice::Abstain), 1);

    assert_eq!(
        store.cast_or_update_ballot(&VoterId::new("u1"), "maybe").await,
        Err(BallotError::InvalidChoice("maybe".into()))
    );
    assert!(store.has_voted(&VoterId::new("u3")).await.unwrap());
    assert!(!store.has_voted(&VoterId::new("u4")).await.unwrap());
    store.ping().await.unwrap();
}

#[sqlx::test(migrations = false)]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn constraint_violation_is_rejected_not_unavailable(pool: PgPool) {
    let store = PgBallotStore::connect(pool).await.unwrap();

    let err = store
        .upsert_ballot(&VoterId::new("x".repeat(200)), Choice::For)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Rejected(_)), "{err:?}");
    store.ping().await.unwrap();
}
