use std::sync::Arc;
use agora_backend::{
    build_rocket,
    config::Config,
    identity::resolver_from_config,
    queries::PgBallotStore,
    routes::AppState,
    session::{RouterSettings, SessionRouter},
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::{error, info};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting Agora Voting server");

    let config = Config::from_lookup(|key| secret_store.get(key)).map_err(|e| {
        error!("✗ Invalid configuration: {}", e);
        CustomError::new(e)
    })?;

    let store = match PgBallotStore::connect(pool).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("✗ Ballot store unreachable at startup: {}", e);
            return Err(CustomError::new(e).into());
        }
    };
    info!("🗳️ Ballot store connected");

    let identity = resolver_from_config(&config.identity).map_err(|e| {
        error!("✗ Failed to build identity resolver: {}", e);
        CustomError::new(e)
    })?;

    if config.identity.required_for_casting {
        info!("Ballots require a resolved identity");
    }
    if !config.identity.cache_ttl.is_zero() {
        info!("Caching voter identities for {:?}", config.identity.cache_ttl);
    }

    let router = SessionRouter::new(store, identity, RouterSettings::from(&config));
    let rocket = build_rocket(AppState::new(router), &config);

    info!(base_path = %config.base_path, "📋 Interaction routes mounted");

    Ok(rocket.into())
}
