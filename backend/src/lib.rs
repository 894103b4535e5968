pub mod assets;
pub mod catchers;
pub mod config;
pub mod cors;
pub mod error;
pub mod identity;
pub mod profile_cache;
pub mod queries;
pub mod routes;
pub mod session;
pub mod store;
pub mod views;

pub use shared::{models::*, error::*, flow::*, tally::*};

use rocket::fairing::AdHoc;
use rocket::{catchers, routes, Build, Rocket};
use crate::config::Config;
use crate::cors::Cors;
use crate::routes::AppState;

/// Assembles the service: interaction and tally routes mounted at the
/// configured base path, JSON catchers, CORS, and a shutdown hook that
/// releases the ballot store.
pub fn build_rocket(state: AppState, config: &Config) -> Rocket<Build> {
    rocket::build()
        .attach(Cors::new(config.cors_allowed_origins.clone()))
        .attach(AdHoc::on_shutdown("Close ballot store", |rocket| {
            Box::pin(async move {
                if let Some(state) = rocket.state::<AppState>() {
                    state.router.close().await;
                }
            })
        }))
        .manage(state)
        .mount(
            config.base_path.as_str(),
            routes![
                routes::start_screen,
                routes::interact,
                routes::interact_on,
                routes::tally,
                routes::voter_status,
                routes::health,
                routes::all_options,
                assets::image,
            ],
        )
        .register(
            "/",
            catchers![
                catchers::bad_request,
                catchers::not_found,
                catchers::unprocessable,
                catchers::internal_error,
                catchers::service_unavailable,
            ],
        )
}
