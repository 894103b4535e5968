use rocket::{State, get, post, http::Status, serde::json::Json};
use tracing::{debug, instrument, warn};
use shared::flow::Screen;
use shared::models::*;
use shared::tally::Tally;
use shared::validation::require_voter_id;
use crate::{error::ApiError, session::SessionRouter};

pub struct AppState {
    pub router: SessionRouter,
}

impl AppState {
    pub fn new(router: SessionRouter) -> Self {
        Self { router }
    }
}

async fn dispatch(state: &AppState, interaction: Interaction) -> Result<Json<ViewModel>, ApiError> {
    match state.router.handle(&interaction).await {
        Ok(view) => {
            debug!(screen = %view.screen, error = ?view.error, "Rendered view");
            Ok(Json(view))
        }
        Err(rejected) => {
            warn!("Rejected interaction: {}", rejected);
            Err(rejected.into())
        }
    }
}

#[get("/")]
pub async fn start_screen(state: &State<AppState>) -> Result<Json<ViewModel>, ApiError> {
    dispatch(state, InteractionPayload::default().on(Screen::Start)).await
}

#[instrument(skip(state, interaction))]
#[post("/", format = "json", data = "<interaction>")]
pub async fn interact(
    state: &State<AppState>,
    interaction: Json<Interaction>,
) -> Result<Json<ViewModel>, ApiError> {
    dispatch(state, interaction.into_inner()).await
}

#[instrument(skip(state, payload), fields(screen = %screen))]
#[post("/<screen>", format = "json", data = "<payload>")]
pub async fn interact_on(
    state: &State<AppState>,
    screen: Screen,
    payload: Json<InteractionPayload>,
) -> Result<Json<ViewModel>, ApiError> {
    dispatch(state, payload.into_inner().on(screen)).await
}

#[get("/tally")]
pub async fn tally(state: &State<AppState>) -> Result<Json<Tally>, ApiError> {
    Ok(Json(state.router.tally().await?))
}

#[instrument(skip(state))]
#[get("/voters/<voter_id>")]
pub async fn voter_status(state: &State<AppState>, voter_id: &str) -> Result<Json<VoterStatus>, ApiError> {
    let voter_id = VoterId::new(voter_id);
    let voter_id = require_voter_id(Some(&voter_id))
        .map_err(|e| ApiError::InvalidVoterIdentity(e.to_string()))?;
    Ok(Json(state.router.voter_status(voter_id).await?))
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> Result<&'static str, Status> {
    state.router.ping().await.map(|_| "ok").map_err(|e| {
        warn!("Health check failed: {}", e);
        Status::ServiceUnavailable
    })
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}
