use std::collections::HashMap;
use std::sync::Arc;
use agora_backend::{
    build_rocket,
    config::Config,
    identity::{IdentityError, IdentityResolver},
    routes::AppState,
    session::{RouterSettings, SessionRouter},
    store::{BallotStore, MemoryBallotStore},
};
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use shared::{Choice, Profile, Screen, Tally, ViewModel, VoterId, VoterStatus};

const BASE: &str = "/api/agora-voting";

struct NamedResolver;

#[rocket::async_trait]
impl IdentityResolver for NamedResolver {
    async fn resolve(&self, voter_id: &VoterId) -> Result<Profile, IdentityError> {
        Ok(Profile {
            display_name: format!("voter {}", voter_id.as_str()),
            avatar_ref: None,
        })
    }
}

fn config() -> Config {
    let settings: HashMap<&str, &str> = HashMap::from([
        ("NEYNAR_API_KEY", "test-key"),
        ("CORS_ALLOWED_ORIGINS", "https://warpcast.com"),
    ]);
    Config::from_lookup(|key: &str| settings.get(key).map(|v| v.to_string())).unwrap()
}

async fn client_with(store: Arc<MemoryBallotStore>) -> Client {
    let config = config();
    let router = SessionRouter::new(store, Arc::new(NamedResolver), RouterSettings::from(&config));
    Client::tracked(build_rocket(AppState::new(router), &config))
        .await
        .expect("valid rocket instance")
}

async fn client() -> Client {
    client_with(Arc::new(MemoryBallotStore::new())).await
}

async fn post(client: &Client, path: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(format!("{BASE}{path}"))
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, response.into_json().await.unwrap_or(Value::Null))
}

#[rocket::async_test]
async fn start_screen_is_served_at_base_path() {
    let client = client().await;
    let response = client.get(BASE).dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let view: ViewModel = response.into_json().await.unwrap();
    assert_eq!(view.screen, Screen::Start);
    assert_eq!(view.text, "Press the button below to start voting!");
    assert_eq!(view.actions[0].label, "⇧ Lets Get Started!");
}

#[rocket::async_test]
async fn cast_through_path_screen_and_read_tally() {
    let store = Arc::new(MemoryBallotStore::new());
    let client = client_with(store.clone()).await;

    let (status, body) = post(&client, "/voting", json!({ "action": "for", "voterId": 7 })).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["screen"], "voting");
    assert!(body["text"].as_str().unwrap().starts_with("Hi, voter 7"));
    assert!(body["avatarRef"].as_str().unwrap().ends_with("/images/no_avatar.png"));

    let (status, _) = post(&client, "", json!({ "screen": "voting", "action": "against", "voterId": "8" })).await;
    assert_eq!(status, Status::Ok);

    let tally: Tally = client.get(format!("{BASE}/tally")).dispatch().await.into_json().await.unwrap();
    assert_eq!(tally.get(Choice::For), 1);
    assert_eq!(tally.get(Choice::Against), 1);
    assert_eq!(tally.get(Choice::Abstain), 0);
    assert!(store.has_voted(&VoterId::new("7")).await.unwrap());
}

#[rocket::async_test]
async fn results_screen_reports_counts() {
    let client = client().await;
    post(&client, "/voting", json!({ "action": "abstain", "voterId": "u3" })).await;

    let (status, body) = post(&client, "/voting", json!({ "action": "show results", "voterId": "u3" })).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["screen"], "results");
    assert_eq!(body["counts"], json!({ "for": 0, "against": 0, "abstain": 1 }));
    assert!(body["text"].as_str().unwrap().contains("Total vote for abstain is 1"));
}

#[rocket::async_test]
async fn missing_voter_identity_is_rejected() {
    let client = client().await;
    let (status, body) = post(&client, "/voting", json!({ "action": "for" })).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "missingVoterIdentity");

    let (status, body) = post(&client, "/voting", json!({ "action": "for", "voterId": "x".repeat(300) })).await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["code"], "invalidVoterIdentity");
}

#[rocket::async_test]
async fn invalid_choice_renders_error_view() {
    let store = Arc::new(MemoryBallotStore::new());
    let client = client_with(store.clone()).await;

    let (status, body) = post(&client, "/voting", json!({ "action": "maybe", "voterId": "u1" })).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["error"], "invalidChoice");
    assert_eq!(store.ballot_count().unwrap(), 0);
}

#[rocket::async_test]
async fn unknown_screen_is_unprocessable() {
    let client = client().await;
    let (status, body) = post(&client, "/ballot", json!({ "action": "for", "voterId": "u1" })).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["code"], "invalidRequest");
}

#[rocket::async_test]
async fn voter_status_reflects_ballot() {
    let client = client().await;

    let before: VoterStatus = client.get(format!("{BASE}/voters/u9")).dispatch().await.into_json().await.unwrap();
    assert!(!before.has_voted);

    post(&client, "/voting", json!({ "action": "against", "voterId": "u9" })).await;
    let after: VoterStatus = client.get(format!("{BASE}/voters/u9")).dispatch().await.into_json().await.unwrap();
    assert!(after.has_voted);
    assert_eq!(after.choice, Some(Choice::Against));
}

#[rocket::async_test]
async fn fallback_avatar_is_embedded() {
    let client = client().await;
    let response = client.get(format!("{BASE}/images/no_avatar.png")).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(response.content_type(), Some(ContentType::PNG));

    let missing = client.get(format!("{BASE}/images/missing.png")).dispatch().await;
    assert_eq!(missing.status(), Status::NotFound);
    let body: Value = missing.into_json().await.unwrap();
    assert_eq!(body["code"], "notFound");
}

#[rocket::async_test]
async fn health_and_cors() {
    let client = client().await;
    let response = client
        .get(format!("{BASE}/health"))
        .header(Header::new("Origin", "https://warpcast.com"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("https://warpcast.com")
    );
    assert_eq!(response.into_string().await.as_deref(), Some("ok"));

    let foreign = client
        .get(format!("{BASE}/health"))
        .header(Header::new("Origin", "https://evil.example"))
        .dispatch()
        .await;
    assert!(foreign.headers().get_one("Access-Control-Allow-Origin").is_none());
}

