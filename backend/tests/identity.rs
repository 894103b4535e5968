use std::time::Duration;
use agora_backend::identity::{parse_profile, IdentityError, IdentityResolver, NeynarResolver};
use serde_json::json;
use shared::{Profile, VoterId};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn resolver(server: &MockServer) -> NeynarResolver {
    NeynarResolver::new(format!("{}/v2/farcaster/", server.uri()), "test-key", Duration::from_millis(500)).unwrap()
}

fn bulk_users(users: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "users": users }))
}

#[tokio::test]
async fn resolves_display_name_and_avatar() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/farcaster/user/bulk"))
        .and(query_param("fids", "3"))
        .and(query_param("viewer_fid", "3"))
        .and(header("api_key", "test-key"))
        .respond_with(bulk_users(json!([{
            "fid": 3,
            "username": "dwr",
            "display_name": "Dan Romero",
            "pfp_url": "https://i.imgur.com/dwr.png"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let profile = resolver(&server).resolve(&VoterId::new("3")).await.unwrap();
    assert_eq!(
        profile,
        Profile {
            display_name: "Dan Romero".into(),
            avatar_ref: Some("https://i.imgur.com/dwr.png".into()),
        }
    );
}

#[tokio::test]
async fn webp_avatar_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/farcaster/user/bulk"))
        .respond_with(bulk_users(json!([{
            "username": "alice",
            "display_name": "",
            "pfp_url": "https://cdn.example.com/alice.webp"
        }])))
        .mount(&server)
        .await;

    let profile = resolver(&server).resolve(&VoterId::new("42")).await.unwrap();
    assert_eq!(profile.display_name, "alice");
    assert_eq!(profile.avatar_ref, None);
}

#[tokio::test]
async fn error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve(&VoterId::new("1")).await.unwrap_err();
    assert_eq!(err, IdentityError::Status(500));
}

#[tokio::test]
async fn slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(bulk_users(json!([])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve(&VoterId::new("1")).await.unwrap_err();
    assert_eq!(err, IdentityError::Timeout(Duration::from_millis(500)));
}

#[tokio::test]
async fn unknown_user_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(bulk_users(json!([])))
        .mount(&server)
        .await;

    let err = resolver(&server).resolve(&VoterId::new("999999999")).await.unwrap_err();
    assert!(matches!(err, IdentityError::Malformed(_)));
}

#[test]
fn parse_profile_rejects_bad_bodies() {
    assert!(matches!(parse_profile(b"not json"), Err(IdentityError::Malformed(_))));
    assert!(matches!(parse_profile(br#"{"result": {}}"#), Err(IdentityError::Malformed(_))));
    assert!(matches!(
        parse_profile(br#"{"users": [{"display_name": " ", "username": null}]}"#),
        Err(IdentityError::Malformed(_))
    ));

    let profile = parse_profile(br#"{"users": [{"username": "bob", "pfp_url": "ipfs://x.png"}]}"#).unwrap();
    assert_eq!(profile.display_name, "bob");
    assert_eq!(profile.avatar_ref, None);
}
