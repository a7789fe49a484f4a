//! Identity wrapper against an in-process stub of the external provider.

use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use mxtm_platform::repositories::identity::{AuthError, IdentityApi};

fn provider_error(code: &str) -> Json<Value> {
    Json(json!({ "error": { "code": code } }))
}

fn provider_session(uid: &str) -> Json<Value> {
    Json(json!({ "session": { "uid": uid, "token": format!("token-{}", uid) } }))
}

async fn create_account(Json(body): Json<Value>) -> Json<Value> {
    match body["email"].as_str() {
        Some("taken@example.com") => provider_error("auth/email-already-in-use"),
        Some("bad-email") => provider_error("auth/invalid-email"),
        _ if body["password"].as_str().map(str::len).unwrap_or(0) < 6 => {
            provider_error("auth/weak-password")
        }
        _ => provider_session("uid-new"),
    }
}

async fn create_session(Json(body): Json<Value>) -> Json<Value> {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("ghost@example.com"), _) => provider_error("auth/user-not-found"),
        (Some(_), Some("correct1")) => provider_session("uid-known"),
        _ => provider_error("auth/wrong-password"),
    }
}

async fn ok_body() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn start_stub() -> String {
    let app = Router::new()
        .route("/v1/accounts", post(create_account))
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/revoke", post(ok_body))
        .route("/v1/accounts/reset-password", post(ok_body))
        .route("/v1/accounts/change-password", post(ok_body));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn api(url: String) -> IdentityApi {
    IdentityApi::new("test-key".to_string(), url)
}

#[tokio::test]
async fn register_returns_a_session_for_a_new_account() {
    let api = api(start_stub().await);

    let session = api.register("fresh@example.com", "secret1").await.unwrap();
    assert_eq!(session.uid, "uid-new");
    assert_eq!(session.token, "token-uid-new");
}

#[tokio::test]
async fn register_maps_duplicate_email_to_its_message() {
    let api = api(start_stub().await);

    let err = api.register("taken@example.com", "secret1").await.unwrap_err();
    assert_eq!(err, AuthError::DuplicateEmail);
    assert_eq!(err.to_string(), "Email is already registered");
}

#[tokio::test]
async fn register_maps_weak_password_and_invalid_email() {
    let api = api(start_stub().await);

    assert_eq!(
        api.register("fresh@example.com", "123").await.unwrap_err(),
        AuthError::WeakPassword
    );
    assert_eq!(
        api.register("bad-email", "secret1").await.unwrap_err(),
        AuthError::InvalidEmail
    );
}

#[tokio::test]
async fn sign_in_maps_wrong_password_and_unknown_user() {
    let api = api(start_stub().await);

    assert_eq!(
        api.sign_in("ana@example.com", "nope").await.unwrap_err(),
        AuthError::WrongPassword
    );
    assert_eq!(
        api.sign_in("ghost@example.com", "correct1").await.unwrap_err(),
        AuthError::UserNotFound
    );

    let session = api.sign_in("ana@example.com", "correct1").await.unwrap();
    assert_eq!(session.uid, "uid-known");
}

#[tokio::test]
async fn change_password_requires_reproof_of_the_current_credential() {
    let api = api(start_stub().await);

    // Wrong current password never reaches the change endpoint.
    assert_eq!(
        api.change_password("ana@example.com", "nope", "newsecret1")
            .await
            .unwrap_err(),
        AuthError::WrongPassword
    );

    api.change_password("ana@example.com", "correct1", "newsecret1")
        .await
        .unwrap();
}

#[tokio::test]
async fn unreachable_provider_maps_to_the_network_message() {
    // Nothing listens here.
    let api = api("http://127.0.0.1:9".to_string());

    let err = api.sign_in("ana@example.com", "correct1").await.unwrap_err();
    assert_eq!(err, AuthError::Network);
    assert_eq!(
        err.to_string(),
        "Network error. Please check your connection"
    );
}
