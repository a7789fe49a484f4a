use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::accounts::AccountRequest;
use super::chat::ChatRequest;
use super::ledger::LedgerRequest;
use super::{ServiceError, Session, SessionMap};

mod accounts;
mod chat;
mod ledger;

#[derive(Clone)]
pub struct AppState {
    account_channel: mpsc::Sender<AccountRequest>,
    ledger_channel: mpsc::Sender<LedgerRequest>,
    chat_channel: mpsc::Sender<ChatRequest>,
    sessions: SessionMap,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn session_for(state: &AppState, headers: &HeaderMap) -> Option<(String, Session)> {
    let token = bearer_token(headers)?;
    let session = state.sessions.get(&token)?.clone();
    Some((token, session))
}

fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(String, Session), (StatusCode, Json<Value>)> {
    session_for(state, headers).ok_or((
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Not authenticated" })),
    ))
}

fn send_failed(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": format!("Failed to process request: {}", e) })),
    )
}

fn receive_failed(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": format!("Failed to receive response: {}", e) })),
    )
}

fn service_error(error: ServiceError) -> (StatusCode, Json<Value>) {
    match error {
        ServiceError::Auth(auth) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": auth.to_string() })),
        ),
        ServiceError::ProfileNotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": error.to_string() })),
        ),
        other => {
            log::error!("Request failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "An error occurred. Please try again" })),
            )
        }
    }
}

pub async fn start_http_server(
    listen: &str,
    account_channel: mpsc::Sender<AccountRequest>,
    ledger_channel: mpsc::Sender<LedgerRequest>,
    chat_channel: mpsc::Sender<ChatRequest>,
    sessions: SessionMap,
) -> Result<(), anyhow::Error> {
    let app_state = AppState {
        account_channel,
        ledger_channel,
        chat_channel,
        sessions,
    };

    let app = Router::new()
        .route("/api/register", post(accounts::register))
        .route("/api/login", post(accounts::login))
        .route("/api/logout", post(accounts::logout))
        .route("/api/me", get(accounts::me))
        .route("/api/profile", put(accounts::update_profile))
        .route("/api/password/reset", post(accounts::reset_password))
        .route("/api/password/change", post(accounts::change_password))
        .route("/api/deposit", post(ledger::deposit))
        .route("/api/withdraw", post(ledger::withdraw))
        .route(
            "/api/investments",
            post(ledger::create_investment).get(ledger::list_investments),
        )
        .route("/api/transactions", get(ledger::list_transactions))
        .route("/api/dashboard", get(ledger::dashboard))
        .route("/api/chat/session", post(chat::new_session))
        .route(
            "/api/chat/{chat_id}/messages",
            get(chat::open).post(chat::send),
        )
        .route("/api/chat/{chat_id}/poll", get(chat::poll))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(listen).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
