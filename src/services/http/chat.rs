use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::{receive_failed, send_failed, service_error, AppState};
use crate::services::chat::ChatRequest;

#[derive(Clone, Debug, Deserialize)]
pub struct SendMessageForm {
    #[serde(default)]
    pub content: String,
    pub user_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PollQuery {
    pub known: Option<usize>,
}

pub async fn new_session(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (chat_tx, chat_rx) = oneshot::channel();
    let send_result = state
        .chat_channel
        .send(ChatRequest::NewSession { response: chat_tx })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match chat_rx.await {
        Ok(Ok(chat_id)) => (StatusCode::CREATED, Json(json!({ "chat_id": chat_id }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn open(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let (chat_tx, chat_rx) = oneshot::channel();
    let send_result = state
        .chat_channel
        .send(ChatRequest::Open {
            chat_id,
            response: chat_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match chat_rx.await {
        Ok(Ok(messages)) => (StatusCode::OK, Json(json!({ "messages": messages }))),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn send(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(form): Json<SendMessageForm>,
) -> (StatusCode, Json<Value>) {
    let (chat_tx, chat_rx) = oneshot::channel();
    let send_result = state
        .chat_channel
        .send(ChatRequest::Send {
            chat_id,
            user_name: form.user_name.unwrap_or_else(|| "Guest User".to_string()),
            content: form.content,
            response: chat_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match chat_rx.await {
        // A whitespace-only message is a no-op, not an error.
        Ok(Ok(None)) => (StatusCode::OK, Json(json!({ "sent": false }))),
        Ok(Ok(Some(message))) => (
            StatusCode::CREATED,
            Json(json!({ "sent": true, "message": message })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}

pub async fn poll(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(query): Query<PollQuery>,
) -> (StatusCode, Json<Value>) {
    let (chat_tx, chat_rx) = oneshot::channel();
    let send_result = state
        .chat_channel
        .send(ChatRequest::Poll {
            chat_id,
            known_count: query.known.unwrap_or(0),
            response: chat_tx,
        })
        .await;
    if let Err(e) = send_result {
        return send_failed(e);
    }

    match chat_rx.await {
        Ok(Ok((messages, unread))) => (
            StatusCode::OK,
            Json(json!({ "messages": messages, "unread": unread })),
        ),
        Ok(Err(error)) => service_error(error),
        Err(e) => receive_failed(e),
    }
}
