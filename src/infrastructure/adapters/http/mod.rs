//! HTTP adapter - JSON command surface for external senders

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::application::errors::BotError;
use crate::application::services::RelayBridge;
use crate::domain::entities::{AlertmanagerMessage, MessageId};
use crate::infrastructure::storage::{AddressBook, GroupDirectory};

/// Body accepted by `/send` and `/sendGroup`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JsonMessage {
    pub to: String,
    pub msg: String,
}

/// Shared handler state
#[derive(Clone)]
pub struct HttpState {
    pub own_id: String,
    pub bridge: Arc<RelayBridge>,
    pub contacts: Arc<AddressBook>,
    pub groups: Arc<GroupDirectory>,
}

/// Build the router with every relay endpoint
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/send", post(send_handler))
        .route("/sendGroup", post(send_group_handler))
        .route("/alertmanager/:to", post(alertmanager_handler))
        .with_state(state)
}

/// Serve the relay endpoints on `listener` until the server fails
pub async fn serve(listener: TcpListener, state: HttpState) -> Result<(), BotError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Starting json receiver on {}", addr);
    }
    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}

/// Build a standard JSON error response.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

fn status_for(error: &BotError) -> StatusCode {
    match error {
        BotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        BotError::NotFound(_) => StatusCode::NOT_FOUND,
        BotError::Lookup { .. } | BotError::Network(_) => StatusCode::BAD_GATEWAY,
        BotError::ChannelClosed | BotError::Session(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn relay_response(result: Result<MessageId, BotError>) -> Response {
    match result {
        Ok(id) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "queued", "id": format!("{:016x}", id) })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Relay request failed: {}", e);
            api_error(status_for(&e), e.to_string())
        }
    }
}

pub async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "ok",
        "identity": state.own_id,
        "contacts": state.contacts.len().await,
        "groups": state.groups.len().await,
    });
    (StatusCode::OK, Json(body))
}

pub async fn send_handler(State(state): State<HttpState>, Json(req): Json<JsonMessage>) -> Response {
    tracing::debug!("POST /send {:?}", req);
    relay_response(state.bridge.relay_direct(&req.to, &req.msg).await)
}

pub async fn send_group_handler(
    State(state): State<HttpState>,
    Json(req): Json<JsonMessage>,
) -> Response {
    tracing::debug!("POST /sendGroup {:?}", req);
    relay_response(state.bridge.relay_group(&req.to, &req.msg).await)
}

pub async fn alertmanager_handler(
    State(state): State<HttpState>,
    Path(to): Path<String>,
    Json(alerts): Json<AlertmanagerMessage>,
) -> Response {
    tracing::debug!(
        "POST /alertmanager/{} receiver={} alerts={}",
        to,
        alerts.receiver,
        alerts.alerts.len()
    );
    relay_response(state.bridge.relay_direct(&to, &alerts.render()).await)
}
