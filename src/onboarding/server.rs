// SPDX-License-Identifier: MIT

//! HTTP transport for the supervisor

use crate::onboarding::error::OnboardingError;
use crate::onboarding::events::SessionEvent;
use crate::onboarding::session::{Session, SessionSummary, TurnResult};
use crate::onboarding::store::StoreError;
use crate::onboarding::supervisor::Supervisor;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn router(supervisor: Arc<Supervisor>) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/onboarding/turn", post(process_turn))
        .route("/api/onboarding/sessions", get(list_sessions))
        .route("/api/onboarding/sessions/{id}", get(get_session))
        .with_state(supervisor)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    supervisor: Arc<Supervisor>,
    host: &str,
    port: u16,
) -> Result<(), OnboardingError> {
    tokio::spawn(log_events(supervisor.subscribe()));
    let app = router(supervisor);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn log_events(mut rx: broadcast::Receiver<SessionEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => log::info!("Session event: {}", json),
                Err(e) => log::warn!("Could not encode session event: {}", e),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                log::warn!("Event log lagged behind by {} events", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

struct ApiError(OnboardingError);

impl From<OnboardingError> for ApiError {
    fn from(err: OnboardingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            OnboardingError::UnknownSession(_) => StatusCode::NOT_FOUND,
            OnboardingError::Store(StoreError::InvalidSessionId(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct TurnRequest {
    #[serde(default)]
    session_id: Option<String>,
    message: String,
}

async fn process_turn(
    State(supervisor): State<Arc<Supervisor>>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnResult>, ApiError> {
    let result = supervisor
        .process_turn(payload.session_id.as_deref(), &payload.message)
        .await?;
    Ok(Json(result))
}

async fn list_sessions(
    State(supervisor): State<Arc<Supervisor>>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(supervisor.list_sessions().await?))
}

async fn get_session(
    State(supervisor): State<Arc<Supervisor>>,
    Path(id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(supervisor.get_session(&id).await?))
}
