//! API route handlers
//!
//! Runs are blocking, so every handler that drives the orchestrator hands
//! the work to `spawn_blocking` and awaits the report.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use polymath_core::llm::{ProviderInfo, ProviderStatus};
use polymath_core::{Attachment, PolymathError, RunEvent, RunId, RunReport};
use serde::Deserialize;

use crate::state::AppState;

// ========== Errors ==========

/// Failure of an API request, rendered as `{"error": ...}`
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid run ID")]
    InvalidRunId,

    #[error(transparent)]
    Core(#[from] PolymathError),

    #[error("Run task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRunId => StatusCode::BAD_REQUEST,
            ApiError::Core(PolymathError::Config(_) | PolymathError::UnsupportedAttachment(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Core(PolymathError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(PolymathError::RunExists { .. } | PolymathError::RunInProgress { .. }) => {
                StatusCode::CONFLICT
            }
            ApiError::Core(e) if e.is_adapter_failure() => StatusCode::BAD_GATEWAY,
            ApiError::Core(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

fn parse_run_id(id: &str) -> Result<RunId, ApiError> {
    id.parse().map_err(|_| ApiError::InvalidRunId)
}

fn report_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "run_id": report.run_id,
        "answer": report.answer,
        "transcript": report.transcript,
        "steps": report.steps
    })
}

// ========== Answer Routes ==========

#[derive(Deserialize)]
pub struct AnswerRequest {
    question: String,
    #[serde(default)]
    attachment: Option<Attachment>,
    /// Caller-chosen run ID, useful for polling `/api/runs/:id` while waiting
    #[serde(default)]
    run_id: Option<String>,
}

/// Answer a question and return the run report
pub async fn answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = match req.run_id.as_deref() {
        Some(id) => parse_run_id(id)?,
        None => RunId::new(),
    };

    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || {
        service.run_as(run_id, &req.question, req.attachment.as_ref(), None)
    })
    .await??;

    Ok(Json(report_json(&report)))
}

// ========== Run Routes ==========

/// List checkpointed runs, newest first
pub async fn list_runs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let runs: Vec<serde_json::Value> = state
        .service
        .runs()?
        .iter()
        .map(|cp| {
            serde_json::json!({
                "run_id": cp.run_id,
                "question": cp.state.question(),
                "status": cp.status,
                "step": cp.step,
                "next": cp.next,
                "updated_at": cp.updated_at
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "runs": runs })))
}

/// Latest checkpoint of a run
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let run_id = parse_run_id(&id)?;
    let checkpoint = state.service.checkpoint(run_id)?;
    Ok(Json(checkpoint))
}

/// Continue a failed or interrupted run
pub async fn resume_run(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = parse_run_id(&id)?;

    let service = state.service.clone();
    let report = tokio::task::spawn_blocking(move || service.resume(run_id, None)).await??;

    Ok(Json(report_json(&report)))
}

// ========== Provider Routes ==========

fn provider_json(info: &ProviderInfo) -> serde_json::Value {
    let (ready, detail) = match &info.status {
        ProviderStatus::Ready => (true, None),
        ProviderStatus::Unavailable(reason) => (false, Some(reason.as_str())),
    };
    serde_json::json!({
        "id": info.id,
        "name": info.name,
        "model": info.model,
        "role": info.role,
        "active": info.active,
        "ready": ready,
        "detail": detail
    })
}

/// Configured LLM providers, shared instances first, then role overrides
pub async fn list_providers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let service = state.service.clone();
    let providers = tokio::task::spawn_blocking(move || service.providers()).await?;
    let providers: Vec<serde_json::Value> = providers.iter().map(provider_json).collect();

    Ok(Json(serde_json::json!({ "providers": providers })))
}

// ========== WebSocket Handler ==========

#[derive(Deserialize)]
pub struct WsQuestion {
    question: String,
    #[serde(default)]
    attachment: Option<Attachment>,
}

/// WebSocket handler streaming run events
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket connected");

    let _ = sender
        .send(Message::Text(
            serde_json::json!({
                "type": "connected",
                "version": polymath_core::version()
            })
            .to_string(),
        ))
        .await;

    // One run at a time per connection
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                tracing::debug!("Received: {}", text);

                let request = match serde_json::from_str::<WsQuestion>(&text) {
                    Ok(request) => request,
                    Err(e) => {
                        let error = serde_json::json!({
                            "type": "error",
                            "message": format!("Invalid request: {}", e)
                        });
                        let _ = sender.send(Message::Text(error.to_string())).await;
                        continue;
                    }
                };

                if let Err(e) = stream_run(&mut sender, &state, request).await {
                    tracing::warn!("WebSocket send failed: {}", e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("WebSocket closed");
                break;
            }
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
}

/// Run one question, forwarding each event, then send the report or error
async fn stream_run(
    sender: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    request: WsQuestion,
) -> Result<(), axum::Error> {
    let (events_tx, events_rx) = crossbeam_channel::unbounded::<RunEvent>();
    let (forward_tx, mut forward_rx) = tokio::sync::mpsc::unbounded_channel::<RunEvent>();

    let service = state.service.clone();
    let run = tokio::task::spawn_blocking(move || {
        service.run(&request.question, request.attachment.as_ref(), Some(events_tx))
    });

    // The run's sender is dropped when it finishes, which ends this loop
    let bridge = tokio::task::spawn_blocking(move || {
        for event in events_rx {
            if forward_tx.send(event).is_err() {
                break;
            }
        }
    });

    while let Some(event) = forward_rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(text) => sender.send(Message::Text(text)).await?,
            Err(e) => tracing::warn!("Could not serialize event: {}", e),
        }
    }
    let _ = bridge.await;

    let message = match run.await {
        Ok(Ok(report)) => {
            let mut body = report_json(&report);
            body["type"] = serde_json::json!("report");
            body
        }
        Ok(Err(e)) => serde_json::json!({ "type": "error", "message": e.to_string() }),
        Err(e) => serde_json::json!({ "type": "error", "message": format!("Run task failed: {}", e) }),
    };
    sender.send(Message::Text(message.to_string())).await
}
