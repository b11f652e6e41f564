//! Polymath Server Library
//!
//! Provides the HTTP/WebSocket surface over the question-answering service.

pub mod routes;
pub mod state;

use axum::{
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Once;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use state::AppState;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber (only once)
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| {
                    "polymath_server=debug,polymath_core=info,tower_http=debug".into()
                }),
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

/// Build the Axum router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/answer", post(routes::answer))
        .route("/api/runs", get(routes::list_runs))
        .route("/api/runs/:id", get(routes::get_run))
        .route("/api/runs/:id/resume", post(routes::resume_run))
        .route("/api/providers", get(routes::list_providers))
        .route("/api/ws", get(routes::websocket_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the Polymath web server on the specified port
pub async fn run_server(port: u16) -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Polymath Server...");

    let cwd = std::env::current_dir()?;
    let config = match polymath_core::load_config(&cwd) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Falling back to default configuration: {}", e);
            polymath_core::PolymathConfig::default()
        }
    };

    serve(AppState::from_config(&config)?, port).await
}

/// Serve an already-built state
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/api/ws", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": polymath_core::version()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use polymath_core::orchestration::{AdapterResponse, CapabilityAdapter, Invocation};
    use polymath_core::{Orchestrator, QuestionAnswering, Role, ToolRegistry};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Answers "4" for every question
    struct Arithmetic;

    impl CapabilityAdapter for Arithmetic {
        fn invoke(&self, invocation: &Invocation<'_>) -> polymath_core::Result<AdapterResponse> {
            let output = match invocation.role {
                Role::Router => r#"{"expert_agent": "reasoner", "agent_input": "add"}"#,
                Role::Verifier => "The answer is correct.",
                _ => "4",
            };
            Ok(AdapterResponse {
                output: output.to_string(),
                raw: serde_json::Value::Null,
            })
        }
    }

    fn app() -> Router {
        let orchestrator = Orchestrator::new(Arc::new(Arithmetic), ToolRegistry::empty());
        build_router(AppState::new(QuestionAnswering::new(orchestrator)))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(app(), Request::get("/api/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_answer_then_fetch_run() {
        let app = app();
        let (status, body) = send(
            app.clone(),
            post_json("/api/answer", serde_json::json!({ "question": "What is 2+2?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "4");
        assert_eq!(body["steps"], 5);

        let run_id = body["run_id"].as_str().unwrap().to_string();
        let (status, checkpoint) = send(
            app,
            Request::get(format!("/api/runs/{}", run_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checkpoint["status"]["status"], "completed");
        assert_eq!(checkpoint["state"]["final_answer"], "4");
    }

    #[tokio::test]
    async fn test_reused_run_id_is_conflict() {
        let app = app();
        let run_id = polymath_core::RunId::new().to_string();
        let request = serde_json::json!({ "question": "What is 2+2?", "run_id": run_id });

        let (status, _) = send(app.clone(), post_json("/api/answer", request.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app.clone(), post_json("/api/answer", request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].as_str().unwrap().contains("already exists"));

        let (status, checkpoint) = send(
            app,
            Request::get(format!("/api/runs/{}", run_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checkpoint["status"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_providers_without_registry() {
        let (status, body) = send(app(), Request::get("/api/providers").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["providers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_providers_from_config() {
        let mut config = polymath_core::PolymathConfig::default();
        config.llm.default_provider = "openai".to_string();
        for (id, provider) in config.llm.providers.iter_mut() {
            provider.enabled = id == "openai";
            provider.api_key = None;
        }
        let app = build_router(AppState::from_config(&config).unwrap());

        let (status, body) = send(app, Request::get("/api/providers").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["providers"],
            serde_json::json!([{
                "id": "openai",
                "name": "OpenAI",
                "model": "gpt-4o",
                "role": null,
                "active": true,
                "ready": false,
                "detail": "No API key configured"
            }])
        );
    }

    #[tokio::test]
    async fn test_empty_question_is_bad_request() {
        let (status, body) = send(
            app(),
            post_json("/api/answer", serde_json::json!({ "question": "  " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("question"));
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_runs() {
        let (status, _) = send(
            app(),
            Request::get(format!("/api/runs/{}", polymath_core::RunId::new()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            app(),
            Request::post("/api/runs/not-a-uuid/resume")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid run ID");
    }
}
