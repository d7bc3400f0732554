//! HTTP surface: router, shared state and error rendering.

pub mod handlers;

use crate::adapters::{OpenAiClient, ScryfallClient, VisionClient};
use crate::config::ServiceConfig;
use crate::core::identify::IdentifyService;
use crate::core::worker_pool::ResolutionPool;
use crate::utils::error::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IdentifyService>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: IdentifyService) -> Self {
        Self {
            service: Arc::new(service),
            started_at: Utc::now(),
        }
    }

    /// 依配置建立三個外部服務的 client 與查詢池
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let ocr = VisionClient::from_config(&config.ocr)?;
        let structuring = OpenAiClient::from_config(&config.structuring)?;
        let lookup = ScryfallClient::from_config(&config.lookup)?;

        let pool = ResolutionPool::new(Arc::new(lookup), config.lookup.pool_settings());
        let service = IdentifyService::new(Arc::new(ocr), Arc::new(structuring), pool);

        Ok(Self::new(service))
    }
}

/// Routes are served at the root and under `/api`.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let routes = Router::new()
        .route("/identify-cards", post(handlers::identify_cards))
        .route("/health", get(handlers::health));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("❌ Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Internal server error." })),
    )
        .into_response()
}
