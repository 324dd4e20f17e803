use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info_span};
use uuid::Uuid;
use vizflow_core::{PlanRequest, PlanResponse};
use vizflow_llm::ChatBackend;
use vizflow_llm::planner::{PlannerSettings, plan_workflow};

/// Shared, read-only state behind every request.
pub struct AppState<B> {
    pub backend: B,
    pub settings: PlannerSettings,
}

pub fn router<B: ChatBackend + 'static>(state: AppState<B>) -> Router {
    Router::new()
        .route("/plan", post(plan::<B>))
        .route("/health", get(health::<B>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Always answers 200; failures travel in the body.
async fn plan<B: ChatBackend>(
    State(state): State<Arc<AppState<B>>>,
    Json(request): Json<PlanRequest>,
) -> Json<PlanResponse> {
    let request_id = Uuid::new_v4();
    let response = plan_workflow(&state.backend, &request, &state.settings)
        .instrument(info_span!("plan", %request_id))
        .await;
    Json(response)
}

async fn health<B: ChatBackend>(State(state): State<Arc<AppState<B>>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.settings.model,
        "prompt_style": state.settings.style.as_str(),
    }))
}
