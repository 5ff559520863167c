use axum::{
    extract::{Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::AppError;
use crate::models::{ApiResponse, ParlaySuggestion};
use crate::services::BANKROLL_DISCLAIMER;
use crate::session::{Dashboard, SessionState};

pub async fn serve(dashboard: Dashboard, port: u16) -> anyhow::Result<()> {
    let app = create_router(Arc::new(dashboard));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("ParlayPro API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session_handler))
        .route("/matches/refresh", post(refresh_matches_handler))
        .route("/predictions/analyze", post(analyze_handler))
        .route("/parlay", get(get_parlay_handler))
        .route("/disclaimer", get(disclaimer_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(dashboard)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("ParlayPro API is running"))
}

// GET /session - current snapshot: phase, matches, predictions, configuration error
async fn get_session_handler(State(dashboard): State<Arc<Dashboard>>) -> Json<ApiResponse<SessionState>> {
    Json(ApiResponse::success(dashboard.snapshot().await))
}

// POST /matches/refresh - fetch a new fixture batch
async fn refresh_matches_handler(
    State(dashboard): State<Arc<Dashboard>>,
) -> Result<Json<ApiResponse<SessionState>>, AppError> {
    let state = dashboard.refresh().await.map_err(|e| {
        tracing::error!("Refresh refused: {}", e);
        e
    })?;
    Ok(Json(ApiResponse::success(state)))
}

// POST /predictions/analyze - score the loaded batch
async fn analyze_handler(
    State(dashboard): State<Arc<Dashboard>>,
) -> Result<Json<ApiResponse<SessionState>>, AppError> {
    let state = dashboard.analyze().await.map_err(|e| {
        tracing::warn!("Analysis refused: {}", e);
        e
    })?;
    Ok(Json(ApiResponse::success(state)))
}

// GET /parlay - auto-built parlay for the current predictions
#[derive(Deserialize)]
struct ParlayQuery {
    legs: Option<usize>,
    stake: Option<f64>,
}

async fn get_parlay_handler(
    State(dashboard): State<Arc<Dashboard>>,
    Query(params): Query<ParlayQuery>,
) -> Result<Json<ApiResponse<Option<ParlaySuggestion>>>, AppError> {
    let parlay = match (params.legs, params.stake) {
        (None, None) => dashboard.parlay().await,
        (legs, stake) => {
            let stake = stake.unwrap_or(crate::config::DEFAULT_STAKE);
            if !stake.is_finite() || stake <= 0.0 {
                return Err(AppError::BadRequest("stake must be a positive number".to_string()));
            }
            let legs = legs.unwrap_or(crate::config::DEFAULT_LEG_COUNT).min(10); // Cap at 10
            dashboard.parlay_with(legs, stake).await
        }
    };
    Ok(Json(ApiResponse::success(parlay)))
}

async fn disclaimer_handler() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success(BANKROLL_DISCLAIMER))
}
