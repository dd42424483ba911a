//! API routes for the insights server

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::server::state::AppState;
use crate::storage::InsightRow;
use crate::types::PipelineOutcome;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(process_document))
        .route("/insights", get(recent_insights))
}

/// Request body for POST /api/process
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    /// Location id from the configuration
    pub location_id: String,
    /// List item id of the agenda document
    pub item_id: String,
}

/// POST /api/process - run the pipeline for one document
///
/// Always answers 200: the outcome payload carries success or the
/// failing stage, since the pipeline folds its own errors.
pub async fn process_document(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Json<PipelineOutcome> {
    tracing::info!(
        location_id = %request.location_id,
        item_id = %request.item_id,
        "Process request received"
    );

    let outcome = state
        .processor()
        .process_document(&request.location_id, &request.item_id)
        .await;

    Json(outcome)
}

#[derive(Debug, Deserialize)]
pub struct InsightsQuery {
    /// Maximum rows to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for GET /api/insights
#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<InsightRow>,
    pub count: usize,
}

/// GET /api/insights - most recently persisted records
pub async fn recent_insights(
    State(state): State<AppState>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<InsightsResponse>> {
    let insights = state.db().recent_insights(query.limit)?;
    let count = insights.len();
    Ok(Json(InsightsResponse { insights, count }))
}
