use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use estimo_calculator::{CalculatorConfig, GroupInfo};
use estimo_core::PriceTier;
use tracing::info;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::types::{HealthResponse, ListCalculatorsQuery, RunPipelineRequest, RunPipelineResponse};

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        calculators: state.registry.len(),
        uptime_seconds: state.uptime().as_secs(),
    })
}

pub async fn run_pipeline(
    State(state): State<AppState>,
    payload: Result<Json<RunPipelineRequest>, JsonRejection>,
) -> ApiResult<Json<RunPipelineResponse>> {
    let Json(request) = payload?;
    request.validate(&state.config.limits)?;
    info!(
        targets = request.target_ids.len(),
        stages = request.sequence.len(),
        mode = ?request.mode,
        "Received pipeline run request"
    );

    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.run(&request)).await?;
    Ok(Json(response))
}

pub async fn list_calculators(
    State(state): State<AppState>,
    Query(query): Query<ListCalculatorsQuery>,
) -> Response {
    Json(state.registry.list_calculators(query.include_system)).into_response()
}

pub async fn get_calculator(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<CalculatorConfig>> {
    state
        .registry
        .get_calculator_config(&code)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("calculator '{code}'")))
}

pub async fn list_groups(State(state): State<AppState>) -> Json<Vec<GroupInfo>> {
    Json(state.registry.list_groups())
}

pub async fn list_grouped_calculators(State(state): State<AppState>) -> Response {
    Json(state.registry.get_grouped_list()).into_response()
}

pub async fn list_price_tiers(State(state): State<AppState>) -> ApiResult<Json<Vec<PriceTier>>> {
    Ok(Json(state.tiers.list_tiers()?))
}
