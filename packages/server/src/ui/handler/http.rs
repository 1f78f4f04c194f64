//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use watchparty_shared::time::now_unix_millis;

use crate::{
    domain::PartyId,
    hub::HubError,
    infrastructure::dto::http::{PartyDetailDto, PartySummaryDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List parties with a live hub
pub async fn get_parties(State(state): State<Arc<AppState>>) -> Json<Vec<PartySummaryDto>> {
    let summaries = state.hubs.summaries().await;
    Json(summaries.iter().map(PartySummaryDto::from).collect())
}

/// Live playback state and roster of one party
pub async fn get_party_detail(
    State(state): State<Arc<AppState>>,
    Path(party_id): Path<String>,
) -> Result<Json<PartyDetailDto>, StatusCode> {
    let party_id = PartyId::try_from(party_id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let summary = state
        .hubs
        .summary(&party_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(PartyDetailDto::from_summary(
        &summary,
        now_unix_millis(),
    )))
}

/// End a party: every connection receives `PARTY_ENDED` and is closed
pub async fn end_party(
    State(state): State<Arc<AppState>>,
    Path(party_id): Path<String>,
) -> StatusCode {
    let Ok(party_id) = PartyId::try_from(party_id) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.hubs.end_party(&party_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(HubError::PartyNotFound(_)) => StatusCode::NOT_FOUND,
        Err(e) => {
            tracing::error!("Failed to end party '{}': {}", party_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
