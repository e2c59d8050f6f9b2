use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub days: Option<i64>,
}

/// Full stage journey for one candidate, oldest first.
pub async fn candidate_history(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.candidate_service.get_candidate(candidate_id).await?;
    let history = state.audit_service.stage_history(candidate_id).await?;
    Ok(Json(history))
}

pub async fn interview_history(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.interview_service.get_interview(interview_id).await?;
    let history = state.audit_service.status_history(interview_id).await?;
    Ok(Json(history))
}

/// Stage changes across all candidates in the last `days` (default 7).
pub async fn recent_stage_changes(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<impl IntoResponse> {
    let days = params.days.unwrap_or(7).max(0);
    let since = Utc::now() - Duration::days(days);
    let activity = state.audit_service.recent_stage_changes(since).await?;
    Ok(Json(activity))
}

/// Average days candidates spend in each stage.
pub async fn time_in_stage(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let durations = state.audit_service.average_time_in_stage().await?;
    Ok(Json(durations))
}
