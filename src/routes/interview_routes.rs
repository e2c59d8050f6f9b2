use crate::dto::interview_dto::{
    CancelParams, DateRangeParams, ReschedulePayload, SchedulePayload, UpdateStatusParams,
};
use crate::error::Result;
use crate::models::interview::InterviewStatus;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

pub async fn schedule_interview(
    State(state): State<AppState>,
    Json(payload): Json<SchedulePayload>,
) -> Result<impl IntoResponse> {
    let interview = state
        .schedule_service
        .schedule(
            payload.candidate_id,
            payload.interviewer_id,
            payload.scheduled_at,
            payload.duration_minutes,
            payload.interview_type,
            payload.location,
            payload.notes,
            &payload.scheduled_by,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

pub async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get_interview(id).await?;
    Ok(Json(interview))
}

pub async fn update_interview_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UpdateStatusParams>,
) -> Result<impl IntoResponse> {
    let interview = state
        .interview_service
        .update_status(id, params.new_status, &params.changed_by, params.notes.as_deref())
        .await?;
    Ok(Json(interview))
}

pub async fn reschedule_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReschedulePayload>,
) -> Result<impl IntoResponse> {
    let interview = state
        .schedule_service
        .reschedule(
            id,
            params.new_scheduled_at,
            params.new_duration,
            &params.rescheduled_by,
            params.reason.as_deref(),
        )
        .await?;
    Ok(Json(interview))
}

pub async fn cancel_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CancelParams>,
) -> Result<impl IntoResponse> {
    let interview = state
        .schedule_service
        .cancel(id, &params.cancelled_by, params.reason.as_deref())
        .await?;
    Ok(Json(interview))
}

pub async fn interviews_for_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interviews = state
        .interview_service
        .interviews_for_candidate(candidate_id)
        .await?;
    Ok(Json(interviews))
}

pub async fn upcoming_for_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interviews = state
        .interview_service
        .upcoming_for_candidate(candidate_id)
        .await?;
    Ok(Json(interviews))
}

pub async fn interviews_for_interviewer(
    State(state): State<AppState>,
    Path(interviewer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interviews = state
        .interview_service
        .interviews_for_interviewer(interviewer_id)
        .await?;
    Ok(Json(interviews))
}

pub async fn todays_interviews(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let interviews = state.interview_service.todays_interviews().await?;
    Ok(Json(interviews))
}

pub async fn interviews_in_range(
    State(state): State<AppState>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse> {
    let interviews = state
        .interview_service
        .interviews_in_range(params.start, params.end)
        .await?;
    Ok(Json(interviews))
}

pub async fn interviews_by_status(
    State(state): State<AppState>,
    Path(status): Path<InterviewStatus>,
) -> Result<impl IntoResponse> {
    let interviews = state.interview_service.interviews_by_status(status).await?;
    Ok(Json(interviews))
}

pub async fn pending_feedback(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let interviews = state.interview_service.completed_without_feedback().await?;
    Ok(Json(interviews))
}

pub async fn overdue_interviews(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let interviews = state.interview_service.overdue_interviews().await?;
    Ok(Json(interviews))
}
