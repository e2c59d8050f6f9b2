use crate::dto::interviewer_dto::{
    AvailabilityParams, CreateInterviewerPayload, ExpertiseParams, UpdateInterviewerPayload,
};
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

pub async fn create_interviewer(
    State(state): State<AppState>,
    Json(payload): Json<CreateInterviewerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let interviewer = state
        .interviewer_service
        .create_interviewer(
            payload.name,
            payload.email,
            payload.department,
            payload.title,
            payload.expertise,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(interviewer)))
}

pub async fn get_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interviewer = state.interviewer_service.get_interviewer(id).await?;
    Ok(Json(interviewer))
}

pub async fn get_interviewer_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let interviewer = state.interviewer_service.get_by_email(&email).await?;
    Ok(Json(interviewer))
}

pub async fn list_interviewers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let interviewers = state.interviewer_service.list_interviewers().await?;
    Ok(Json(interviewers))
}

pub async fn list_by_department(
    State(state): State<AppState>,
    Path(department): Path<String>,
) -> Result<impl IntoResponse> {
    let interviewers = state
        .interviewer_service
        .list_by_department(&department)
        .await?;
    Ok(Json(interviewers))
}

pub async fn search_by_expertise(
    State(state): State<AppState>,
    Query(params): Query<ExpertiseParams>,
) -> Result<impl IntoResponse> {
    let interviewers = state
        .interviewer_service
        .search_by_expertise(&params.skill)
        .await?;
    Ok(Json(interviewers))
}

pub async fn update_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInterviewerPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let interviewer = state
        .interviewer_service
        .update_interviewer(
            id,
            payload.name,
            payload.department,
            payload.title,
            payload.expertise,
        )
        .await?;
    Ok(Json(interviewer))
}

pub async fn archive_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let interviewer = state.interviewer_service.archive_interviewer(id).await?;
    Ok(Json(interviewer))
}

pub async fn delete_interviewer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.interviewer_service.delete_interviewer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Interviewers free in the given window.
pub async fn find_available(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<impl IntoResponse> {
    let interviewers = state
        .interviewer_service
        .find_available(params.start, params.end)
        .await?;
    Ok(Json(interviewers))
}

pub async fn is_available(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<impl IntoResponse> {
    let available = state
        .interviewer_service
        .is_available(id, params.start, params.end)
        .await?;
    Ok(Json(json!({ "interviewerId": id, "available": available })))
}
