use crate::dto::candidate_dto::{
    CandidateSearchParams, CreateCandidatePayload, UpdateCandidatePayload, UpdateStageParams,
};
use crate::dto::page::PageParams;
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// Multipart create: text fields `name`, `email`, `phone` plus an optional
/// `resume` file that lands in the blob store before the row is written.
pub async fn create_candidate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut payload = CreateCandidatePayload::default();
    let mut resume: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => payload.name = field.text().await?,
            "email" => payload.email = field.text().await?,
            "phone" => {
                let phone = field.text().await?;
                if !phone.is_empty() {
                    payload.phone = Some(phone);
                }
            }
            "resume" => {
                let filename = field.file_name().unwrap_or("resume.bin").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    resume = Some((filename, data));
                }
            }
            _ => {}
        }
    }

    payload.validate()?;

    let resume_path = match resume {
        Some((filename, data)) => Some(state.resume_service.save_resume(&filename, &data).await?),
        None => None,
    };

    let candidate = state
        .candidate_service
        .create_candidate(payload.name, payload.email, payload.phone, resume_path)
        .await?;

    Ok((StatusCode::CREATED, Json(candidate)))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get_candidate(id).await?;
    Ok(Json(candidate))
}

pub async fn get_candidate_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get_by_email(&email).await?;
    Ok(Json(candidate))
}

pub async fn list_candidates(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse> {
    let page = state.candidate_service.list_candidates(&params).await?;
    Ok(Json(page))
}

pub async fn search_candidates(
    State(state): State<AppState>,
    Query(filter): Query<CandidateSearchParams>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse> {
    let page = state
        .candidate_service
        .search_candidates(
            filter.name.as_deref(),
            filter.email.as_deref(),
            filter.stage,
            &params,
        )
        .await?;
    Ok(Json(page))
}

pub async fn update_candidate_stage(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UpdateStageParams>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .candidate_service
        .update_stage(id, params.new_stage, &params.changed_by, params.reason.as_deref())
        .await?;
    Ok(Json(candidate))
}

pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCandidatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let candidate = state
        .candidate_service
        .update_profile(id, payload.name, payload.phone)
        .await?;
    Ok(Json(candidate))
}

pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.candidate_service.delete_candidate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn candidates_without_screening(
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.candidates_without_screening().await?;
    Ok(Json(candidates))
}
