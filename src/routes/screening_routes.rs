use crate::dto::screening_dto::{
    BulkScreenPayload, BulkScreeningAccepted, MinScoreParams, ScreenParams, ScreeningAccepted,
};
use crate::error::{Error, Result};
use crate::services::screening_pool::ScreeningJob;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Synchronous screening: the caller waits for the analysis (or its
/// fallback) and gets the stored record back.
pub async fn screen_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(params): Query<ScreenParams>,
) -> Result<impl IntoResponse> {
    let screening = state
        .screening_service
        .screen_candidate(candidate_id, params.job_description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(screening)))
}

/// Fire-and-forget screening. The existence and resume checks run up front
/// so the caller still gets a 404/400; the analysis itself happens on the
/// pool.
pub async fn screen_candidate_async(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
    Query(params): Query<ScreenParams>,
) -> Result<impl IntoResponse> {
    let candidate = state.candidate_service.get_candidate(candidate_id).await?;
    if candidate
        .resume_path
        .as_deref()
        .map(str::is_empty)
        .unwrap_or(true)
    {
        return Err(Error::Validation(
            "Candidate has no resume uploaded".to_string(),
        ));
    }

    state
        .screening_pool
        .submit(ScreeningJob {
            candidate_id,
            job_description: params.job_description,
        })
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ScreeningAccepted {
            candidate_id,
            status: "PROCESSING",
        }),
    ))
}

/// Bulk fire-and-forget. Returns immediately with a count; individual
/// failures only surface in the screening history.
pub async fn bulk_screen(
    State(state): State<AppState>,
    Json(payload): Json<BulkScreenPayload>,
) -> Result<impl IntoResponse> {
    if payload.candidate_ids.is_empty() {
        return Err(Error::Validation(
            "candidateIds must not be empty".to_string(),
        ));
    }

    let total_candidates = payload.candidate_ids.len();
    for candidate_id in payload.candidate_ids {
        state
            .screening_pool
            .submit(ScreeningJob {
                candidate_id,
                job_description: payload.job_description.clone(),
            })
            .await;
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(BulkScreeningAccepted {
            total_candidates,
            status: "PROCESSING",
        }),
    ))
}

pub async fn get_screening(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let screening = state.screening_service.get_screening(id).await?;
    Ok(Json(screening))
}

pub async fn screenings_for_candidate(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let screenings = state
        .screening_service
        .screenings_for_candidate(candidate_id)
        .await?;
    Ok(Json(screenings))
}

pub async fn latest_screening(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let screening = state
        .screening_service
        .latest_for_candidate(candidate_id)
        .await?;
    Ok(Json(screening))
}

pub async fn high_scores(
    State(state): State<AppState>,
    Query(params): Query<MinScoreParams>,
) -> Result<impl IntoResponse> {
    let screenings = state
        .screening_service
        .screenings_above(params.min_score)
        .await?;
    Ok(Json(screenings))
}
