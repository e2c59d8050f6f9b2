use crate::dto::feedback_dto::{FeedbackResponse, SubmitFeedbackPayload};
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(payload): Json<SubmitFeedbackPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let feedback = state
        .feedback_service
        .submit_feedback(
            payload.interview_id,
            payload.interviewer_id,
            payload.technical_score,
            payload.communication_score,
            payload.problem_solving_score,
            payload.cultural_fit_score,
            payload.strengths,
            payload.weaknesses,
            payload.comments,
            payload.recommendation,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let feedback = state.feedback_service.get_feedback(id).await?;
    Ok(Json(FeedbackResponse::from(feedback)))
}

pub async fn feedback_for_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let feedback = state
        .feedback_service
        .feedback_for_interview(interview_id)
        .await?;
    let responses: Vec<FeedbackResponse> =
        feedback.into_iter().map(FeedbackResponse::from).collect();
    Ok(Json(responses))
}

pub async fn feedback_by_interviewer(
    State(state): State<AppState>,
    Path(interviewer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let feedback = state
        .feedback_service
        .feedback_by_interviewer(interviewer_id)
        .await?;
    let responses: Vec<FeedbackResponse> =
        feedback.into_iter().map(FeedbackResponse::from).collect();
    Ok(Json(responses))
}

pub async fn positive_feedback(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let feedback = state.feedback_service.positive_feedback().await?;
    let responses: Vec<FeedbackResponse> =
        feedback.into_iter().map(FeedbackResponse::from).collect();
    Ok(Json(responses))
}

pub async fn candidate_averages(
    State(state): State<AppState>,
    Path(candidate_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let averages = state
        .feedback_service
        .averages_for_candidate(candidate_id)
        .await?;
    Ok(Json(averages))
}

pub async fn interviewer_statistics(
    State(state): State<AppState>,
    Path(interviewer_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let statistics = state
        .feedback_service
        .interviewer_statistics(interviewer_id)
        .await?;
    Ok(Json(statistics))
}
