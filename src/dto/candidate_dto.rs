use crate::models::candidate::CandidateStage;
use serde::Deserialize;
use validator::Validate;

/// Collected from the multipart form on POST /api/candidates.
#[derive(Debug, Default, Validate)]
pub struct CreateCandidatePayload {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCandidatePayload {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStageParams {
    pub new_stage: CandidateStage,
    pub changed_by: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSearchParams {
    pub name: Option<String>,
    pub email: Option<String>,
    pub stage: Option<CandidateStage>,
}
