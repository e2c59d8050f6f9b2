use crate::models::candidate::CandidateStage;
use crate::models::interview::InterviewStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of a candidate stage transition. `from_stage` is null
/// for the initial APPLIED record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StageChange {
    pub id: i64,
    pub candidate_id: Uuid,
    pub from_stage: Option<CandidateStage>,
    pub to_stage: CandidateStage,
    pub changed_by: String,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Append-only record of an interview status transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: i64,
    pub interview_id: Uuid,
    pub from_status: Option<InterviewStatus>,
    pub to_status: InterviewStatus,
    pub changed_by: String,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}
