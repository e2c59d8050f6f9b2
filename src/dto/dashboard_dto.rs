use crate::models::candidate::CandidateStage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub total_candidates: i64,
    pub candidates_this_month: i64,
    pub interviews_scheduled_today: i64,
    pub pending_feedback_count: i64,
    pub candidates_by_stage: HashMap<CandidateStage, i64>,
    pub recent_activity: Vec<RecentActivityItem>,
    pub top_candidates: Vec<TopCandidate>,
    pub average_score_by_stage: HashMap<CandidateStage, f64>,
    pub hiring_funnel: HiringFunnel,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivityItem {
    pub candidate_name: String,
    pub from_stage: Option<CandidateStage>,
    pub to_stage: CandidateStage,
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopCandidate {
    pub candidate_id: Uuid,
    pub candidate_name: String,
    pub email: String,
    pub match_score: i32,
    pub current_stage: CandidateStage,
    pub screened_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HiringFunnel {
    pub applied: i64,
    pub screening: i64,
    pub interview_scheduled: i64,
    pub interview_completed: i64,
    pub hired: i64,
    pub rejected: i64,
    pub overall_conversion_rate: String,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StageDuration {
    pub from_stage: Option<CandidateStage>,
    pub avg_days: Option<f64>,
}
