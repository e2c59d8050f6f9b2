use crate::models::feedback::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One stored resume analysis. Immutable once written; a candidate
/// accumulates a history of these across re-screenings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiScreening {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub skills_matched: Option<String>,
    pub experience_years: f64,
    pub education_level: Option<String>,
    pub cultural_fit: Option<String>,
    pub match_score: i32,
    pub analysis_text: Option<String>,
    pub recommendation: Recommendation,
    pub model_used: String,
    pub processing_ms: i64,
    pub screened_at: DateTime<Utc>,
}
