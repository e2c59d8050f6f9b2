use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recommendation", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongHire,
    Hire,
    Maybe,
    NoHire,
}

impl Recommendation {
    pub fn is_positive(self) -> bool {
        matches!(self, Recommendation::StrongHire | Recommendation::Hire)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub interviewer_id: Uuid,
    pub technical_score: i32,
    pub communication_score: i32,
    pub problem_solving_score: i32,
    pub cultural_fit_score: Option<i32>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub comments: Option<String>,
    pub recommendation: Recommendation,
    pub submitted_at: DateTime<Utc>,
}

impl Feedback {
    /// Arithmetic mean of the present scores. Cultural fit only counts when
    /// it was given.
    pub fn overall_score(&self) -> f64 {
        let mut sum =
            (self.technical_score + self.communication_score + self.problem_solving_score) as f64;
        let mut count = 3.0;
        if let Some(cultural) = self.cultural_fit_score {
            sum += cultural as f64;
            count += 1.0;
        }
        sum / count
    }
}
