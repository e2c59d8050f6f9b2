use crate::models::feedback::{Feedback, Recommendation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackPayload {
    pub interview_id: Uuid,
    pub interviewer_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub technical_score: i32,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub communication_score: i32,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub problem_solving_score: i32,
    #[validate(range(min = 1, max = 5, message = "must be between 1 and 5"))]
    pub cultural_fit_score: Option<i32>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub comments: Option<String>,
    pub recommendation: Recommendation,
}

/// Feedback as served over HTTP, with the derived overall score attached.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
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
    pub overall_score: f64,
    pub submitted_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        let overall_score = feedback.overall_score();
        Self {
            id: feedback.id,
            interview_id: feedback.interview_id,
            interviewer_id: feedback.interviewer_id,
            technical_score: feedback.technical_score,
            communication_score: feedback.communication_score,
            problem_solving_score: feedback.problem_solving_score,
            cultural_fit_score: feedback.cultural_fit_score,
            strengths: feedback.strengths,
            weaknesses: feedback.weaknesses,
            comments: feedback.comments,
            recommendation: feedback.recommendation,
            overall_score,
            submitted_at: feedback.submitted_at,
        }
    }
}

/// Mean scores across all feedback attached to a candidate's completed
/// interviews.
#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScoreAverages {
    pub technical: Option<f64>,
    pub communication: Option<f64>,
    pub problem_solving: Option<f64>,
    pub feedback_count: i64,
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InterviewerStatistics {
    pub avg_technical_score: Option<f64>,
    pub avg_communication_score: Option<f64>,
    pub total_feedbacks: i64,
    pub strong_hire_count: i64,
}
