use crate::dto::feedback_dto::{CandidateScoreAverages, InterviewerStatistics};
use crate::error::{Error, Result};
use crate::models::feedback::{Feedback, Recommendation};
use crate::models::interview::InterviewStatus;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str = "id, interview_id, interviewer_id, technical_score, communication_score, \
     problem_solving_score, cultural_fit_score, strengths, weaknesses, comments, recommendation, submitted_at";

#[derive(Clone)]
pub struct FeedbackService {
    pool: PgPool,
}

impl FeedbackService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One feedback per (interview, interviewer) pair, from the interviewer
    /// of record, only after the interview completed.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_feedback(
        &self,
        interview_id: Uuid,
        interviewer_id: Uuid,
        technical_score: i32,
        communication_score: i32,
        problem_solving_score: i32,
        cultural_fit_score: Option<i32>,
        strengths: Option<String>,
        weaknesses: Option<String>,
        comments: Option<String>,
        recommendation: Recommendation,
    ) -> Result<Feedback> {
        validate_score(technical_score, "Technical score")?;
        validate_score(communication_score, "Communication score")?;
        validate_score(problem_solving_score, "Problem solving score")?;
        if let Some(score) = cultural_fit_score {
            validate_score(score, "Cultural fit score")?;
        }

        let mut tx = self.pool.begin().await?;

        let interview: Option<(Uuid, InterviewStatus, Uuid)> = sqlx::query_as(
            "SELECT id, current_status, interviewer_id FROM interviews WHERE id = $1",
        )
        .bind(interview_id)
        .fetch_optional(&mut *tx)
        .await?;
        let (_, status, interviewer_of_record) = interview
            .ok_or_else(|| Error::NotFound(format!("Interview not found: {}", interview_id)))?;

        let interviewer: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM interviewers WHERE id = $1")
                .bind(interviewer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if interviewer.is_none() {
            return Err(Error::NotFound(format!(
                "Interviewer not found: {}",
                interviewer_id
            )));
        }

        if status != InterviewStatus::Completed {
            return Err(Error::InvalidState(
                "Cannot submit feedback for non-completed interview".to_string(),
            ));
        }

        if interviewer_of_record != interviewer_id {
            return Err(Error::Forbidden(
                "Feedback can only be submitted by the interviewer of record".to_string(),
            ));
        }

        let duplicate: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM feedback WHERE interview_id = $1 AND interviewer_id = $2",
        )
        .bind(interview_id)
        .bind(interviewer_id)
        .fetch_optional(&mut *tx)
        .await?;
        if duplicate.is_some() {
            return Err(Error::Conflict(
                "Feedback already submitted for this interview by this interviewer".to_string(),
            ));
        }

        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            r#"
            INSERT INTO feedback
                (interview_id, interviewer_id, technical_score, communication_score,
                 problem_solving_score, cultural_fit_score, strengths, weaknesses, comments, recommendation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(interview_id)
        .bind(interviewer_id)
        .bind(technical_score)
        .bind(communication_score)
        .bind(problem_solving_score)
        .bind(cultural_fit_score)
        .bind(&strengths)
        .bind(&weaknesses)
        .bind(&comments)
        .bind(recommendation)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(feedback_id = %feedback.id, interview_id = %interview_id, "feedback submitted");
        Ok(feedback)
    }

    pub async fn get_feedback(&self, id: Uuid) -> Result<Feedback> {
        sqlx::query_as::<_, Feedback>(&format!("SELECT {COLUMNS} FROM feedback WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Feedback not found: {}", id)))
    }

    pub async fn feedback_for_interview(&self, interview_id: Uuid) -> Result<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {COLUMNS} FROM feedback WHERE interview_id = $1 ORDER BY submitted_at ASC"
        ))
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    pub async fn feedback_by_interviewer(&self, interviewer_id: Uuid) -> Result<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            "SELECT {COLUMNS} FROM feedback WHERE interviewer_id = $1 ORDER BY submitted_at DESC"
        ))
        .bind(interviewer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    pub async fn positive_feedback(&self) -> Result<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(&format!(
            r#"
            SELECT {COLUMNS} FROM feedback
            WHERE recommendation IN ('STRONG_HIRE', 'HIRE')
            ORDER BY submitted_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(feedback)
    }

    /// Mean scores over all feedback attached to the candidate's completed
    /// interviews.
    pub async fn averages_for_candidate(
        &self,
        candidate_id: Uuid,
    ) -> Result<CandidateScoreAverages> {
        let averages = sqlx::query_as::<_, CandidateScoreAverages>(
            r#"
            SELECT
                AVG(f.technical_score)::float8 AS technical,
                AVG(f.communication_score)::float8 AS communication,
                AVG(f.problem_solving_score)::float8 AS problem_solving,
                COUNT(f.id) AS feedback_count
            FROM feedback f
            JOIN interviews i ON i.id = f.interview_id
            WHERE i.candidate_id = $1 AND i.current_status = 'COMPLETED'
            "#,
        )
        .bind(candidate_id)
        .fetch_one(&self.pool)
        .await?;

        if averages.feedback_count == 0 {
            return Err(Error::NotFound(format!(
                "No feedback found for candidate: {}",
                candidate_id
            )));
        }
        Ok(averages)
    }

    pub async fn interviewer_statistics(
        &self,
        interviewer_id: Uuid,
    ) -> Result<InterviewerStatistics> {
        let statistics = sqlx::query_as::<_, InterviewerStatistics>(
            r#"
            SELECT
                AVG(technical_score)::float8 AS avg_technical_score,
                AVG(communication_score)::float8 AS avg_communication_score,
                COUNT(id) AS total_feedbacks,
                COUNT(id) FILTER (WHERE recommendation = 'STRONG_HIRE') AS strong_hire_count
            FROM feedback
            WHERE interviewer_id = $1
            "#,
        )
        .bind(interviewer_id)
        .fetch_one(&self.pool)
        .await?;

        if statistics.total_feedbacks == 0 {
            return Err(Error::NotFound(format!(
                "No statistics found for interviewer: {}",
                interviewer_id
            )));
        }
        Ok(statistics)
    }
}

fn validate_score(score: i32, field: &str) -> Result<()> {
    if !(1..=5).contains(&score) {
        return Err(Error::Validation(format!(
            "{} must be between 1 and 5",
            field
        )));
    }
    Ok(())
}
