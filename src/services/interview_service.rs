use crate::error::{Error, Result};
use crate::models::candidate::CandidateStage;
use crate::models::interview::{Interview, InterviewStatus};
use crate::services::audit_service::AuditService;
use crate::services::candidate_service::CandidateService;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str = "id, candidate_id, interviewer_id, scheduled_at, duration_minutes, \
     current_status, interview_type, location, notes, created_at, updated_at";

/// Owns the interview status state machine. Completion drives the candidate
/// pipeline forward; rescheduling and cancellation live in the scheduling
/// engine because they also touch the calendar.
#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    audit: AuditService,
    candidates: CandidateService,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        let audit = AuditService::new(pool.clone());
        let candidates = CandidateService::new(pool.clone());
        Self {
            pool,
            audit,
            candidates,
        }
    }

    pub async fn get_interview(&self, id: Uuid) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interview not found: {}", id)))
    }

    pub async fn update_status(
        &self,
        interview_id: Uuid,
        new_status: InterviewStatus,
        changed_by: &str,
        notes: Option<&str>,
    ) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;
        let interview = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE id = $1 FOR UPDATE"
        ))
        .bind(interview_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interview not found: {}", interview_id)))?;

        if interview.current_status == new_status {
            return Err(Error::BusinessRule(format!(
                "Interview is already in status {}",
                new_status
            )));
        }
        if new_status == InterviewStatus::Rescheduled {
            return Err(Error::BusinessRule(
                "Use the reschedule operation to move an interview to a new slot".to_string(),
            ));
        }
        if !InterviewStatus::can_transition(interview.current_status, new_status) {
            return Err(Error::IllegalTransition(format!(
                "Cannot move interview from {} to {}",
                interview.current_status, new_status
            )));
        }

        let updated = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews SET current_status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new_status)
        .bind(interview_id)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_status_change(
                &mut tx,
                interview_id,
                Some(interview.current_status),
                new_status,
                changed_by,
                notes,
            )
            .await?;

        // A completed interview moves the candidate forward in the pipeline.
        if new_status == InterviewStatus::Completed {
            let candidate =
                CandidateService::lock_candidate(&mut tx, interview.candidate_id).await?;
            if candidate.current_stage == CandidateStage::InterviewScheduled {
                self.candidates
                    .apply_stage_transition(
                        &mut tx,
                        &candidate,
                        CandidateStage::InterviewCompleted,
                        changed_by,
                        Some("Interview completed"),
                    )
                    .await?;
            }
        }

        tx.commit().await?;

        info!(interview_id = %interview_id, from = %interview.current_status, to = %new_status, "interview status updated");
        Ok(updated)
    }

    pub async fn interviews_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE candidate_id = $1 ORDER BY scheduled_at DESC"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn interviews_for_interviewer(
        &self,
        interviewer_id: Uuid,
    ) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE interviewer_id = $1 ORDER BY scheduled_at DESC"
        ))
        .bind(interviewer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn upcoming_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviews
            WHERE candidate_id = $1
              AND scheduled_at > NOW()
              AND current_status NOT IN ('CANCELLED', 'COMPLETED')
            ORDER BY scheduled_at ASC
            "#
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn todays_interviews(&self) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviews
            WHERE scheduled_at >= date_trunc('day', NOW())
              AND scheduled_at < date_trunc('day', NOW()) + INTERVAL '1 day'
            ORDER BY scheduled_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn interviews_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviews
            WHERE scheduled_at >= $1 AND scheduled_at < $2
            ORDER BY scheduled_at ASC
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    pub async fn interviews_by_status(&self, status: InterviewStatus) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE current_status = $1 ORDER BY scheduled_at ASC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    /// Interviews that happened but have no panel feedback yet.
    pub async fn completed_without_feedback(&self) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviews i
            WHERE i.current_status = 'COMPLETED'
              AND NOT EXISTS (SELECT 1 FROM feedback f WHERE f.interview_id = i.id)
            ORDER BY i.scheduled_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }

    /// Still SCHEDULED although the slot has passed.
    pub async fn overdue_interviews(&self) -> Result<Vec<Interview>> {
        let interviews = sqlx::query_as::<_, Interview>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviews
            WHERE current_status = 'SCHEDULED' AND scheduled_at < NOW()
            ORDER BY scheduled_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(interviews)
    }
}
