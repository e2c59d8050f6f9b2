use crate::error::{Error, Result};
use crate::models::candidate::CandidateStage;
use crate::models::interview::{
    Interview, InterviewStatus, InterviewType, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES,
    MIN_DURATION_MINUTES,
};
use crate::services::audit_service::AuditService;
use crate::services::candidate_service::CandidateService;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str = "id, candidate_id, interviewer_id, scheduled_at, duration_minutes, \
     current_status, interview_type, location, notes, created_at, updated_at";

/// Conflict-free interview scheduling. Conflict detection and the insert run
/// in one transaction under a write lock on the interviewer row, so two
/// concurrent schedules for the same interviewer serialize; schedules for
/// different interviewers proceed independently.
#[derive(Clone)]
pub struct ScheduleService {
    pool: PgPool,
    audit: AuditService,
    candidates: CandidateService,
}

impl ScheduleService {
    pub fn new(pool: PgPool) -> Self {
        let audit = AuditService::new(pool.clone());
        let candidates = CandidateService::new(pool.clone());
        Self {
            pool,
            audit,
            candidates,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn schedule(
        &self,
        candidate_id: Uuid,
        interviewer_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration_minutes: Option<i32>,
        interview_type: InterviewType,
        location: Option<String>,
        notes: Option<String>,
        scheduled_by: &str,
    ) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;

        let candidate = CandidateService::lock_candidate(&mut tx, candidate_id).await?;
        Self::lock_interviewer(&mut tx, interviewer_id).await?;

        if scheduled_at <= Utc::now() {
            return Err(Error::Validation(
                "Interview cannot be scheduled in the past".to_string(),
            ));
        }

        let duration = duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        validate_duration(duration)?;

        if !matches!(
            candidate.current_stage,
            CandidateStage::Screening
                | CandidateStage::InterviewScheduled
                | CandidateStage::InterviewCompleted
        ) {
            return Err(Error::BusinessRule(format!(
                "Candidate in stage {} cannot be scheduled for an interview",
                candidate.current_stage
            )));
        }

        if let Some(conflict_time) =
            Self::find_conflict(&mut tx, interviewer_id, scheduled_at, duration, None).await?
        {
            return Err(Error::SchedulingConflict {
                interviewer_id,
                conflict_time,
            });
        }

        let interview = sqlx::query_as::<_, Interview>(&format!(
            r#"
            INSERT INTO interviews
                (candidate_id, interviewer_id, scheduled_at, duration_minutes, interview_type, location, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(candidate_id)
        .bind(interviewer_id)
        .bind(scheduled_at)
        .bind(duration)
        .bind(interview_type)
        .bind(&location)
        .bind(&notes)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_status_change(
                &mut tx,
                interview.id,
                None,
                InterviewStatus::Scheduled,
                scheduled_by,
                Some("Interview scheduled"),
            )
            .await?;

        // First interview for a screened candidate advances the pipeline.
        if candidate.current_stage == CandidateStage::Screening {
            self.candidates
                .apply_stage_transition(
                    &mut tx,
                    &candidate,
                    CandidateStage::InterviewScheduled,
                    scheduled_by,
                    Some("Interview scheduled"),
                )
                .await?;
        }

        tx.commit().await?;

        info!(
            interview_id = %interview.id,
            candidate_id = %candidate_id,
            interviewer_id = %interviewer_id,
            scheduled_at = %scheduled_at,
            "interview scheduled"
        );
        Ok(interview)
    }

    /// Moves an interview to a new slot. History keeps both records: the
    /// RESCHEDULED marker and the synthetic transition back to SCHEDULED, so
    /// the surface status stays SCHEDULED.
    pub async fn reschedule(
        &self,
        interview_id: Uuid,
        new_scheduled_at: DateTime<Utc>,
        new_duration: Option<i32>,
        rescheduled_by: &str,
        reason: Option<&str>,
    ) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;
        let interview = Self::lock_interview(&mut tx, interview_id).await?;

        if interview.current_status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "Cannot reschedule interview in status {}",
                interview.current_status
            )));
        }
        // The status table has no IN_PROGRESS -> RESCHEDULED edge; only
        // SCHEDULED interviews can move.
        if !InterviewStatus::can_transition(
            interview.current_status,
            InterviewStatus::Rescheduled,
        ) {
            return Err(Error::IllegalTransition(format!(
                "Cannot reschedule interview in status {}",
                interview.current_status
            )));
        }

        if new_scheduled_at <= Utc::now() {
            return Err(Error::Validation(
                "Interview cannot be rescheduled into the past".to_string(),
            ));
        }
        let duration = new_duration.unwrap_or(interview.duration_minutes);
        validate_duration(duration)?;

        Self::lock_interviewer(&mut tx, interview.interviewer_id).await?;
        if let Some(conflict_time) = Self::find_conflict(
            &mut tx,
            interview.interviewer_id,
            new_scheduled_at,
            duration,
            Some(interview_id),
        )
        .await?
        {
            return Err(Error::SchedulingConflict {
                interviewer_id: interview.interviewer_id,
                conflict_time,
            });
        }

        let updated = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews
            SET scheduled_at = $1, duration_minutes = $2, current_status = 'SCHEDULED', updated_at = NOW()
            WHERE id = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new_scheduled_at)
        .bind(duration)
        .bind(interview_id)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_status_change(
                &mut tx,
                interview_id,
                Some(interview.current_status),
                InterviewStatus::Rescheduled,
                rescheduled_by,
                reason,
            )
            .await?;
        let slot_note = format!("Rescheduled to {}", new_scheduled_at.to_rfc3339());
        self.audit
            .record_status_change(
                &mut tx,
                interview_id,
                Some(InterviewStatus::Rescheduled),
                InterviewStatus::Scheduled,
                rescheduled_by,
                Some(slot_note.as_str()),
            )
            .await?;

        tx.commit().await?;

        info!(interview_id = %interview_id, new_scheduled_at = %new_scheduled_at, "interview rescheduled");
        Ok(updated)
    }

    pub async fn cancel(
        &self,
        interview_id: Uuid,
        cancelled_by: &str,
        reason: Option<&str>,
    ) -> Result<Interview> {
        let mut tx = self.pool.begin().await?;
        let interview = Self::lock_interview(&mut tx, interview_id).await?;

        match interview.current_status {
            InterviewStatus::Completed => {
                return Err(Error::InvalidState(
                    "Cannot cancel completed interview".to_string(),
                ))
            }
            InterviewStatus::Cancelled => {
                return Err(Error::InvalidState(
                    "Interview is already cancelled".to_string(),
                ))
            }
            _ => {}
        }

        let updated = sqlx::query_as::<_, Interview>(&format!(
            r#"
            UPDATE interviews SET current_status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(interview_id)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_status_change(
                &mut tx,
                interview_id,
                Some(interview.current_status),
                InterviewStatus::Cancelled,
                cancelled_by,
                reason,
            )
            .await?;
        tx.commit().await?;

        info!(interview_id = %interview_id, "interview cancelled");
        Ok(updated)
    }

    /// Exact half-open overlap test against the interviewer's non-terminal
    /// interviews, evaluated in SQL on the locked transaction. Returns the
    /// start time of the earliest conflicting interview.
    async fn find_conflict(
        tx: &mut Transaction<'_, Postgres>,
        interviewer_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        exclude: Option<Uuid>,
    ) -> Result<Option<DateTime<Utc>>> {
        let end = start + Duration::minutes(duration_minutes as i64);
        let conflict: Option<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, scheduled_at FROM interviews
            WHERE interviewer_id = $1
              AND current_status NOT IN ('CANCELLED', 'COMPLETED')
              AND ($4::uuid IS NULL OR id <> $4)
              AND scheduled_at < $3
              AND scheduled_at + make_interval(mins => duration_minutes) > $2
            ORDER BY scheduled_at ASC
            LIMIT 1
            "#,
        )
        .bind(interviewer_id)
        .bind(start)
        .bind(end)
        .bind(exclude)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(conflict.map(|(_, scheduled_at)| scheduled_at))
    }

    /// Serializes concurrent schedules per interviewer and rejects archived
    /// interviewers.
    async fn lock_interviewer(
        tx: &mut Transaction<'_, Postgres>,
        interviewer_id: Uuid,
    ) -> Result<()> {
        let row: Option<(Uuid, bool)> =
            sqlx::query_as("SELECT id, active FROM interviewers WHERE id = $1 FOR UPDATE")
                .bind(interviewer_id)
                .fetch_optional(&mut **tx)
                .await?;
        match row {
            None => Err(Error::NotFound(format!(
                "Interviewer not found: {}",
                interviewer_id
            ))),
            Some((_, false)) => Err(Error::BusinessRule(
                "Cannot schedule an interview with an archived interviewer".to_string(),
            )),
            Some((_, true)) => Ok(()),
        }
    }

    async fn lock_interview(
        tx: &mut Transaction<'_, Postgres>,
        interview_id: Uuid,
    ) -> Result<Interview> {
        sqlx::query_as::<_, Interview>(&format!(
            "SELECT {COLUMNS} FROM interviews WHERE id = $1 FOR UPDATE"
        ))
        .bind(interview_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interview not found: {}", interview_id)))
    }
}

fn validate_duration(duration: i32) -> Result<()> {
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&duration) {
        return Err(Error::Validation(format!(
            "Interview duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}
