use crate::dto::dashboard_dto::{RecentActivityItem, StageDuration};
use crate::error::Result;
use crate::models::candidate::CandidateStage;
use crate::models::history::{StageChange, StatusChange};
use crate::models::interview::InterviewStatus;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Append-only recorder for pipeline transitions. Records are written on the
/// caller's transaction so a rolled-back mutation never leaves a stray
/// history row, and are never updated or deleted afterwards.
#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record_stage_change(
        &self,
        conn: &mut PgConnection,
        candidate_id: Uuid,
        from: Option<CandidateStage>,
        to: CandidateStage,
        changed_by: &str,
        reason: Option<&str>,
    ) -> Result<StageChange> {
        let record = sqlx::query_as::<_, StageChange>(
            r#"
            INSERT INTO candidate_stage_history (candidate_id, from_stage, to_stage, changed_by, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, candidate_id, from_stage, to_stage, changed_by, reason, changed_at
            "#,
        )
        .bind(candidate_id)
        .bind(from)
        .bind(to)
        .bind(changed_by)
        .bind(reason)
        .fetch_one(conn)
        .await?;
        Ok(record)
    }

    pub async fn record_status_change(
        &self,
        conn: &mut PgConnection,
        interview_id: Uuid,
        from: Option<InterviewStatus>,
        to: InterviewStatus,
        changed_by: &str,
        notes: Option<&str>,
    ) -> Result<StatusChange> {
        let record = sqlx::query_as::<_, StatusChange>(
            r#"
            INSERT INTO interview_status_history (interview_id, from_status, to_status, changed_by, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, interview_id, from_status, to_status, changed_by, notes, changed_at
            "#,
        )
        .bind(interview_id)
        .bind(from)
        .bind(to)
        .bind(changed_by)
        .bind(notes)
        .fetch_one(conn)
        .await?;
        Ok(record)
    }

    /// A candidate's full journey, oldest first.
    pub async fn stage_history(&self, candidate_id: Uuid) -> Result<Vec<StageChange>> {
        let history = sqlx::query_as::<_, StageChange>(
            r#"
            SELECT id, candidate_id, from_stage, to_stage, changed_by, reason, changed_at
            FROM candidate_stage_history
            WHERE candidate_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }

    pub async fn status_history(&self, interview_id: Uuid) -> Result<Vec<StatusChange>> {
        let history = sqlx::query_as::<_, StatusChange>(
            r#"
            SELECT id, interview_id, from_status, to_status, changed_by, notes, changed_at
            FROM interview_status_history
            WHERE interview_id = $1
            ORDER BY changed_at ASC, id ASC
            "#,
        )
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(history)
    }

    /// Stage changes across all candidates since `since`, newest first. Feeds
    /// the dashboard activity widget.
    pub async fn recent_stage_changes(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RecentActivityItem>> {
        let activity = sqlx::query_as::<_, RecentActivityItem>(
            r#"
            SELECT c.name AS candidate_name, h.from_stage, h.to_stage, h.changed_by, h.changed_at, h.reason
            FROM candidate_stage_history h
            JOIN candidates c ON c.id = h.candidate_id
            WHERE h.changed_at >= $1
            ORDER BY h.changed_at DESC, h.id DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(activity)
    }

    /// Average days spent in each stage, computed from adjacent transitions
    /// per candidate. The gap between a record and its predecessor is the
    /// time spent in the record's `from_stage`.
    pub async fn average_time_in_stage(&self) -> Result<Vec<StageDuration>> {
        let durations = sqlx::query_as::<_, StageDuration>(
            r#"
            SELECT from_stage, AVG(day_span)::float8 AS avg_days
            FROM (
                SELECT
                    from_stage,
                    EXTRACT(EPOCH FROM (changed_at - LAG(changed_at) OVER (
                        PARTITION BY candidate_id ORDER BY changed_at, id
                    ))) / 86400.0 AS day_span
                FROM candidate_stage_history
            ) spans
            WHERE day_span IS NOT NULL AND from_stage IS NOT NULL
            GROUP BY from_stage
            ORDER BY from_stage
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(durations)
    }
}
