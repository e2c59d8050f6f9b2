use crate::dto::page::{Page, PageParams};
use crate::error::{Error, Result};
use crate::models::candidate::{Candidate, CandidateStage};
use crate::services::audit_service::AuditService;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str = "id, name, email, phone, resume_path, current_stage, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("name", "name"),
    ("email", "email"),
    ("currentStage", "current_stage"),
];

/// Owns the candidate stage state machine. Every stage mutation goes through
/// `apply_stage_transition`, which enforces the transition table and appends
/// the audit record on the same connection.
#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
    audit: AuditService,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        let audit = AuditService::new(pool.clone());
        Self { pool, audit }
    }

    pub async fn create_candidate(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        resume_path: Option<String>,
    ) -> Result<Candidate> {
        if name.trim().is_empty() {
            return Err(Error::Validation("Name must not be empty".to_string()));
        }

        if self.email_exists(&email).await? {
            return Err(Error::Conflict(format!(
                "Candidate with email {} already exists",
                email
            )));
        }

        let mut tx = self.pool.begin().await?;
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            INSERT INTO candidates (name, email, phone, resume_path)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&resume_path)
        .fetch_one(&mut *tx)
        .await?;

        self.audit
            .record_stage_change(
                &mut tx,
                candidate.id,
                None,
                CandidateStage::Applied,
                "SYSTEM",
                Some("Application received"),
            )
            .await?;
        tx.commit().await?;

        info!(candidate_id = %candidate.id, email = %candidate.email, "candidate created");
        Ok(candidate)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM candidates WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Candidate> {
        sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {COLUMNS} FROM candidates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate not found: {}", id)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Candidate> {
        sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {COLUMNS} FROM candidates WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate not found: {}", email)))
    }

    pub async fn list_candidates(&self, params: &PageParams) -> Result<Page<Candidate>> {
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM candidates")
            .fetch_one(&self.pool)
            .await?;

        let order = params.order_clause(SORTABLE, "created_at");
        let candidates = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {COLUMNS} FROM candidates ORDER BY {order} LIMIT $1 OFFSET $2"
        ))
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(candidates, params.page(), params.size(), total.0))
    }

    pub async fn search_candidates(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        stage: Option<CandidateStage>,
        params: &PageParams,
    ) -> Result<Page<Candidate>> {
        let filter = r#"
            WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
              AND ($2::text IS NULL OR email ILIKE '%' || $2 || '%')
              AND ($3::candidate_stage IS NULL OR current_stage = $3)
        "#;

        let total: (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM candidates {filter}"))
                .bind(name)
                .bind(email)
                .bind(stage)
                .fetch_one(&self.pool)
                .await?;

        let order = params.order_clause(SORTABLE, "created_at");
        let candidates = sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {COLUMNS} FROM candidates {filter} ORDER BY {order} LIMIT $4 OFFSET $5"
        ))
        .bind(name)
        .bind(email)
        .bind(stage)
        .bind(params.size())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(candidates, params.page(), params.size(), total.0))
    }

    /// Explicit stage transition requested by a user (or AI_SYSTEM).
    pub async fn update_stage(
        &self,
        id: Uuid,
        new_stage: CandidateStage,
        changed_by: &str,
        reason: Option<&str>,
    ) -> Result<Candidate> {
        let mut tx = self.pool.begin().await?;
        let candidate = Self::lock_candidate(&mut tx, id).await?;

        if candidate.current_stage == new_stage {
            return Err(Error::BusinessRule(format!(
                "Candidate is already in stage {}",
                new_stage
            )));
        }

        let updated = self
            .apply_stage_transition(&mut tx, &candidate, new_stage, changed_by, reason)
            .await?;
        tx.commit().await?;

        info!(candidate_id = %id, from = %candidate.current_stage, to = %new_stage, "candidate stage updated");
        Ok(updated)
    }

    /// Core transition primitive shared with the scheduling and lifecycle
    /// managers: enforces the transition table, mutates `current_stage` and
    /// appends the StageChange on the caller's transaction.
    pub async fn apply_stage_transition(
        &self,
        conn: &mut PgConnection,
        candidate: &Candidate,
        new_stage: CandidateStage,
        changed_by: &str,
        reason: Option<&str>,
    ) -> Result<Candidate> {
        if !CandidateStage::can_transition(candidate.current_stage, new_stage) {
            return Err(Error::IllegalTransition(format!(
                "Cannot move candidate from {} to {}",
                candidate.current_stage, new_stage
            )));
        }

        let updated = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates SET current_stage = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new_stage)
        .bind(candidate.id)
        .fetch_one(&mut *conn)
        .await?;

        self.audit
            .record_stage_change(
                conn,
                candidate.id,
                Some(candidate.current_stage),
                new_stage,
                changed_by,
                reason,
            )
            .await?;

        Ok(updated)
    }

    /// Email is the unique identifier and stays immutable.
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<Candidate> {
        let candidate = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            UPDATE candidates
            SET name = COALESCE($1, name), phone = COALESCE($2, phone), updated_at = NOW()
            WHERE id = $3
            RETURNING {COLUMNS}
            "#
        ))
        .bind(name)
        .bind(phone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate not found: {}", id)))?;
        Ok(candidate)
    }

    /// Cascades over everything the candidate owns: feedback and status
    /// history of its interviews, the interviews, screenings and stage
    /// history. Hired candidates cannot be deleted.
    pub async fn delete_candidate(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let candidate = Self::lock_candidate(&mut tx, id).await?;

        if candidate.current_stage == CandidateStage::Hired {
            return Err(Error::BusinessRule(
                "Cannot delete hired candidate".to_string(),
            ));
        }

        sqlx::query(
            "DELETE FROM feedback WHERE interview_id IN (SELECT id FROM interviews WHERE candidate_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM interview_status_history WHERE interview_id IN (SELECT id FROM interviews WHERE candidate_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM interviews WHERE candidate_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM ai_screenings WHERE candidate_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM candidate_stage_history WHERE candidate_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if let Some(path) = candidate.resume_path {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path, error = %e, "failed to remove resume file");
            }
        }

        info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }

    pub async fn candidates_without_screening(&self) -> Result<Vec<Candidate>> {
        let candidates = sqlx::query_as::<_, Candidate>(&format!(
            r#"
            SELECT {COLUMNS} FROM candidates c
            WHERE NOT EXISTS (SELECT 1 FROM ai_screenings s WHERE s.candidate_id = c.id)
            ORDER BY created_at ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    /// Loads the candidate row with a write lock so concurrent stage changes
    /// or deletes on the same candidate serialize.
    pub(crate) async fn lock_candidate(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
    ) -> Result<Candidate> {
        sqlx::query_as::<_, Candidate>(&format!(
            "SELECT {COLUMNS} FROM candidates WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate not found: {}", id)))
    }
}
