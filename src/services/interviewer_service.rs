use crate::error::{Error, Result};
use crate::models::interviewer::Interviewer;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

const COLUMNS: &str =
    "id, name, email, department, title, expertise, active, created_at, updated_at";

#[derive(Clone)]
pub struct InterviewerService {
    pool: PgPool,
}

impl InterviewerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_interviewer(
        &self,
        name: String,
        email: String,
        department: Option<String>,
        title: Option<String>,
        expertise: Option<String>,
    ) -> Result<Interviewer> {
        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM interviewers WHERE email = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_some() {
            return Err(Error::Conflict(format!(
                "Interviewer with email {} already exists",
                email
            )));
        }

        let interviewer = sqlx::query_as::<_, Interviewer>(&format!(
            r#"
            INSERT INTO interviewers (name, email, department, title, expertise)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&name)
        .bind(&email)
        .bind(&department)
        .bind(&title)
        .bind(&expertise)
        .fetch_one(&self.pool)
        .await?;

        info!(interviewer_id = %interviewer.id, email = %interviewer.email, "interviewer created");
        Ok(interviewer)
    }

    pub async fn get_interviewer(&self, id: Uuid) -> Result<Interviewer> {
        sqlx::query_as::<_, Interviewer>(&format!(
            "SELECT {COLUMNS} FROM interviewers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interviewer not found: {}", id)))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Interviewer> {
        sqlx::query_as::<_, Interviewer>(&format!(
            "SELECT {COLUMNS} FROM interviewers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interviewer not found: {}", email)))
    }

    pub async fn list_interviewers(&self) -> Result<Vec<Interviewer>> {
        let interviewers = sqlx::query_as::<_, Interviewer>(&format!(
            "SELECT {COLUMNS} FROM interviewers ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(interviewers)
    }

    pub async fn list_by_department(&self, department: &str) -> Result<Vec<Interviewer>> {
        let interviewers = sqlx::query_as::<_, Interviewer>(&format!(
            "SELECT {COLUMNS} FROM interviewers WHERE department = $1 ORDER BY name ASC"
        ))
        .bind(department)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviewers)
    }

    pub async fn search_by_expertise(&self, skill: &str) -> Result<Vec<Interviewer>> {
        let interviewers = sqlx::query_as::<_, Interviewer>(&format!(
            "SELECT {COLUMNS} FROM interviewers WHERE expertise ILIKE '%' || $1 || '%' ORDER BY name ASC"
        ))
        .bind(skill)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviewers)
    }

    /// Email stays immutable; everything else is patchable.
    pub async fn update_interviewer(
        &self,
        id: Uuid,
        name: Option<String>,
        department: Option<String>,
        title: Option<String>,
        expertise: Option<String>,
    ) -> Result<Interviewer> {
        sqlx::query_as::<_, Interviewer>(&format!(
            r#"
            UPDATE interviewers
            SET name = COALESCE($1, name),
                department = COALESCE($2, department),
                title = COALESCE($3, title),
                expertise = COALESCE($4, expertise),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {COLUMNS}
            "#
        ))
        .bind(name)
        .bind(department)
        .bind(title)
        .bind(expertise)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interviewer not found: {}", id)))
    }

    /// Archiving keeps the interviewer's history intact while taking them
    /// out of the scheduling rotation.
    pub async fn archive_interviewer(&self, id: Uuid) -> Result<Interviewer> {
        let interviewer = sqlx::query_as::<_, Interviewer>(&format!(
            r#"
            UPDATE interviewers SET active = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interviewer not found: {}", id)))?;

        info!(interviewer_id = %id, "interviewer archived");
        Ok(interviewer)
    }

    /// Refused while any interview references the interviewer. The existence
    /// check runs inside the delete transaction so a concurrent schedule
    /// cannot slip in between check and delete.
    pub async fn delete_interviewer(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let interviewer: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM interviewers WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if interviewer.is_none() {
            return Err(Error::NotFound(format!("Interviewer not found: {}", id)));
        }

        let has_interviews: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM interviews WHERE interviewer_id = $1 LIMIT 1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if has_interviews.is_some() {
            return Err(Error::BusinessRule(
                "Cannot delete interviewer with existing interviews. Archive the interviewer instead."
                    .to_string(),
            ));
        }

        sqlx::query("DELETE FROM interviewers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(interviewer_id = %id, "interviewer deleted");
        Ok(())
    }

    /// Interviewers with no non-terminal interview overlapping the window.
    pub async fn find_available(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Interviewer>> {
        let interviewers = sqlx::query_as::<_, Interviewer>(&format!(
            r#"
            SELECT {COLUMNS} FROM interviewers iv
            WHERE iv.active
              AND NOT EXISTS (
                  SELECT 1 FROM interviews i
                  WHERE i.interviewer_id = iv.id
                    AND i.current_status NOT IN ('CANCELLED', 'COMPLETED')
                    AND i.scheduled_at < $2
                    AND i.scheduled_at + make_interval(mins => i.duration_minutes) > $1
              )
            ORDER BY iv.name ASC
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(interviewers)
    }

    pub async fn is_available(
        &self,
        interviewer_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        // Verify existence first so an unknown id is a 404, not "available".
        self.get_interviewer(interviewer_id).await?;

        let busy: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM interviews
            WHERE interviewer_id = $1
              AND current_status NOT IN ('CANCELLED', 'COMPLETED')
              AND scheduled_at < $3
              AND scheduled_at + make_interval(mins => duration_minutes) > $2
            LIMIT 1
            "#,
        )
        .bind(interviewer_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;
        Ok(busy.is_none())
    }
}
