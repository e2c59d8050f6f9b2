use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interviewer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub title: Option<String>,
    /// Free-text, comma-separated skill list. Searched by substring.
    pub expertise: Option<String>,
    /// Archived interviewers keep their history but cannot be scheduled.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
