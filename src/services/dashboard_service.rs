use crate::dto::dashboard_dto::{DashboardResponse, HiringFunnel, TopCandidate};
use crate::error::Result;
use crate::models::candidate::CandidateStage;
use crate::services::audit_service::AuditService;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

/// Read-only composite projections for the recruiter dashboard. Nothing in
/// here mutates state.
#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
    audit: AuditService,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        let audit = AuditService::new(pool.clone());
        Self { pool, audit }
    }

    pub async fn dashboard(&self) -> Result<DashboardResponse> {
        let (total_candidates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM candidates")
            .fetch_one(&self.pool)
            .await?;

        let (candidates_this_month,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM candidates WHERE created_at >= date_trunc('month', NOW())",
        )
        .fetch_one(&self.pool)
        .await?;

        let (interviews_scheduled_today,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM interviews
            WHERE scheduled_at >= date_trunc('day', NOW())
              AND scheduled_at < date_trunc('day', NOW()) + INTERVAL '1 day'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (pending_feedback_count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM interviews i
            WHERE i.current_status = 'COMPLETED'
              AND NOT EXISTS (SELECT 1 FROM feedback f WHERE f.interview_id = i.id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let candidates_by_stage = self.count_by_stage().await?;
        let recent_activity = self
            .audit
            .recent_stage_changes(Utc::now() - Duration::days(7))
            .await?;
        let top_candidates = self.top_candidates(80, 5).await?;
        let average_score_by_stage = self.average_score_by_stage().await?;
        let hiring_funnel = build_funnel(&candidates_by_stage, total_candidates);

        Ok(DashboardResponse {
            total_candidates,
            candidates_this_month,
            interviews_scheduled_today,
            pending_feedback_count,
            candidates_by_stage,
            recent_activity,
            top_candidates,
            average_score_by_stage,
            hiring_funnel,
        })
    }

    async fn count_by_stage(&self) -> Result<HashMap<CandidateStage, i64>> {
        let rows: Vec<(CandidateStage, i64)> =
            sqlx::query_as("SELECT current_stage, COUNT(*) FROM candidates GROUP BY current_stage")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }

    /// Candidates ranked by their best screening score.
    pub async fn top_candidates(&self, min_score: i32, limit: i64) -> Result<Vec<TopCandidate>> {
        let top = sqlx::query_as::<_, TopCandidate>(
            r#"
            SELECT c.id AS candidate_id, c.name AS candidate_name, c.email,
                   best.match_score, c.current_stage, best.screened_at
            FROM (
                SELECT DISTINCT ON (candidate_id) candidate_id, match_score, screened_at
                FROM ai_screenings
                ORDER BY candidate_id, match_score DESC, screened_at DESC
            ) best
            JOIN candidates c ON c.id = best.candidate_id
            WHERE best.match_score >= $1
            ORDER BY best.match_score DESC
            LIMIT $2
            "#,
        )
        .bind(min_score)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(top)
    }

    async fn average_score_by_stage(&self) -> Result<HashMap<CandidateStage, f64>> {
        let rows: Vec<(CandidateStage, Option<f64>)> = sqlx::query_as(
            r#"
            SELECT c.current_stage, AVG(s.match_score)::float8
            FROM ai_screenings s
            JOIN candidates c ON c.id = s.candidate_id
            GROUP BY c.current_stage
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .filter_map(|(stage, avg)| avg.map(|a| (stage, a)))
            .collect())
    }
}

fn build_funnel(counts: &HashMap<CandidateStage, i64>, total: i64) -> HiringFunnel {
    let count = |stage: CandidateStage| counts.get(&stage).copied().unwrap_or(0);
    let hired = count(CandidateStage::Hired);
    let overall_conversion_rate = if total > 0 {
        format!("{:.2}%", (hired as f64 * 100.0) / total as f64)
    } else {
        "0.00%".to_string()
    };

    HiringFunnel {
        applied: count(CandidateStage::Applied),
        screening: count(CandidateStage::Screening),
        interview_scheduled: count(CandidateStage::InterviewScheduled),
        interview_completed: count(CandidateStage::InterviewCompleted),
        hired,
        rejected: count(CandidateStage::Rejected),
        overall_conversion_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funnel_conversion_is_hired_over_total() {
        let mut counts = HashMap::new();
        counts.insert(CandidateStage::Applied, 5);
        counts.insert(CandidateStage::Hired, 2);
        counts.insert(CandidateStage::Rejected, 1);

        let funnel = build_funnel(&counts, 8);
        assert_eq!(funnel.applied, 5);
        assert_eq!(funnel.hired, 2);
        assert_eq!(funnel.overall_conversion_rate, "25.00%");
    }

    #[test]
    fn empty_pipeline_has_zero_conversion() {
        let funnel = build_funnel(&HashMap::new(), 0);
        assert_eq!(funnel.overall_conversion_rate, "0.00%");
        assert_eq!(funnel.hired, 0);
    }
}
