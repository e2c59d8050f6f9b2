use crate::error::{Error, Result};
use crate::models::candidate::CandidateStage;
use crate::models::screening::AiScreening;
use crate::services::ai_service::AiService;
use crate::services::candidate_service::CandidateService;
use crate::services::resume_service::ResumeService;
use sqlx::PgPool;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Reserved principal recorded on stage transitions made by the screening
/// pipeline rather than a person.
pub const AI_SYSTEM: &str = "AI_SYSTEM";

const COLUMNS: &str = "id, candidate_id, skills_matched, experience_years, education_level, \
     cultural_fit, match_score, analysis_text, recommendation, model_used, processing_ms, screened_at";

/// Resume screening pipeline: extract text, analyze with the external model
/// (or the fallback heuristic), persist the screening and advance the
/// candidate from APPLIED to SCREENING in one transaction.
#[derive(Clone)]
pub struct ScreeningService {
    pool: PgPool,
    candidates: CandidateService,
    resumes: ResumeService,
    ai: AiService,
}

impl ScreeningService {
    pub fn new(pool: PgPool, ai: AiService) -> Self {
        let candidates = CandidateService::new(pool.clone());
        Self {
            pool,
            candidates,
            resumes: ResumeService::new(),
            ai,
        }
    }

    pub async fn screen_candidate(
        &self,
        candidate_id: Uuid,
        job_description: Option<&str>,
    ) -> Result<AiScreening> {
        info!(candidate_id = %candidate_id, "starting AI screening");
        let started = Instant::now();

        let candidate = self.candidates.get_candidate(candidate_id).await?;
        let resume_path = candidate
            .resume_path
            .clone()
            .filter(|path| !path.is_empty())
            .ok_or_else(|| Error::Validation("Candidate has no resume uploaded".to_string()))?;

        let resume_text = self.resumes.extract_text(&resume_path).await?;
        if !self.resumes.has_valid_content(&resume_text) {
            return Err(Error::Validation(
                "Resume does not contain valid content".to_string(),
            ));
        }

        // Never fails: falls back to the keyword heuristic on any model or
        // parse failure, so processing_ms includes the timed failure.
        let analysis = self.ai.analyze_resume(&resume_text, job_description).await;
        let processing_ms = started.elapsed().as_millis() as i64;

        let mut tx = self.pool.begin().await?;
        let candidate = CandidateService::lock_candidate(&mut tx, candidate_id).await?;

        let screening = sqlx::query_as::<_, AiScreening>(&format!(
            r#"
            INSERT INTO ai_screenings
                (candidate_id, skills_matched, experience_years, education_level,
                 cultural_fit, match_score, analysis_text, recommendation, model_used, processing_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(candidate_id)
        .bind(&analysis.skills_matched)
        .bind(analysis.experience_years)
        .bind(&analysis.education_level)
        .bind(&analysis.cultural_fit)
        .bind(analysis.match_score)
        .bind(&analysis.analysis_text)
        .bind(analysis.recommendation)
        .bind(self.ai.model())
        .bind(processing_ms)
        .fetch_one(&mut *tx)
        .await?;

        if candidate.current_stage == CandidateStage::Applied {
            let reason = format!(
                "Automated AI screening completed. Score: {}/100",
                analysis.match_score
            );
            self.candidates
                .apply_stage_transition(
                    &mut tx,
                    &candidate,
                    CandidateStage::Screening,
                    AI_SYSTEM,
                    Some(reason.as_str()),
                )
                .await?;
        }

        tx.commit().await?;

        info!(
            candidate_id = %candidate_id,
            match_score = screening.match_score,
            processing_ms,
            "AI screening saved"
        );
        Ok(screening)
    }

    pub async fn get_screening(&self, id: Uuid) -> Result<AiScreening> {
        sqlx::query_as::<_, AiScreening>(&format!(
            "SELECT {COLUMNS} FROM ai_screenings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Screening not found: {}", id)))
    }

    /// Full screening history for a candidate, newest first.
    pub async fn screenings_for_candidate(&self, candidate_id: Uuid) -> Result<Vec<AiScreening>> {
        self.candidates.get_candidate(candidate_id).await?;
        let screenings = sqlx::query_as::<_, AiScreening>(&format!(
            "SELECT {COLUMNS} FROM ai_screenings WHERE candidate_id = $1 ORDER BY screened_at DESC"
        ))
        .bind(candidate_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(screenings)
    }

    pub async fn latest_for_candidate(&self, candidate_id: Uuid) -> Result<AiScreening> {
        sqlx::query_as::<_, AiScreening>(&format!(
            r#"
            SELECT {COLUMNS} FROM ai_screenings
            WHERE candidate_id = $1
            ORDER BY screened_at DESC
            LIMIT 1
            "#
        ))
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            Error::NotFound(format!("No screening found for candidate: {}", candidate_id))
        })
    }

    pub async fn screenings_above(&self, min_score: i32) -> Result<Vec<AiScreening>> {
        let screenings = sqlx::query_as::<_, AiScreening>(&format!(
            r#"
            SELECT {COLUMNS} FROM ai_screenings
            WHERE match_score >= $1
            ORDER BY match_score DESC, screened_at DESC
            "#
        ))
        .bind(min_score)
        .fetch_all(&self.pool)
        .await?;
        Ok(screenings)
    }
}
