pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    ai_service::AiService, audit_service::AuditService, candidate_service::CandidateService,
    dashboard_service::DashboardService, feedback_service::FeedbackService,
    interview_service::InterviewService, interviewer_service::InterviewerService,
    resume_service::ResumeService, schedule_service::ScheduleService,
    screening_pool::ScreeningPool, screening_service::ScreeningService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub candidate_service: CandidateService,
    pub interviewer_service: InterviewerService,
    pub schedule_service: ScheduleService,
    pub interview_service: InterviewService,
    pub feedback_service: FeedbackService,
    pub screening_service: ScreeningService,
    pub screening_pool: ScreeningPool,
    pub audit_service: AuditService,
    pub dashboard_service: DashboardService,
    pub resume_service: ResumeService,
}

impl AppState {
    /// Wires every manager to the shared pool and starts the screening
    /// worker pool. Must run inside a tokio runtime.
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.llm_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        let ai_service = AiService::new(
            config.llm_base_url.clone(),
            config.llm_model.clone(),
            config.llm_timeout_secs,
            http_client,
        );
        let screening_service = ScreeningService::new(pool.clone(), ai_service);
        let screening_pool = ScreeningPool::new(
            screening_service.clone(),
            config.screening_pool_core,
            config.screening_pool_max,
            config.screening_pool_queue,
        );

        Self {
            candidate_service: CandidateService::new(pool.clone()),
            interviewer_service: InterviewerService::new(pool.clone()),
            schedule_service: ScheduleService::new(pool.clone()),
            interview_service: InterviewService::new(pool.clone()),
            feedback_service: FeedbackService::new(pool.clone()),
            screening_service,
            screening_pool,
            audit_service: AuditService::new(pool.clone()),
            dashboard_service: DashboardService::new(pool.clone()),
            resume_service: ResumeService::new(),
            pool,
        }
    }
}
