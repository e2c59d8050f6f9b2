pub mod ai_service;
pub mod audit_service;
pub mod candidate_service;
pub mod dashboard_service;
pub mod feedback_service;
pub mod interview_service;
pub mod interviewer_service;
pub mod resume_service;
pub mod schedule_service;
pub mod screening_pool;
pub mod screening_service;
