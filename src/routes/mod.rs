pub mod candidate_routes;
pub mod dashboard_routes;
pub mod feedback_routes;
pub mod health;
pub mod history_routes;
pub mod interview_routes;
pub mod interviewer_routes;
pub mod screening_routes;

use crate::AppState;
use axum::{
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};

/// The full HTTP surface. Shared between `main` and the integration tests so
/// both exercise exactly the same router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/candidates",
            post(candidate_routes::create_candidate).get(candidate_routes::list_candidates),
        )
        .route(
            "/api/candidates/search",
            get(candidate_routes::search_candidates),
        )
        .route(
            "/api/candidates/without-screening",
            get(candidate_routes::candidates_without_screening),
        )
        .route(
            "/api/candidates/email/:email",
            get(candidate_routes::get_candidate_by_email),
        )
        .route(
            "/api/candidates/:id",
            get(candidate_routes::get_candidate)
                .put(candidate_routes::update_candidate)
                .delete(candidate_routes::delete_candidate),
        )
        .route(
            "/api/candidates/:id/stage",
            put(candidate_routes::update_candidate_stage),
        )
        .route(
            "/api/interviewers",
            post(interviewer_routes::create_interviewer).get(interviewer_routes::list_interviewers),
        )
        .route(
            "/api/interviewers/available",
            get(interviewer_routes::find_available),
        )
        .route(
            "/api/interviewers/expertise",
            get(interviewer_routes::search_by_expertise),
        )
        .route(
            "/api/interviewers/department/:department",
            get(interviewer_routes::list_by_department),
        )
        .route(
            "/api/interviewers/email/:email",
            get(interviewer_routes::get_interviewer_by_email),
        )
        .route(
            "/api/interviewers/:id",
            get(interviewer_routes::get_interviewer)
                .put(interviewer_routes::update_interviewer)
                .delete(interviewer_routes::delete_interviewer),
        )
        .route(
            "/api/interviewers/:id/archive",
            put(interviewer_routes::archive_interviewer),
        )
        .route(
            "/api/interviewers/:id/available",
            get(interviewer_routes::is_available),
        )
        .route(
            "/api/interviews",
            post(interview_routes::schedule_interview),
        )
        .route("/api/interviews/today", get(interview_routes::todays_interviews))
        .route("/api/interviews/range", get(interview_routes::interviews_in_range))
        .route(
            "/api/interviews/pending-feedback",
            get(interview_routes::pending_feedback),
        )
        .route("/api/interviews/overdue", get(interview_routes::overdue_interviews))
        .route(
            "/api/interviews/status/:status",
            get(interview_routes::interviews_by_status),
        )
        .route(
            "/api/interviews/candidate/:id",
            get(interview_routes::interviews_for_candidate),
        )
        .route(
            "/api/interviews/candidate/:id/upcoming",
            get(interview_routes::upcoming_for_candidate),
        )
        .route(
            "/api/interviews/interviewer/:id",
            get(interview_routes::interviews_for_interviewer),
        )
        .route("/api/interviews/:id", get(interview_routes::get_interview))
        .route(
            "/api/interviews/:id/status",
            put(interview_routes::update_interview_status),
        )
        .route(
            "/api/interviews/:id/reschedule",
            put(interview_routes::reschedule_interview),
        )
        .route(
            "/api/interviews/:id/cancel",
            put(interview_routes::cancel_interview),
        )
        .route("/api/feedback", post(feedback_routes::submit_feedback))
        .route("/api/feedback/positive", get(feedback_routes::positive_feedback))
        .route(
            "/api/feedback/interview/:id",
            get(feedback_routes::feedback_for_interview),
        )
        .route(
            "/api/feedback/interviewer/:id",
            get(feedback_routes::feedback_by_interviewer),
        )
        .route(
            "/api/feedback/interviewer/:id/stats",
            get(feedback_routes::interviewer_statistics),
        )
        .route(
            "/api/feedback/candidate/:id/averages",
            get(feedback_routes::candidate_averages),
        )
        .route("/api/feedback/:id", get(feedback_routes::get_feedback))
        .route(
            "/api/screenings/candidate/:id",
            post(screening_routes::screen_candidate).get(screening_routes::screenings_for_candidate),
        )
        .route(
            "/api/screenings/candidate/:id/async",
            post(screening_routes::screen_candidate_async),
        )
        .route(
            "/api/screenings/candidate/:id/latest",
            get(screening_routes::latest_screening),
        )
        .route("/api/screenings/bulk", post(screening_routes::bulk_screen))
        .route("/api/screenings/high-scores", get(screening_routes::high_scores))
        .route("/api/screenings/:id", get(screening_routes::get_screening))
        .route(
            "/api/history/candidates/recent",
            get(history_routes::recent_stage_changes),
        )
        .route(
            "/api/history/candidates/analytics/time-in-stage",
            get(history_routes::time_in_stage),
        )
        .route(
            "/api/history/candidates/:id",
            get(history_routes::candidate_history),
        )
        .route(
            "/api/history/interviews/:id",
            get(history_routes::interview_history),
        )
        .route("/api/dashboard", get(dashboard_routes::get_dashboard))
        .layer(from_fn(crate::middleware::error_context::error_context))
        .with_state(state)
}
