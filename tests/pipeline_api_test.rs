use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "test-multipart-boundary";

/// Builds the app against a real database. Returns None (skipping the test)
/// when DATABASE_URL is not configured.
async fn setup() -> Option<Router> {
    dotenvy::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    }
    std::env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    std::env::set_var("UPLOADS_RESUME_DIR", "/tmp/hiring-backend-test-uploads");
    // Nothing listens here, so screenings always take the fallback path.
    std::env::set_var("LLM_BASE_URL", "http://127.0.0.1:9");
    let _ = hiring_backend::config::init_config();

    let pool = hiring_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");

    Some(hiring_backend::routes::api_router(hiring_backend::AppState::new(pool)))
}

fn multipart_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, JsonValue) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn create_candidate(app: &Router, name: &str, email: &str) -> JsonValue {
    let body = multipart_body(&[("name", name), ("email", email)]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/candidates")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, candidate) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    candidate
}

async fn create_interviewer(app: &Router, name: &str, email: &str) -> JsonValue {
    let payload = json!({ "name": name, "email": email, "department": "Engineering" });
    let request = Request::builder()
        .method("POST")
        .uri("/api/interviewers")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, interviewer) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    interviewer
}

async fn update_stage(
    app: &Router,
    candidate_id: &str,
    new_stage: &str,
    changed_by: &str,
) -> (StatusCode, JsonValue) {
    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/candidates/{candidate_id}/stage?newStage={new_stage}&changedBy={changed_by}&reason=test"
        ))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn schedule(
    app: &Router,
    candidate_id: &str,
    interviewer_id: &str,
    scheduled_at: &str,
    duration: i32,
) -> (StatusCode, JsonValue) {
    let payload = json!({
        "candidateId": candidate_id,
        "interviewerId": interviewer_id,
        "scheduledAt": scheduled_at,
        "durationMinutes": duration,
        "type": "TECHNICAL",
        "scheduledBy": "coordinator@example.com",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/interviews")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn pipeline_happy_path_to_hired() {
    let Some(app) = setup().await else { return };
    let email = format!("john_{}@example.com", Uuid::new_v4());

    let candidate = create_candidate(&app, "John Doe", &email).await;
    assert_eq!(candidate["currentStage"], "APPLIED");
    let candidate_id = candidate["id"].as_str().unwrap().to_string();

    // Lookup by email works before any transition.
    let request = Request::builder()
        .uri(format!("/api/candidates/email/{email}"))
        .body(Body::empty())
        .unwrap();
    let (status, by_email) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_email["id"].as_str().unwrap(), candidate_id);

    let (status, _) = update_stage(&app, &candidate_id, "SCREENING", "recruiter").await;
    assert_eq!(status, StatusCode::OK);

    let interviewer =
        create_interviewer(&app, "Jane", &format!("jane_{}@example.com", Uuid::new_v4())).await;
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let tomorrow = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
    let (status, interview) = schedule(&app, &candidate_id, &interviewer_id, &tomorrow, 60).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(interview["currentStatus"], "SCHEDULED");
    let interview_id = interview["id"].as_str().unwrap().to_string();

    // Scheduling the first interview advances the candidate.
    let request = Request::builder()
        .uri(format!("/api/candidates/{candidate_id}"))
        .body(Body::empty())
        .unwrap();
    let (_, refreshed) = send(&app, request).await;
    assert_eq!(refreshed["currentStage"], "INTERVIEW_SCHEDULED");

    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/interviews/{interview_id}/status?newStatus=COMPLETED&changedBy=jane"
        ))
        .body(Body::empty())
        .unwrap();
    let (status, completed) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(completed["currentStatus"], "COMPLETED");

    let request = Request::builder()
        .uri(format!("/api/candidates/{candidate_id}"))
        .body(Body::empty())
        .unwrap();
    let (_, refreshed) = send(&app, request).await;
    assert_eq!(refreshed["currentStage"], "INTERVIEW_COMPLETED");

    let feedback = json!({
        "interviewId": interview_id,
        "interviewerId": interviewer_id,
        "technicalScore": 5,
        "communicationScore": 4,
        "problemSolvingScore": 5,
        "culturalFitScore": 4,
        "recommendation": "STRONG_HIRE",
    });
    let request = Request::builder()
        .method("POST")
        .uri("/api/feedback")
        .header("content-type", "application/json")
        .body(Body::from(feedback.to_string()))
        .unwrap();
    let (status, submitted) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted["overallScore"], 4.5);

    let (status, hired) = update_stage(&app, &candidate_id, "HIRED", "manager").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hired["currentStage"], "HIRED");

    // History is the exact path, ascending.
    let request = Request::builder()
        .uri(format!("/api/history/candidates/{candidate_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, history) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let stages: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["toStage"].as_str().unwrap())
        .collect();
    assert_eq!(
        stages,
        [
            "APPLIED",
            "SCREENING",
            "INTERVIEW_SCHEDULED",
            "INTERVIEW_COMPLETED",
            "HIRED"
        ]
    );
    assert!(history[0]["fromStage"].is_null());

    // Hired candidates cannot be deleted.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/candidates/{candidate_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, error) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["message"]
        .as_str()
        .unwrap()
        .contains("Cannot delete hired"));
    assert_eq!(
        error["path"].as_str().unwrap(),
        format!("/api/candidates/{candidate_id}")
    );
}

#[tokio::test]
async fn overlapping_interviews_conflict_and_adjacent_do_not() {
    let Some(app) = setup().await else { return };

    let candidate = create_candidate(
        &app,
        "Overlap Candidate",
        &format!("overlap_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();
    update_stage(&app, &candidate_id, "SCREENING", "recruiter").await;

    let interviewer = create_interviewer(
        &app,
        "Busy Interviewer",
        &format!("busy_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let base = chrono::Utc::now() + chrono::Duration::days(2);
    let (status, first) =
        schedule(&app, &candidate_id, &interviewer_id, &base.to_rfc3339(), 60).await;
    assert_eq!(status, StatusCode::CREATED);

    // Thirty minutes in: overlaps, carries the conflicting start time.
    let half_hour = (base + chrono::Duration::minutes(30)).to_rfc3339();
    let (status, conflict) =
        schedule(&app, &candidate_id, &interviewer_id, &half_hour, 60).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        conflict["metadata"]["interviewerId"].as_str().unwrap(),
        interviewer_id
    );
    assert_eq!(conflict["metadata"]["conflictTime"], first["scheduledAt"]);

    // Back-to-back at exactly +60 minutes: half-open intervals do not overlap.
    let adjacent = (base + chrono::Duration::minutes(60)).to_rfc3339();
    let (status, _) = schedule(&app, &candidate_id, &interviewer_id, &adjacent, 60).await;
    assert_eq!(status, StatusCode::CREATED);

    // A different interviewer is unaffected by the busy calendar.
    let free = create_interviewer(
        &app,
        "Free Interviewer",
        &format!("free_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let (status, _) = schedule(
        &app,
        &candidate_id,
        free["id"].as_str().unwrap(),
        &half_hour,
        60,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn illegal_and_noop_transitions_are_rejected() {
    let Some(app) = setup().await else { return };

    let candidate = create_candidate(
        &app,
        "Transition Candidate",
        &format!("transition_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();

    // APPLIED -> HIRED skips the pipeline.
    let (status, error) = update_stage(&app, &candidate_id, "HIRED", "manager").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["message"].as_str().unwrap().contains("APPLIED"));

    // APPLIED -> APPLIED is a no-op.
    let (status, _) = update_stage(&app, &candidate_id, "APPLIED", "manager").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // APPLIED -> SCREENING is legal.
    let (status, updated) = update_stage(&app, &candidate_id, "SCREENING", "manager").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["currentStage"], "SCREENING");

    // Scheduling is refused before the candidate reaches SCREENING.
    let rejected = create_candidate(
        &app,
        "Applied Only",
        &format!("applied_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let interviewer = create_interviewer(
        &app,
        "Idle Interviewer",
        &format!("idle_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let tomorrow = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
    let (status, _) = schedule(
        &app,
        rejected["id"].as_str().unwrap(),
        interviewer["id"].as_str().unwrap(),
        &tomorrow,
        60,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn feedback_constraints() {
    let Some(app) = setup().await else { return };

    let candidate = create_candidate(
        &app,
        "Feedback Candidate",
        &format!("feedback_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();
    update_stage(&app, &candidate_id, "SCREENING", "recruiter").await;

    let interviewer = create_interviewer(
        &app,
        "Panel Member",
        &format!("panel_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let tomorrow = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
    let (_, interview) = schedule(&app, &candidate_id, &interviewer_id, &tomorrow, 60).await;
    let interview_id = interview["id"].as_str().unwrap().to_string();

    let submit = |payload: JsonValue| {
        let app = app.clone();
        async move {
            let request = Request::builder()
                .method("POST")
                .uri("/api/feedback")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap();
            send(&app, request).await
        }
    };

    // Interview still SCHEDULED: invalid state.
    let valid_scores = json!({
        "interviewId": interview_id,
        "interviewerId": interviewer_id,
        "technicalScore": 4,
        "communicationScore": 4,
        "problemSolvingScore": 4,
        "recommendation": "HIRE",
    });
    let (status, _) = submit(valid_scores.clone()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/interviews/{interview_id}/status?newStatus=COMPLETED&changedBy=panel"
        ))
        .body(Body::empty())
        .unwrap();
    send(&app, request).await;

    // Score out of range.
    let mut bad = valid_scores.clone();
    bad["technicalScore"] = json!(6);
    let (status, error) = submit(bad).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error.to_string().contains("between 1 and 5"));

    // Only the interviewer of record may submit.
    let outsider = create_interviewer(
        &app,
        "Outsider",
        &format!("outsider_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let mut foreign = valid_scores.clone();
    foreign["interviewerId"] = outsider["id"].clone();
    let (status, _) = submit(foreign).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = submit(valid_scores.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    // Second submission for the same pair is a duplicate.
    let (status, _) = submit(valid_scores).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn duplicate_email_and_validation_errors() {
    let Some(app) = setup().await else { return };

    let email = format!("dup_{}@example.com", Uuid::new_v4());
    create_candidate(&app, "First", &email).await;

    let body = multipart_body(&[("name", "Second"), ("email", &email)]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/candidates")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Empty name fails field validation with the error body shape.
    let body = multipart_body(&[("name", ""), ("email", "valid@example.com")]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/candidates")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, error) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["status"], 400);
    assert_eq!(error["path"], "/api/candidates");
    assert!(error["fieldErrors"].is_array());

    // Unknown candidate id is a 404 with the same shape.
    let request = Request::builder()
        .uri(format!("/api/candidates/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();
    let (status, error) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["status"], 404);
}

#[tokio::test]
async fn reschedule_keeps_surface_status_and_full_history() {
    let Some(app) = setup().await else { return };

    let candidate = create_candidate(
        &app,
        "Resched Candidate",
        &format!("resched_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();
    update_stage(&app, &candidate_id, "SCREENING", "recruiter").await;

    let interviewer = create_interviewer(
        &app,
        "Calendar Owner",
        &format!("calendar_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let base = chrono::Utc::now() + chrono::Duration::days(3);
    let (_, interview) =
        schedule(&app, &candidate_id, &interviewer_id, &base.to_rfc3339(), 60).await;
    let interview_id = interview["id"].as_str().unwrap().to_string();

    let new_slot = (base + chrono::Duration::hours(4)).to_rfc3339();
    let encoded_slot = new_slot.replace('+', "%2B");
    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/interviews/{interview_id}/reschedule?newScheduledAt={encoded_slot}&rescheduledBy=coordinator&reason=room+change"
        ))
        .body(Body::empty())
        .unwrap();
    let (status, rescheduled) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rescheduled["currentStatus"], "SCHEDULED");

    // The audit trail keeps both transitions.
    let request = Request::builder()
        .uri(format!("/api/history/interviews/{interview_id}"))
        .body(Body::empty())
        .unwrap();
    let (_, history) = send(&app, request).await;
    let statuses: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["toStatus"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, ["SCHEDULED", "RESCHEDULED", "SCHEDULED"]);

    // The old slot is free again for this interviewer.
    let other = create_candidate(
        &app,
        "Second Candidate",
        &format!("second_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let other_id = other["id"].as_str().unwrap().to_string();
    update_stage(&app, &other_id, "SCREENING", "recruiter").await;
    let (status, _) = schedule(&app, &other_id, &interviewer_id, &base.to_rfc3339(), 60).await;
    assert_eq!(status, StatusCode::CREATED);

    // Cancelling twice is rejected.
    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/interviews/{interview_id}/cancel?cancelledBy=coordinator&reason=dropout"
        ))
        .body(Body::empty())
        .unwrap();
    let (status, cancelled) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["currentStatus"], "CANCELLED");

    let request = Request::builder()
        .method("PUT")
        .uri(format!(
            "/api/interviews/{interview_id}/cancel?cancelledBy=coordinator&reason=again"
        ))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn interviewer_deletion_rules_and_availability() {
    let Some(app) = setup().await else { return };

    let candidate = create_candidate(
        &app,
        "Avail Candidate",
        &format!("avail_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let candidate_id = candidate["id"].as_str().unwrap().to_string();
    update_stage(&app, &candidate_id, "SCREENING", "recruiter").await;

    let interviewer = create_interviewer(
        &app,
        "Busy Person",
        &format!("busyperson_{}@example.com", Uuid::new_v4()),
    )
    .await;
    let interviewer_id = interviewer["id"].as_str().unwrap().to_string();

    let base = chrono::Utc::now() + chrono::Duration::days(4);
    schedule(&app, &candidate_id, &interviewer_id, &base.to_rfc3339(), 60).await;

    // Busy during the scheduled hour.
    let start = base.to_rfc3339().replace('+', "%2B");
    let end = (base + chrono::Duration::minutes(30))
        .to_rfc3339()
        .replace('+', "%2B");
    let request = Request::builder()
        .uri(format!(
            "/api/interviewers/{interviewer_id}/available?start={start}&end={end}"
        ))
        .body(Body::empty())
        .unwrap();
    let (status, availability) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["available"], false);

    // Free outside it.
    let far_start = (base + chrono::Duration::days(1))
        .to_rfc3339()
        .replace('+', "%2B");
    let far_end = (base + chrono::Duration::days(1) + chrono::Duration::hours(1))
        .to_rfc3339()
        .replace('+', "%2B");
    let request = Request::builder()
        .uri(format!(
            "/api/interviewers/{interviewer_id}/available?start={far_start}&end={far_end}"
        ))
        .body(Body::empty())
        .unwrap();
    let (_, availability) = send(&app, request).await;
    assert_eq!(availability["available"], true);

    // Deletion is refused while interviews reference the interviewer.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/interviewers/{interviewer_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, error) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["message"].as_str().unwrap().contains("Archive"));

    // Archiving works and blocks new schedules.
    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/interviewers/{interviewer_id}/archive"))
        .body(Body::empty())
        .unwrap();
    let (status, archived) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["active"], false);

    let slot = (base + chrono::Duration::days(2)).to_rfc3339();
    let (status, _) = schedule(&app, &candidate_id, &interviewer_id, &slot, 60).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .uri("/api/dashboard")
        .body(Body::empty())
        .unwrap();
    let (status, dashboard) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(dashboard["totalCandidates"].as_i64().unwrap() >= 1);
    assert!(dashboard["hiringFunnel"]["overallConversionRate"].is_string());
}
