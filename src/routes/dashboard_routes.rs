use crate::error::Result;
use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn get_dashboard(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let dashboard = state.dashboard_service.dashboard().await?;
    Ok(Json(dashboard))
}
