use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Local;

use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};
use crate::service::dashboard::dashboard_stats;

/// Aggregates are recomputed per request against the server's local date.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let today = Local::now().date_naive();
    let stats = dashboard_stats(state.store.as_ref(), today)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(stats)))
}
