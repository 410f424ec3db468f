use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::bookings::BookingResponse;
use crate::models::BookingStatus;
use crate::services::lifecycle;
use crate::state::AppState;

#[allow(clippy::result_large_err)]
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), Response> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "unauthorized"})),
        )
            .into_response());
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let status_filter = query.status.as_deref();

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db, status_filter, limit)
            .map_err(|e| AppError::from(e).into_response())?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    pending: i64,
    confirmed: i64,
    cancelled: i64,
    completed: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let counts = {
        let db = state.db.lock().unwrap();
        queries::get_status_counts(&db).map_err(|e| AppError::from(e).into_response())?
    };

    Ok(Json(StatsResponse {
        pending: counts.pending,
        confirmed: counts.confirmed,
        cancelled: counts.cancelled,
        completed: counts.completed,
    }))
}

// POST /api/admin/bookings/:id/status — the staff transition boundary.
#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

pub async fn transition_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<BookingResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let target = BookingStatus::parse(&body.status).ok_or_else(|| {
        AppError::Validation(vec![format!("unknown status: {}", body.status)]).into_response()
    })?;

    let booking =
        lifecycle::transition(&state, &id, target).map_err(IntoResponse::into_response)?;
    Ok(Json(booking.into()))
}

// POST /api/admin/bookings/:id/modification-link
#[derive(Serialize)]
pub struct ModificationLinkResponse {
    link: String,
    expires_at: String,
}

pub async fn create_modification_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ModificationLinkResponse>, Response> {
    check_auth(&headers, &state.config.admin_token)?;

    let issued =
        lifecycle::request_modification(&state, &id).map_err(IntoResponse::into_response)?;

    // The plaintext secret leaves the server exactly once, inside this link.
    let link = format!(
        "{}/modify?token={}",
        state.config.public_base_url, issued.secret
    );

    Ok(Json(ModificationLinkResponse {
        link,
        expires_at: issued.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }))
}
