use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::handlers::bookings::BookingResponse;
use crate::services::lifecycle::{self, EditInput};
use crate::state::AppState;

static MODIFY_HTML: &str = include_str!("../web/modify.html");
static INVALID_HTML: &str = include_str!("../web/invalid.html");

// GET /modify?token=... — the public, unauthenticated modification link.
#[derive(Deserialize)]
pub struct ModifyPageQuery {
    pub token: Option<String>,
}

pub async fn modify_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ModifyPageQuery>,
) -> Response {
    let secret = match query.token.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => return (StatusCode::GONE, Html(INVALID_HTML)).into_response(),
    };

    match lifecycle::peek_modification(&state, secret) {
        Ok(_) => Html(MODIFY_HTML).into_response(),
        // The invalid page is deliberately identical for unknown, expired
        // and consumed tokens, and also fronts terminal bookings.
        Err(AppError::TokenInvalid) | Err(AppError::BookingTerminal) => {
            (StatusCode::GONE, Html(INVALID_HTML)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

// POST /api/modify
#[derive(Deserialize)]
pub struct ApplyModificationRequest {
    pub token: String,
    #[serde(flatten)]
    pub edits: EditInput,
}

pub async fn apply_modification(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ApplyModificationRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = lifecycle::apply_modification(&state, &body.token, &body.edits)?;
    Ok(Json(booking.into()))
}
