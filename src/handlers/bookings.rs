use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::lifecycle::{self, BookingInput};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    pub id: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: i32,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
    pub confirmed_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        let fmt = |dt: chrono::NaiveDateTime| dt.format("%Y-%m-%d %H:%M:%S").to_string();
        BookingResponse {
            id: b.id,
            service: b.service.as_str().to_string(),
            date: b.date.format("%Y-%m-%d").to_string(),
            time: b.time.format("%H:%M").to_string(),
            duration_minutes: b.duration_minutes,
            client_name: b.client_name,
            client_email: b.client_email,
            client_phone: b.client_phone,
            message: b.message,
            status: b.status.as_str().to_string(),
            created_at: fmt(b.created_at),
            confirmed_at: b.confirmed_at.map(fmt),
            cancelled_at: b.cancelled_at.map(fmt),
            updated_at: fmt(b.updated_at),
        }
    }
}

// POST /api/bookings — the public creation boundary consumed by page forms.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(input): Json<BookingInput>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = lifecycle::create(&state, &input)?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}
