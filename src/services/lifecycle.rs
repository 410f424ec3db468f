use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, ModificationToken, ServiceType, TokenKind};
use crate::services::notify::{Notification, NotificationKind};
use crate::services::token;
use crate::state::AppState;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";
const DEFAULT_DURATION_MINUTES: i32 = 60;

/// The staff-driven edges of the state machine. The one remaining edge,
/// confirmed/pending back to pending, belongs to client modification and
/// never goes through `transition`.
fn is_legal_transition(from: BookingStatus, to: BookingStatus) -> bool {
    matches!(
        (from, to),
        (BookingStatus::Pending, BookingStatus::Confirmed)
            | (BookingStatus::Pending, BookingStatus::Cancelled)
            | (BookingStatus::Confirmed, BookingStatus::Completed)
    )
}

// ── Creation ──

#[derive(Debug, Clone, serde::Deserialize)]
pub struct BookingInput {
    pub service: String,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<i32>,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub message: Option<String>,
}

struct ValidatedInput {
    service: ServiceType,
    date: NaiveDate,
    time: NaiveTime,
    duration_minutes: i32,
}

/// Collects every validation problem so the form can re-render them all at
/// once, rather than failing on the first.
fn validate(input: &BookingInput, today: NaiveDate) -> Result<ValidatedInput, AppError> {
    let mut errors = vec![];

    let service = ServiceType::parse(input.service.trim());
    if service.is_none() {
        errors.push(format!("unknown service: {}", input.service));
    }

    let date = NaiveDate::parse_from_str(input.date.trim(), DATE_FMT).ok();
    match date {
        None => errors.push("date must be in YYYY-MM-DD format".to_string()),
        Some(d) if d < today => errors.push("date must not be in the past".to_string()),
        Some(_) => {}
    }

    let time = NaiveTime::parse_from_str(input.time.trim(), TIME_FMT).ok();
    if time.is_none() {
        errors.push("time must be in HH:MM format".to_string());
    }

    if input.client_name.trim().is_empty() {
        errors.push("client name is required".to_string());
    }

    let email = input.client_email.trim();
    if email.is_empty() {
        errors.push("client email is required".to_string());
    } else if !email.contains('@') {
        errors.push("client email is not valid".to_string());
    }

    let duration_minutes = input.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if duration_minutes <= 0 {
        errors.push("duration must be positive".to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(ValidatedInput {
        service: service.unwrap(),
        date: date.unwrap(),
        time: time.unwrap(),
        duration_minutes,
    })
}

pub fn create(state: &AppState, input: &BookingInput) -> Result<Booking, AppError> {
    let now = Utc::now().naive_utc();
    let validated = validate(input, now.date())?;

    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        service: validated.service,
        date: validated.date,
        time: validated.time,
        duration_minutes: validated.duration_minutes,
        client_name: input.client_name.trim().to_string(),
        client_email: input.client_email.trim().to_string(),
        client_phone: input.client_phone.as_deref().map(|p| p.trim().to_string()),
        message: input.message.clone(),
        status: BookingStatus::Pending,
        created_at: now,
        confirmed_at: None,
        cancelled_at: None,
        updated_at: now,
    };

    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }

    tracing::info!(booking_id = %booking.id, service = booking.service.as_str(), "booking created");

    state.notifier.enqueue(Notification {
        kind: NotificationKind::Confirmation,
        booking: booking.clone(),
        previous_status: None,
    });

    Ok(booking)
}

// ── Staff transitions ──

pub fn transition(
    state: &AppState,
    booking_id: &str,
    target: BookingStatus,
) -> Result<Booking, AppError> {
    let (previous, updated) = {
        let db = state.db.lock().unwrap();

        let booking = queries::get_booking_by_id(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

        if !is_legal_transition(booking.status, target) {
            return Err(AppError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        }

        // Concurrent staff edits race last-write-wins here; acceptable for a
        // low-contention admin workflow.
        queries::set_booking_status(&db, booking_id, target)?;

        let updated = queries::get_booking_by_id(&db, booking_id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
        (booking.status, updated)
    };

    tracing::info!(
        booking_id = %updated.id,
        from = previous.as_str(),
        to = target.as_str(),
        "booking transitioned"
    );

    state.notifier.enqueue(Notification {
        kind: NotificationKind::StatusChange,
        booking: updated.clone(),
        previous_status: Some(previous),
    });

    Ok(updated)
}

// ── Modification tokens ──

pub struct IssuedLink {
    pub secret: String,
    pub expires_at: NaiveDateTime,
    pub booking: Booking,
}

/// Mints a single-use modification token for a live booking and returns the
/// plaintext secret. The secret is embedded in the link sent to the client;
/// only its digest is persisted.
pub fn request_modification(state: &AppState, booking_id: &str) -> Result<IssuedLink, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, booking_id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;

    if booking.status.is_terminal() {
        return Err(AppError::BookingTerminal);
    }

    let now = Utc::now().naive_utc();
    let secret = token::issue_secret();
    let record = ModificationToken {
        id: Uuid::new_v4().to_string(),
        digest: token::digest(&secret),
        kind: TokenKind::Modify,
        booking_id: booking.id.clone(),
        expires_at: now + Duration::hours(state.config.token_ttl_hours),
        consumed_at: None,
        created_at: now,
    };
    queries::insert_token(&db, &record)?;

    tracing::info!(booking_id = %booking.id, token_id = %record.id, "modification link issued");

    Ok(IssuedLink {
        secret,
        expires_at: record.expires_at,
        booking,
    })
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct EditInput {
    pub date: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
}

struct ValidatedEdits {
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    message: Option<String>,
}

fn validate_edits(edits: &EditInput, today: NaiveDate) -> Result<ValidatedEdits, AppError> {
    let mut errors = vec![];

    let date = match &edits.date {
        None => None,
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), DATE_FMT) {
            Ok(d) if d < today => {
                errors.push("date must not be in the past".to_string());
                None
            }
            Ok(d) => Some(d),
            Err(_) => {
                errors.push("date must be in YYYY-MM-DD format".to_string());
                None
            }
        },
    };

    let time = match &edits.time {
        None => None,
        Some(raw) => match NaiveTime::parse_from_str(raw.trim(), TIME_FMT) {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push("time must be in HH:MM format".to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(ValidatedEdits {
        date,
        time,
        message: edits.message.clone(),
    })
}

/// Verifies a secret without consuming it, for rendering the modification
/// form. Invalid, expired and consumed tokens are indistinguishable from the
/// outside.
pub fn peek_modification(state: &AppState, secret: &str) -> Result<Booking, AppError> {
    let db = state.db.lock().unwrap();

    let (_, booking) = queries::find_live_token(&db, &token::digest(secret), TokenKind::Modify)?
        .ok_or(AppError::TokenInvalid)?;

    if booking.status.is_terminal() {
        return Err(AppError::BookingTerminal);
    }

    Ok(booking)
}

/// Redeems a modification link: consumes the token and applies the edits in
/// one transaction, then resets the booking to pending for re-confirmation.
pub fn apply_modification(
    state: &AppState,
    secret: &str,
    edits: &EditInput,
) -> Result<Booking, AppError> {
    let now = Utc::now().naive_utc();
    let validated = validate_edits(edits, now.date())?;
    let digest = token::digest(secret);

    let (previous, updated) = {
        let mut db = state.db.lock().unwrap();

        let (token_record, booking) =
            queries::find_live_token(&db, &digest, TokenKind::Modify)?
                .ok_or(AppError::TokenInvalid)?;

        // Terminal bookings reject the edit but leave the token unconsumed,
        // so the error message can point the client at the studio instead.
        if booking.status.is_terminal() {
            return Err(AppError::BookingTerminal);
        }

        let tx = db.transaction()?;

        // The conditional update is the single-use gate: of two concurrent
        // redemptions, exactly one affects a row.
        if !queries::consume_token(&tx, &token_record.id)? {
            return Err(AppError::TokenInvalid);
        }

        queries::apply_booking_edits(
            &tx,
            &booking.id,
            validated.date.as_ref(),
            validated.time.as_ref(),
            validated.message.as_deref(),
        )?;

        tx.commit()?;

        let updated = queries::get_booking_by_id(&db, &booking.id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {}", booking.id)))?;
        (booking.status, updated)
    };

    tracing::info!(
        booking_id = %updated.id,
        previous = previous.as_str(),
        "booking modified via link"
    );

    state.notifier.enqueue(Notification {
        kind: NotificationKind::StatusChange,
        booking: updated.clone(),
        previous_status: Some(previous),
    });

    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(is_legal_transition(
            BookingStatus::Pending,
            BookingStatus::Confirmed
        ));
        assert!(is_legal_transition(
            BookingStatus::Pending,
            BookingStatus::Cancelled
        ));
        assert!(is_legal_transition(
            BookingStatus::Confirmed,
            BookingStatus::Completed
        ));
    }

    #[test]
    fn test_transition_table_is_closed() {
        let all = [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ];
        let legal = [
            (BookingStatus::Pending, BookingStatus::Confirmed),
            (BookingStatus::Pending, BookingStatus::Cancelled),
            (BookingStatus::Confirmed, BookingStatus::Completed),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    is_legal_transition(from, to),
                    legal.contains(&(from, to)),
                    "unexpected legality for {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let input = BookingInput {
            service: "yoga".to_string(),
            date: "not-a-date".to_string(),
            time: "99:99".to_string(),
            duration_minutes: None,
            client_name: "".to_string(),
            client_email: "no-at-sign".to_string(),
            client_phone: None,
            message: None,
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        match validate(&input, today) {
            Err(AppError::Validation(errors)) => assert_eq!(errors.len(), 5),
            Err(e) => panic!("expected validation failure, got {e:?}"),
            Ok(_) => panic!("expected validation failure, got success"),
        }
    }

    #[test]
    fn test_validate_rejects_past_date() {
        let input = BookingInput {
            service: "ems".to_string(),
            date: "2024-12-31".to_string(),
            time: "09:00".to_string(),
            duration_minutes: None,
            client_name: "Mario".to_string(),
            client_email: "m@x.it".to_string(),
            client_phone: None,
            message: None,
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(matches!(
            validate(&input, today),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_accepts_today() {
        let input = BookingInput {
            service: "ems".to_string(),
            date: "2025-01-01".to_string(),
            time: "09:00".to_string(),
            duration_minutes: Some(30),
            client_name: "Mario".to_string(),
            client_email: "m@x.it".to_string(),
            client_phone: None,
            message: None,
        };
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(validate(&input, today).is_ok());
    }

    #[test]
    fn test_validate_edits_partial() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let edits = EditInput {
            date: Some("2025-03-12".to_string()),
            time: None,
            message: None,
        };
        let validated = validate_edits(&edits, today).unwrap();
        assert_eq!(
            validated.date,
            Some(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap())
        );
        assert!(validated.time.is_none());
    }
}
