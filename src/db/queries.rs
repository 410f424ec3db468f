use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, ModificationToken, ServiceType, TokenKind};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FMT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DT_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, service, date, time, duration_minutes, client_name, client_email, client_phone, message, status, created_at, confirmed_at, cancelled_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.service.as_str(),
            booking.date.format(DATE_FMT).to_string(),
            booking.time.format(TIME_FMT).to_string(),
            booking.duration_minutes,
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.message,
            booking.status.as_str(),
            fmt_dt(&booking.created_at),
            booking.confirmed_at.as_ref().map(fmt_dt),
            booking.cancelled_at.as_ref().map(fmt_dt),
            fmt_dt(&booking.updated_at),
        ],
    )?;
    Ok(())
}

const BOOKING_COLUMNS: &str = "id, service, date, time, duration_minutes, client_name, client_email, client_phone, message, status, created_at, confirmed_at, cancelled_at, updated_at";

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 \
                 ORDER BY date DESC, time DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date DESC, time DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Sets the status plus whichever lifecycle timestamp the target status owns,
/// leaving every other column untouched.
pub fn set_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET
            status = ?1,
            confirmed_at = CASE WHEN ?1 = 'confirmed' THEN ?2 ELSE confirmed_at END,
            cancelled_at = CASE WHEN ?1 = 'cancelled' THEN ?2 ELSE cancelled_at END,
            updated_at = ?2
         WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

/// Partial update for a client modification: only date/time/message move,
/// status is forced back to pending so staff re-confirm.
pub fn apply_booking_edits(
    conn: &Connection,
    id: &str,
    date: Option<&NaiveDate>,
    time: Option<&NaiveTime>,
    message: Option<&str>,
) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE bookings SET
            date = COALESCE(?1, date),
            time = COALESCE(?2, time),
            message = COALESCE(?3, message),
            status = 'pending',
            updated_at = ?4
         WHERE id = ?5",
        params![
            date.map(|d| d.format(DATE_FMT).to_string()),
            time.map(|t| t.format(TIME_FMT).to_string()),
            message,
            now,
            id,
        ],
    )?;
    Ok(count > 0)
}

pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub completed: i64,
}

pub fn get_status_counts(conn: &Connection) -> anyhow::Result<StatusCounts> {
    let mut counts = StatusCounts {
        pending: 0,
        confirmed: 0,
        cancelled: 0,
        completed: 0,
    };

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    for row in rows {
        let (status, count) = row?;
        match status.as_str() {
            "pending" => counts.pending = count,
            "confirmed" => counts.confirmed = count,
            "cancelled" => counts.cancelled = count,
            "completed" => counts.completed = count,
            _ => {}
        }
    }
    Ok(counts)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    parse_booking_row_at(row, 0)
}

// ── Modification Tokens ──

pub fn insert_token(conn: &Connection, token: &ModificationToken) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO modification_tokens (id, digest, kind, booking_id, expires_at, consumed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            token.id,
            token.digest,
            token.kind.as_str(),
            token.booking_id,
            fmt_dt(&token.expires_at),
            token.consumed_at.as_ref().map(fmt_dt),
            fmt_dt(&token.created_at),
        ],
    )?;
    Ok(())
}

/// Finds an unconsumed, unexpired token with the given digest, joined with
/// its target booking so verification and loading are one read.
pub fn find_live_token(
    conn: &Connection,
    digest: &str,
    kind: TokenKind,
) -> anyhow::Result<Option<(ModificationToken, Booking)>> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let sql = format!(
        "SELECT t.id, t.digest, t.kind, t.booking_id, t.expires_at, t.consumed_at, t.created_at,
                b.{}
         FROM modification_tokens t
         INNER JOIN bookings b ON b.id = t.booking_id
         WHERE t.digest = ?1 AND t.kind = ?2 AND t.consumed_at IS NULL AND t.expires_at > ?3
         LIMIT 1",
        BOOKING_COLUMNS.replace(", ", ", b.")
    );

    let result = conn.query_row(&sql, params![digest, kind.as_str(), now], |row| {
        let token_kind_str: String = row.get(2)?;
        let expires_at_str: String = row.get(4)?;
        let consumed_at_str: Option<String> = row.get(5)?;
        let created_at_str: String = row.get(6)?;

        let token = ModificationToken {
            id: row.get(0)?,
            digest: row.get(1)?,
            kind: TokenKind::parse(&token_kind_str).unwrap_or(TokenKind::Modify),
            booking_id: row.get(3)?,
            expires_at: parse_dt(&expires_at_str),
            consumed_at: consumed_at_str.as_deref().map(parse_dt),
            created_at: parse_dt(&created_at_str),
        };
        Ok((token, parse_booking_row_at(row, 7)))
    });

    match result {
        Ok((token, booking)) => Ok(Some((token, booking?))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Marks a token consumed iff it has not been consumed yet. Two concurrent
/// redemptions of the same link both reach this statement, but only one
/// update affects a row; the other must be treated as an invalid token.
pub fn consume_token(conn: &Connection, token_id: &str) -> anyhow::Result<bool> {
    let now = fmt_dt(&Utc::now().naive_utc());
    let count = conn.execute(
        "UPDATE modification_tokens SET consumed_at = ?1 WHERE id = ?2 AND consumed_at IS NULL",
        params![now, token_id],
    )?;
    Ok(count > 0)
}

// parse_booking_row with the booking columns starting at an offset, for joins.
fn parse_booking_row_at(row: &rusqlite::Row, base: usize) -> anyhow::Result<Booking> {
    let id: String = row.get(base)?;
    let service_str: String = row.get(base + 1)?;
    let date_str: String = row.get(base + 2)?;
    let time_str: String = row.get(base + 3)?;
    let duration_minutes: i32 = row.get(base + 4)?;
    let client_name: String = row.get(base + 5)?;
    let client_email: String = row.get(base + 6)?;
    let client_phone: Option<String> = row.get(base + 7)?;
    let message: Option<String> = row.get(base + 8)?;
    let status_str: String = row.get(base + 9)?;
    let created_at_str: String = row.get(base + 10)?;
    let confirmed_at_str: Option<String> = row.get(base + 11)?;
    let cancelled_at_str: Option<String> = row.get(base + 12)?;
    let updated_at_str: String = row.get(base + 13)?;

    let service = ServiceType::parse(&service_str)
        .ok_or_else(|| anyhow::anyhow!("unknown service in bookings row: {service_str}"))?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| anyhow::anyhow!("unknown status in bookings row: {status_str}"))?;

    let date = NaiveDate::parse_from_str(&date_str, DATE_FMT)
        .unwrap_or_else(|_| Utc::now().date_naive());
    let time = NaiveTime::parse_from_str(&time_str, TIME_FMT)
        .unwrap_or_else(|_| NaiveTime::default());

    Ok(Booking {
        id,
        service,
        date,
        time,
        duration_minutes,
        client_name,
        client_email,
        client_phone,
        message,
        status,
        created_at: parse_dt(&created_at_str),
        confirmed_at: confirmed_at_str.as_deref().map(parse_dt),
        cancelled_at: cancelled_at_str.as_deref().map(parse_dt),
        updated_at: parse_dt(&updated_at_str),
    })
}
