use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::models::{Booking, BookingStatus};
use crate::services::mailer::EmailProvider;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Confirmation,
    StatusChange,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Confirmation => "confirmation",
            NotificationKind::StatusChange => "status_change",
        }
    }
}

/// Payload handed to the dispatcher after a booking mutation has committed.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub booking: Booking,
    pub previous_status: Option<BookingStatus>,
}

/// Fire-and-forget handle onto the notification queue. Emails are a
/// best-effort courtesy; the booking record is the source of truth, so
/// nothing here ever surfaces an error to the caller.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

pub fn notification_channel(capacity: usize) -> (Notifier, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Notifier { tx }, rx)
}

impl Notifier {
    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::error!(error = %e, "failed to enqueue notification");
        }
    }
}

/// Drains the queue for the lifetime of the process. Spawned once from main;
/// delivery failures are logged and dropped.
pub async fn run_worker(
    mut rx: mpsc::Receiver<Notification>,
    mailer: Box<dyn EmailProvider>,
    config: AppConfig,
) {
    while let Some(notification) = rx.recv().await {
        if let Err(e) = deliver(mailer.as_ref(), &config, &notification).await {
            tracing::error!(
                error = %e,
                booking_id = %notification.booking.id,
                kind = notification.kind.as_str(),
                "failed to send notification email"
            );
        }
    }
}

async fn deliver(
    mailer: &dyn EmailProvider,
    config: &AppConfig,
    notification: &Notification,
) -> anyhow::Result<()> {
    let booking = &notification.booking;
    let (subject, body) = render(notification);

    mailer
        .send_email(&booking.client_email, &subject, &body)
        .await?;

    // A client-initiated edit drops the booking back to pending, and the
    // studio is the party that needs to hear about it.
    if notification.kind == NotificationKind::StatusChange
        && booking.status == BookingStatus::Pending
    {
        let studio_subject = format!("Booking {} was modified by the client", booking.id);
        let studio_body = format!(
            "{} moved their {} booking to {} at {}. It needs re-confirmation.",
            booking.client_name,
            booking.service.display_name(),
            booking.date,
            booking.time.format("%H:%M"),
        );
        mailer
            .send_email(&config.studio_email, &studio_subject, &studio_body)
            .await?;
    }

    Ok(())
}

fn render(notification: &Notification) -> (String, String) {
    let booking = &notification.booking;
    let when = format!("{} at {}", booking.date, booking.time.format("%H:%M"));

    match notification.kind {
        NotificationKind::Confirmation => (
            "We received your booking request".to_string(),
            format!(
                "Hi {},\n\nThanks for requesting a {} session on {}. \
                 We'll confirm it shortly.\n\nThe Studio",
                booking.client_name,
                booking.service.display_name(),
                when,
            ),
        ),
        NotificationKind::StatusChange => {
            let previous = notification
                .previous_status
                .map(|s| s.as_str())
                .unwrap_or("unknown");
            let line = match booking.status {
                BookingStatus::Confirmed => "Your booking is confirmed.",
                BookingStatus::Cancelled => "Your booking has been cancelled.",
                BookingStatus::Completed => "Thanks for training with us!",
                BookingStatus::Pending => {
                    "Your booking was updated and is awaiting re-confirmation."
                }
            };
            (
                format!("Booking update: {}", booking.status.as_str()),
                format!(
                    "Hi {},\n\n{} ({} session on {}, previously {previous}).\n\nThe Studio",
                    booking.client_name,
                    line,
                    booking.service.display_name(),
                    when,
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime, Utc};

    use crate::models::ServiceType;

    fn sample_booking(status: BookingStatus) -> Booking {
        let now = Utc::now().naive_utc();
        Booking {
            id: "b-1".to_string(),
            service: ServiceType::Ems,
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 60,
            client_name: "Mario".to_string(),
            client_email: "m@x.it".to_string(),
            client_phone: None,
            message: None,
            status,
            created_at: now,
            confirmed_at: None,
            cancelled_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_confirmation_render() {
        let (subject, body) = render(&Notification {
            kind: NotificationKind::Confirmation,
            booking: sample_booking(BookingStatus::Pending),
            previous_status: None,
        });
        assert!(subject.contains("received"));
        assert!(body.contains("Mario"));
        assert!(body.contains("EMS Training"));
        assert!(body.contains("2025-03-10 at 09:00"));
    }

    #[test]
    fn test_status_change_render_includes_previous() {
        let (subject, body) = render(&Notification {
            kind: NotificationKind::StatusChange,
            booking: sample_booking(BookingStatus::Confirmed),
            previous_status: Some(BookingStatus::Pending),
        });
        assert!(subject.contains("confirmed"));
        assert!(body.contains("previously pending"));
    }
}
