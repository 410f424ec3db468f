use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub service: ServiceType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: Option<String>,
    pub message: Option<String>,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub confirmed_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Cancelled and completed bookings accept no further transitions
    /// and no new modification tokens.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Ems,
    PersonalTraining,
    SmallGroup,
    Consultation,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Ems => "ems",
            ServiceType::PersonalTraining => "personal_training",
            ServiceType::SmallGroup => "small_group",
            ServiceType::Consultation => "consultation",
        }
    }

    // Unknown services are a validation error at the creation boundary,
    // so parsing is fallible rather than defaulting.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ems" => Some(ServiceType::Ems),
            "personal_training" => Some(ServiceType::PersonalTraining),
            "small_group" => Some(ServiceType::SmallGroup),
            "consultation" => Some(ServiceType::Consultation),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceType::Ems => "EMS Training",
            ServiceType::PersonalTraining => "Personal Training",
            ServiceType::SmallGroup => "Small Group Session",
            ServiceType::Consultation => "Consultation",
        }
    }
}
