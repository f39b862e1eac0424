//! Booking model (owned by the booking subsystem)

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Holds a place; counted in `current_participants`
    Confirmed,
    Waitlist,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Waitlist => "waitlist",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// Error returned when a booking status name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0:?}")]
pub struct ParseBookingStatusError(pub String);

impl FromStr for BookingStatus {
    type Err = ParseBookingStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "waitlist" => Ok(BookingStatus::Waitlist),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(ParseBookingStatusError(s.to_string())),
        }
    }
}

/// A member's booking against one class occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub class_id: Uuid,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(user_id: Uuid, class_id: Uuid, status: BookingStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            class_id,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn confirmed(user_id: Uuid, class_id: Uuid) -> Self {
        Self::new(user_id, class_id, BookingStatus::Confirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_parse_back() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Waitlist,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert_eq!(
            "pending".parse::<BookingStatus>(),
            Err(ParseBookingStatusError("pending".to_string()))
        );
    }
}
