//! Gym member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member who books classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Lifetime count of non-cancelled bookings; never negative
    pub total_bookings: u32,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email: None,
            total_bookings: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: String) -> Self {
        self.email = Some(email);
        self
    }
}
