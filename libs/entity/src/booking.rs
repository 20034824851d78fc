use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::event::required;

// Permissive local@domain.tld shape, not RFC 5322. Kept loose on purpose;
// the store accepts anything that passes this.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

/// A reservation against an event. `event_id` is a weak reference: its
/// existence is checked at write time only, never enforced afterwards.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct BookingDraft {
    pub event_id: String,
    pub email: String,
}

impl BookingDraft {
    /// Trims and lower-cases the email before the shape check. Whether the
    /// referenced event exists is the store layer's question.
    pub fn validate(self) -> Result<Booking, ValidationError> {
        let event_id = required("event_id", &self.event_id)?;
        let email = required("email", &self.email)?.to_lowercase();

        if !is_valid_email(&email) {
            return Err(ValidationError::InvalidEmail { value: email });
        }

        Ok(Booking {
            id: String::new(),
            event_id,
            email,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        })
    }
}
