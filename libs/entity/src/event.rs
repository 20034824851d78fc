use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static NON_SLUG_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

#[derive(
    Debug,
    Default,
    PartialEq,
    Clone,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventMode {
    Online,
    #[default]
    Offline,
    Hybrid,
}

impl EventMode {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        value
            .parse()
            .map_err(|_| ValidationError::InvalidEnumValue {
                value: value.to_string(),
            })
    }
}

/// A validated, normalized event. `id` stays empty until the record is
/// persisted; `created_at`/`updated_at` are stamped by the store layer.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw caller input for a new event. Nothing here is trusted; the only way
/// to an [`Event`] is [`EventDraft::validate`].
#[derive(Debug, Default, Clone)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

/// Partial mutation of a persisted event. `None` leaves the stored value
/// untouched, so already-normalized fields are never reformatted.
#[derive(Debug, Default, Clone)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub image: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: Option<String>,
    pub audience: Option<String>,
    pub agenda: Option<Vec<String>>,
    pub organizer: Option<String>,
    pub tags: Option<Vec<String>>,
}

// "Rust Meetup #12!" -> "rust-meetup-12"
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RUN.replace_all(&stripped, "-");
    HYPHEN_RUN.replace_all(&hyphenated, "-").into_owned()
}

// "March 5, 2026" -> "2026-03-05"
pub fn normalize_date(raw: &str) -> Result<String, ValidationError> {
    let input = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(parsed.date_naive().format("%Y-%m-%d").to_string());
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }

    Err(ValidationError::InvalidDate {
        value: raw.to_string(),
    })
}

// "2:30 PM" -> "14:30", "9:05" -> "09:05"; seconds are dropped
pub fn normalize_time(raw: &str) -> Result<String, ValidationError> {
    let input = raw.trim();

    for fmt in ["%H:%M", "%H:%M:%S", "%I:%M %p"] {
        if let Ok(time) = NaiveTime::parse_from_str(input, fmt) {
            return Ok(time.format("%H:%M").to_string());
        }
    }

    Err(ValidationError::InvalidTime {
        value: raw.to_string(),
    })
}

impl EventDraft {
    /// The draft -> record transition. Required checks run first, then the
    /// mode parse, then slug/date/time normalization, then the collection
    /// checks. A failure at any step means no record is produced.
    pub fn validate(self) -> Result<Event, ValidationError> {
        let title = required("title", &self.title)?;
        let description = required("description", &self.description)?;
        let overview = required("overview", &self.overview)?;
        let image = required("image", &self.image)?;
        let venue = required("venue", &self.venue)?;
        let location = required("location", &self.location)?;
        let date = required("date", &self.date)?;
        let time = required("time", &self.time)?;
        let mode = required("mode", &self.mode)?;
        let audience = required("audience", &self.audience)?;
        let organizer = required("organizer", &self.organizer)?;

        let mode = EventMode::parse(&mode)?;
        let slug = slugify(&title);
        let date = normalize_date(&date)?;
        let time = normalize_time(&time)?;

        let agenda = required_items("agenda", self.agenda)?;
        let tags = required_items("tags", self.tags)?;

        Ok(Event {
            id: String::new(),
            title,
            slug,
            description,
            overview,
            image,
            venue,
            location,
            date,
            time,
            mode,
            audience,
            agenda,
            organizer,
            tags,
            created_at: DateTime::default(),
            updated_at: DateTime::default(),
        })
    }
}

impl Event {
    /// Applies a partial update, re-normalizing only the fields that
    /// actually changed: a new title regenerates the slug, a new date or
    /// time is re-normalized, everything else keeps its stored value. The
    /// record is untouched if any step fails.
    pub fn apply(
        &mut self,
        update: EventUpdate,
    ) -> Result<(), ValidationError> {
        let mut next = self.clone();

        if let Some(title) = update.title {
            next.title = required("title", &title)?;
            next.slug = slugify(&next.title);
        }
        if let Some(description) = update.description {
            next.description = required("description", &description)?;
        }
        if let Some(overview) = update.overview {
            next.overview = required("overview", &overview)?;
        }
        if let Some(image) = update.image {
            next.image = required("image", &image)?;
        }
        if let Some(venue) = update.venue {
            next.venue = required("venue", &venue)?;
        }
        if let Some(location) = update.location {
            next.location = required("location", &location)?;
        }
        if let Some(date) = update.date {
            next.date = normalize_date(&required("date", &date)?)?;
        }
        if let Some(time) = update.time {
            next.time = normalize_time(&required("time", &time)?)?;
        }
        if let Some(mode) = update.mode {
            next.mode = EventMode::parse(&required("mode", &mode)?)?;
        }
        if let Some(audience) = update.audience {
            next.audience = required("audience", &audience)?;
        }
        if let Some(agenda) = update.agenda {
            next.agenda = required_items("agenda", agenda)?;
        }
        if let Some(organizer) = update.organizer {
            next.organizer = required("organizer", &organizer)?;
        }
        if let Some(tags) = update.tags {
            next.tags = required_items("tags", tags)?;
        }

        *self = next;
        Ok(())
    }
}

pub(crate) fn required(
    field: &'static str,
    value: &str,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingRequiredField { field });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn required_items(
    field: &'static str,
    items: Vec<String>,
) -> Result<Vec<String>, ValidationError> {
    if items.is_empty() || items.iter().any(|item| item.trim().is_empty()) {
        return Err(ValidationError::EmptyCollectionField { field });
    }
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;

    fn draft() -> EventDraft {
        EventDraft {
            title: "Rust Meetup #12".to_string(),
            description: "An evening of talks".to_string(),
            overview: "Monthly community meetup".to_string(),
            image: "/images/meetup.png".to_string(),
            venue: "Community Hall".to_string(),
            location: "Berlin".to_string(),
            date: "March 5, 2026".to_string(),
            time: "6:30 PM".to_string(),
            mode: "offline".to_string(),
            audience: "Developers".to_string(),
            agenda: vec!["Doors open".to_string(), "Talks".to_string()],
            organizer: "Rust Berlin".to_string(),
            tags: vec!["rust".to_string(), "meetup".to_string()],
        }
    }

    #[test]
    fn slugify_strips_and_hyphenates() {
        assert_eq!(slugify("My Event!"), "my-event");
        assert_eq!(slugify("  Rust  Meetup #12  "), "rust-meetup-12");
        assert_eq!(slugify("Already - Hyphenated"), "already-hyphenated");
    }

    #[test]
    fn slugify_output_stays_in_slug_alphabet() {
        for title in ["Hello, World!", "A  B   C", "a---b", "Summer Fest '26"]
        {
            let slug = slugify(title);
            assert!(
                slug.chars().all(|c| c.is_ascii_lowercase()
                    || c.is_ascii_digit()
                    || c == '-'),
                "unexpected char in slug {slug:?}"
            );
            assert!(!slug.contains("--"), "consecutive hyphens in {slug:?}");
        }
    }

    #[test]
    fn slugify_is_idempotent() {
        for title in ["My Event!", "  Rust  Meetup #12  ", "plain"] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn normalize_date_accepts_common_shapes() {
        // Arrange
        let inputs = [
            "2026-03-05",
            "03/05/2026",
            "March 5, 2026",
            "Mar 5, 2026",
            "5 March 2026",
        ];

        for input in inputs {
            // Act
            let normalized = normalize_date(input).unwrap();

            // Assert
            assert_eq!(normalized, "2026-03-05");
        }
    }

    #[test]
    fn normalize_date_round_trips() {
        let normalized = normalize_date("March 5, 2026").unwrap();
        let reparsed =
            NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").unwrap();
        assert_eq!(reparsed, NaiveDate::from_ymd_opt(2026, 3, 5).unwrap());
    }

    #[test]
    fn normalize_date_rejects_garbage() {
        assert_eq!(
            normalize_date("not-a-date"),
            Err(ValidationError::InvalidDate {
                value: "not-a-date".to_string()
            })
        );
    }

    #[test]
    fn normalize_time_converts_twelve_hour_clock() {
        assert_eq!(normalize_time("2:30 PM").unwrap(), "14:30");
        assert_eq!(normalize_time("12:00 AM").unwrap(), "00:00");
        assert_eq!(normalize_time("12:15 PM").unwrap(), "12:15");
        assert_eq!(normalize_time("6:30 pm").unwrap(), "18:30");
    }

    #[test]
    fn normalize_time_pads_and_drops_seconds() {
        assert_eq!(normalize_time("9:05").unwrap(), "09:05");
        assert_eq!(normalize_time("18:45:30").unwrap(), "18:45");
    }

    #[test]
    fn normalize_time_rejects_other_shapes() {
        for input in ["not-a-time", "25:00", "6 o'clock"] {
            assert_eq!(
                normalize_time(input),
                Err(ValidationError::InvalidTime {
                    value: input.to_string()
                })
            );
        }
    }

    #[test]
    fn validate_normalizes_slug_date_and_time() {
        // Act
        let event = draft().validate().unwrap();

        // Assert
        assert_eq!(event.slug, "rust-meetup-12");
        assert_eq!(event.date, "2026-03-05");
        assert_eq!(event.time, "18:30");
        assert_eq!(event.mode, EventMode::Offline);
        assert!(event.id.is_empty());
    }

    #[test]
    fn validate_rejects_missing_title_before_normalization() {
        // A blank title and an unparseable date: the required check wins.
        let mut input = draft();
        input.title = "  ".to_string();
        input.date = "not-a-date".to_string();

        assert_eq!(
            input.validate(),
            Err(ValidationError::MissingRequiredField { field: "title" })
        );
    }

    #[test]
    fn validate_rejects_unknown_mode() {
        let mut input = draft();
        input.mode = "virtual".to_string();

        assert_eq!(
            input.validate(),
            Err(ValidationError::InvalidEnumValue {
                value: "virtual".to_string()
            })
        );
    }

    #[test]
    fn validate_rejects_empty_agenda() {
        let mut input = draft();
        input.agenda = vec![];

        assert_eq!(
            input.validate(),
            Err(ValidationError::EmptyCollectionField { field: "agenda" })
        );
    }

    #[test]
    fn validate_rejects_blank_tag_items() {
        let mut input = draft();
        input.tags = vec!["rust".to_string(), "  ".to_string()];

        assert_eq!(
            input.validate(),
            Err(ValidationError::EmptyCollectionField { field: "tags" })
        );
    }

    #[test]
    fn apply_regenerates_slug_only_when_title_changes() {
        let mut event = draft().validate().unwrap();

        event
            .apply(EventUpdate {
                title: Some("Rust Meetup #13".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(event.slug, "rust-meetup-13");
        // Untouched fields keep their stored, already-normalized values.
        assert_eq!(event.date, "2026-03-05");
        assert_eq!(event.time, "18:30");
    }

    #[test]
    fn apply_renormalizes_changed_date_only() {
        let mut event = draft().validate().unwrap();

        event
            .apply(EventUpdate {
                date: Some("04/01/2026".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(event.date, "2026-04-01");
        assert_eq!(event.slug, "rust-meetup-12");
    }

    #[test]
    fn apply_leaves_record_untouched_on_failure() {
        let mut event = draft().validate().unwrap();
        let before = event.clone();

        let result = event.apply(EventUpdate {
            title: Some("New Title".to_string()),
            time: Some("not-a-time".to_string()),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(event, before);
    }
}
