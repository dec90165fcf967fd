//! The trip-day schema shared by generated itineraries and saved trips.
//!
//! A trip is a list of days; each day is a list of events. Generated output
//! and client-submitted trips go through the same checks:
//!
//! | field         | minimum length |
//! |---------------|----------------|
//! | `title`       | 3              |
//! | `description` | 5              |
//! | `address`     | 5              |
//! | `country`     | 2              |
//! | `city`        | 2              |
//! | `tickets`     | 1              |
//!
//! Lengths are counted in characters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use tripweaver_db::queries::trips::NewEvent;

/// Upper bound on the number of days a single request may ask for.
pub const MAX_TRIP_DAYS: u32 = 30;

/// Errors from validating itinerary data or a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItineraryError {
    #[error("completion is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("unexpected itinerary shape: {0}")]
    UnexpectedShape(String),

    #[error("day {day}, event {event}: {field} must be at least {min} characters long")]
    FieldTooShort {
        day: usize,
        event: usize,
        field: &'static str,
        min: usize,
    },

    #[error("expected {expected} days, got {actual}")]
    DayCount { expected: usize, actual: usize },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// One itinerary entry without any database identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub address: String,
    pub country: String,
    pub city: String,
    pub tickets: String,
}

impl EventDraft {
    /// Minimum character counts per field, in declaration order.
    const RULES: [(&'static str, usize); 6] = [
        ("title", 3),
        ("description", 5),
        ("address", 5),
        ("country", 2),
        ("city", 2),
        ("tickets", 1),
    ];

    fn field(&self, name: &str) -> &str {
        match name {
            "title" => &self.title,
            "description" => &self.description,
            "address" => &self.address,
            "country" => &self.country,
            "city" => &self.city,
            _ => &self.tickets,
        }
    }

    /// Check field lengths. `day` and `event` locate the entry in errors.
    pub fn validate(&self, day: usize, event: usize) -> Result<(), ItineraryError> {
        for (field, min) in Self::RULES {
            if self.field(field).chars().count() < min {
                return Err(ItineraryError::FieldTooShort {
                    day,
                    event,
                    field,
                    min,
                });
            }
        }
        Ok(())
    }

    /// Borrow this draft as insert parameters.
    pub fn as_new_event(&self) -> NewEvent<'_> {
        NewEvent {
            title: &self.title,
            description: &self.description,
            address: &self.address,
            country: &self.country,
            city: &self.city,
            tickets: &self.tickets,
        }
    }
}

/// One day of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDayDraft {
    pub events: Vec<EventDraft>,
}

impl TripDayDraft {
    pub fn validate(&self, day: usize) -> Result<(), ItineraryError> {
        self.events
            .iter()
            .enumerate()
            .try_for_each(|(i, event)| event.validate(day, i))
    }
}

/// Validate every event of every day.
pub fn validate_days(days: &[TripDayDraft]) -> Result<(), ItineraryError> {
    days.iter()
        .enumerate()
        .try_for_each(|(i, day)| day.validate(i))
}

/// Borrow days as insert parameters, preserving order.
pub fn as_new_days(days: &[TripDayDraft]) -> Vec<Vec<NewEvent<'_>>> {
    days.iter()
        .map(|day| day.events.iter().map(EventDraft::as_new_event).collect())
        .collect()
}

/// What a client asks the generator for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    #[serde(default)]
    pub number_of_days: u32,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
}

impl ItineraryRequest {
    pub fn new(number_of_days: u32, country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            number_of_days,
            country: country.into(),
            city: city.into(),
        }
    }

    /// Reject missing or out-of-range values.
    pub fn validate(&self) -> Result<(), ItineraryError> {
        if self.number_of_days == 0 || self.number_of_days > MAX_TRIP_DAYS {
            return Err(ItineraryError::InvalidRequest(format!(
                "numberOfDays must be between 1 and {MAX_TRIP_DAYS}"
            )));
        }
        if self.country.trim().is_empty() {
            return Err(ItineraryError::InvalidRequest(
                "country is required".to_string(),
            ));
        }
        if self.city.trim().is_empty() {
            return Err(ItineraryError::InvalidRequest("city is required".to_string()));
        }
        Ok(())
    }
}

/// Parse and validate the content of a completion.
///
/// Accepts a top-level array of days, or an object carrying that array
/// under `data` or `days`. A surrounding Markdown code fence is ignored.
/// The result must have exactly `expected_days` days.
pub fn parse_completion(
    content: &str,
    expected_days: usize,
) -> Result<Vec<TripDayDraft>, ItineraryError> {
    let body = strip_code_fence(content);
    let value: Value =
        serde_json::from_str(body).map_err(|e| ItineraryError::InvalidJson(e.to_string()))?;

    let array = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match (map.remove("data"), map.remove("days")) {
            (Some(v @ Value::Array(_)), _) | (_, Some(v @ Value::Array(_))) => v,
            _ => {
                return Err(ItineraryError::UnexpectedShape(
                    "object has no `data` or `days` array".to_string(),
                ));
            }
        },
        other => {
            return Err(ItineraryError::UnexpectedShape(format!(
                "expected an array or object, got {}",
                json_kind(&other)
            )));
        }
    };

    let days: Vec<TripDayDraft> = serde_json::from_value(array)
        .map_err(|e| ItineraryError::UnexpectedShape(e.to_string()))?;

    if days.len() != expected_days {
        return Err(ItineraryError::DayCount {
            expected: expected_days,
            actual: days.len(),
        });
    }
    validate_days(&days)?;
    Ok(days)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.split_once('\n') {
        // Drop an optional language tag on the opening line.
        Some((_, body)) => body.trim(),
        // Single-line fence: skip a tag glued to the opening fence.
        None => rest
            .find(['[', '{'])
            .map_or(rest, |start| &rest[start..])
            .trim(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
