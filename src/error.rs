//! Error taxonomy for scheduling operations.
//!
//! Validation failures are never errors: they travel as
//! [`ValidationResult`](crate::schedule::validator::ValidationResult) data.
//! Everything here is a hard failure of the current request.

use crate::aircraft::AircraftId;
use crate::airport::AirportId;
use crate::flight::FlightId;
use crate::time::Timestamp;
use std::io;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Route, aircraft, airport, flight or regulation missing.
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// The aircraft already flies another flight inside the requested window.
    #[error(
        "aircraft {aircraft_id} is unavailable between {depart} and {arrive} (conflicts with flight {conflicting_flight})"
    )]
    AircraftConflict {
        aircraft_id: AircraftId,
        depart: Timestamp,
        arrive: Timestamp,
        conflicting_flight: FlightId,
    },

    /// A proposal reached the builder or the store in a state validation should have rejected.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("route {depart} -> {arrive} already exists")]
    DuplicateRoute { depart: AirportId, arrive: AirportId },

    #[error("malformed field '{field}': {reason}")]
    MalformedForm { field: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl ScheduleError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ScheduleError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn malformed(field: impl Into<String>, reason: impl ToString) -> Self {
        ScheduleError::MalformedForm {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Conflicts can be retried with another time or aircraft; nothing else can.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScheduleError::AircraftConflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_only_conflicts_are_retryable() {
        let at = |s| Timestamp::parse(s).unwrap();
        let conflict = ScheduleError::AircraftConflict {
            aircraft_id: Arc::from("VN-A321"),
            depart: at("2024-01-01T10:00"),
            arrive: at("2024-01-01T12:00"),
            conflicting_flight: 7,
        };
        assert!(conflict.is_retryable());
        assert_eq!(
            "aircraft VN-A321 is unavailable between 2024-01-01T10:00 and 2024-01-01T12:00 (conflicts with flight 7)",
            conflict.to_string()
        );

        let missing = ScheduleError::not_found("regulation", "max_flight_duration");
        assert!(!missing.is_retryable());
        assert_eq!("regulation 'max_flight_duration' not found", missing.to_string());
        assert!(!ScheduleError::InvariantViolation("x".into()).is_retryable());
    }
}
