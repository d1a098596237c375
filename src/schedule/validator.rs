//! Regulation and ordering checks over a proposal.
//!
//! Every check is recorded as an optional message per field (and per stopover
//! index) rather than raised, so the same result can drive live form feedback
//! and block a submission.

use crate::regulation::RegulationBounds;
use crate::schedule::proposal::ScheduleProposal;
use crate::time::Timestamp;
use std::collections::HashSet;

pub const INVALID_DATE_TIME: &str = "Invalid date time";
pub const DUPLICATE_AIRPORT: &str = "Duplicate Airport";
pub const INVALID_ARRIVAL_TIME: &str = "Invalid arrival time";
pub const VALUE_REQUIRED: &str = "Value is required";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub flight_duration: Option<String>,
    pub depart_time: Option<String>,
    pub stopover_count: Option<String>,
    pub stopover_airports: Vec<Option<String>>,
    pub stopover_durations: Vec<Option<String>>,
    pub stopover_arrivals: Vec<Option<String>>,
    pub valid: bool,
}

impl ValidationResult {
    /// Every message that is set, labelled with the field it belongs to.
    pub fn messages(&self) -> Vec<(String, &str)> {
        let scalars = [
            ("flight duration", &self.flight_duration),
            ("departure", &self.depart_time),
            ("stopovers", &self.stopover_count),
        ];
        let per_index = [
            ("airport", &self.stopover_airports),
            ("ground duration", &self.stopover_durations),
            ("arrival", &self.stopover_arrivals),
        ];

        let mut out: Vec<(String, &str)> = scalars
            .into_iter()
            .filter_map(|(label, msg)| msg.as_deref().map(|m| (label.to_string(), m)))
            .collect();
        for (label, list) in per_index {
            out.extend(list.iter().enumerate().filter_map(|(i, msg)| {
                msg.as_deref()
                    .map(|m| (format!("stopover {} {}", i + 1, label), m))
            }));
        }
        out
    }
}

fn within(value: u32, min: u32, max: u32) -> bool {
    value >= min && value <= max
}

pub fn validate(
    proposal: &ScheduleProposal,
    bounds: &RegulationBounds,
    now: Timestamp,
) -> ValidationResult {
    let mut result = ValidationResult::default();

    if !within(
        proposal.flight_minutes,
        bounds.min_flight_duration,
        bounds.max_flight_duration,
    ) {
        result.flight_duration = Some(format!(
            "Flight duration must be between {} - {} minutes!",
            bounds.min_flight_duration, bounds.max_flight_duration
        ));
    }

    if proposal.depart_time < now {
        result.depart_time = Some(INVALID_DATE_TIME.to_string());
    }

    if proposal.stopovers.len() > bounds.max_stopover_airports as usize {
        result.stopover_count = Some(format!(
            "At most {} stopover airports are allowed",
            bounds.max_stopover_airports
        ));
    }

    // each airport is compared only against the ones before it
    let mut seen = HashSet::new();
    for stopover in &proposal.stopovers {
        let duplicate = !seen.insert(stopover.airport_id.clone());
        result
            .stopover_airports
            .push(duplicate.then(|| DUPLICATE_AIRPORT.to_string()));

        result
            .stopover_durations
            .push(match stopover.ground_minutes {
                None => Some(VALUE_REQUIRED.to_string()),
                Some(minutes)
                    if !within(
                        minutes,
                        bounds.min_stopover_duration,
                        bounds.max_stopover_duration,
                    ) =>
                {
                    Some(format!(
                        "Value must be between {} - {}",
                        bounds.min_stopover_duration, bounds.max_stopover_duration
                    ))
                }
                Some(_) => None,
            });

        // against the raw departure, not the previous leg
        result.stopover_arrivals.push(match stopover.arrival_time {
            None => Some(VALUE_REQUIRED.to_string()),
            Some(arrival) if arrival < proposal.depart_time => {
                Some(INVALID_ARRIVAL_TIME.to_string())
            }
            Some(_) => None,
        });
    }

    result.valid = result.flight_duration.is_none()
        && result.depart_time.is_none()
        && result.stopover_count.is_none()
        && result.stopover_airports.iter().all(Option::is_none)
        && result.stopover_durations.iter().all(Option::is_none)
        && result.stopover_arrivals.iter().all(Option::is_none);

    result
}
