//! The request shape of the scheduling form and the validation response.
//!
//! The form carries stopovers as positionally correlated lists
//! (`intermediateAirport[i]`, `intermediateArrivalTime[i]`,
//! `intermediateDuration[i]`). They are zipped into [`StopoverInput`]s here so
//! nothing downstream reasons about parallel indices.

use crate::airport::AirportId;
use crate::error::{ScheduleError, ScheduleResult};
use crate::flight::RouteId;
use crate::schedule::proposal::{ScheduleProposal, StopoverInput};
use crate::schedule::validator::ValidationResult;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Form values arrive either as JSON numbers or as strings.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(i64),
    Text(String),
}

impl FormValue {
    fn is_blank(&self) -> bool {
        matches!(self, FormValue::Text(s) if s.trim().is_empty())
    }

    fn to_u32(&self, field: &str) -> ScheduleResult<u32> {
        match self {
            FormValue::Number(n) => u32::try_from(*n)
                .map_err(|_| ScheduleError::malformed(field, format!("{} is not a minute count", n))),
            FormValue::Text(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|e| ScheduleError::malformed(field, format!("'{}': {}", s, e))),
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormValue::Number(n) => write!(f, "{}", n),
            FormValue::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleForm {
    #[serde(rename = "route_id", alias = "routeId")]
    pub route_id: FormValue,
    pub aircraft: FormValue,
    pub departure_date_time: String,
    pub flight_duration: FormValue,
    #[serde(default)]
    pub intermediate_airport: Vec<FormValue>,
    #[serde(default)]
    pub intermediate_arrival_time: Vec<String>,
    #[serde(default)]
    pub intermediate_duration: Vec<FormValue>,
    #[serde(default)]
    pub intermediate_notes: Vec<String>,
}

impl ScheduleForm {
    pub fn from_json(data: &str) -> ScheduleResult<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Console shorthand:
    /// `<route> <aircraft> <YYYY-MM-DDTHH:MM> <minutes> [<airport>/<arrival>/<minutes> ...]`
    pub fn from_args(args: &[&str]) -> ScheduleResult<Self> {
        let [route_id, aircraft, departure, duration, stops @ ..] = args else {
            return Err(ScheduleError::malformed(
                "arguments",
                "expected <route> <aircraft> <departure> <minutes> [<airport>/<arrival>/<minutes> ...]",
            ));
        };

        let mut form = ScheduleForm {
            route_id: FormValue::from(*route_id),
            aircraft: FormValue::from(*aircraft),
            departure_date_time: departure.to_string(),
            flight_duration: FormValue::from(*duration),
            intermediate_airport: vec![],
            intermediate_arrival_time: vec![],
            intermediate_duration: vec![],
            intermediate_notes: vec![],
        };
        for stop in stops {
            let mut parts = stop.splitn(3, '/');
            let airport = parts.next().unwrap_or_default();
            if airport.is_empty() {
                return Err(ScheduleError::malformed("intermediateAirport", "empty airport"));
            }
            // one entry per list for every stop keeps the indices aligned
            form.intermediate_airport.push(FormValue::from(airport));
            form.intermediate_arrival_time
                .push(parts.next().unwrap_or_default().to_string());
            form.intermediate_duration
                .push(FormValue::from(parts.next().unwrap_or_default()));
        }
        Ok(form)
    }

    /// Zips the positional lists into stopovers. The airport list decides how
    /// many stopovers there are; blank or absent arrival and duration entries
    /// become missing values.
    pub fn into_proposal(self) -> ScheduleResult<ScheduleProposal> {
        let route_id: RouteId = self.route_id.to_u32("route_id")?;
        let aircraft_id: Arc<str> = Arc::from(self.aircraft.to_string());
        if aircraft_id.is_empty() {
            return Err(ScheduleError::malformed("aircraft", "empty aircraft"));
        }
        let depart_time = Timestamp::parse(&self.departure_date_time)
            .map_err(|e| ScheduleError::malformed("departureDateTime", e))?;
        let flight_minutes = self.flight_duration.to_u32("flightDuration")?;

        let stopovers = self
            .intermediate_airport
            .iter()
            .enumerate()
            .map(|(i, airport)| -> ScheduleResult<StopoverInput> {
                let airport_id: AirportId = Arc::from(airport.to_string());
                let arrival_time = match self.intermediate_arrival_time.get(i) {
                    Some(raw) if !raw.trim().is_empty() => Some(
                        Timestamp::parse(raw).map_err(|e| {
                            ScheduleError::malformed(format!("intermediateArrivalTime[{}]", i), e)
                        })?,
                    ),
                    _ => None,
                };
                let ground_minutes = match self.intermediate_duration.get(i) {
                    Some(raw) if !raw.is_blank() => {
                        Some(raw.to_u32(&format!("intermediateDuration[{}]", i))?)
                    }
                    _ => None,
                };
                let note = self
                    .intermediate_notes
                    .get(i)
                    .filter(|n| !n.trim().is_empty())
                    .cloned();
                Ok(StopoverInput {
                    airport_id,
                    arrival_time,
                    ground_minutes,
                    note,
                })
            })
            .collect::<ScheduleResult<Vec<_>>>()?;

        Ok(ScheduleProposal {
            route_id,
            aircraft_id,
            depart_time,
            flight_minutes,
            stopovers,
        })
    }
}

/// `schedule/validate` response: field-keyed messages, `""` when unset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub flight_duration: String,
    pub depart_date_time: String,
    pub stopover_count: String,
    pub intermediate_airport: Vec<String>,
    pub intermediate_duration: Vec<String>,
    pub intermediate_arrival_time: Vec<String>,
    pub valid: bool,
}

fn text(message: &Option<String>) -> String {
    message.clone().unwrap_or_default()
}

impl From<&ValidationResult> for ValidationResponse {
    fn from(result: &ValidationResult) -> Self {
        ValidationResponse {
            flight_duration: text(&result.flight_duration),
            depart_date_time: text(&result.depart_time),
            stopover_count: text(&result.stopover_count),
            intermediate_airport: result.stopover_airports.iter().map(text).collect(),
            intermediate_duration: result.stopover_durations.iter().map(text).collect(),
            intermediate_arrival_time: result.stopover_arrivals.iter().map(text).collect(),
            valid: result.valid,
        }
    }
}
