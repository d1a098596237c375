use crate::aircraft::AircraftId;
use crate::airport::AirportId;
use crate::flight::RouteId;
use crate::time::Timestamp;
use serde::Serialize;

/// One intermediate stop as submitted. Arrival and ground time are optional
/// because the positional form lists may be ragged.
#[derive(Clone, Debug, PartialEq)]
pub struct StopoverInput {
    pub airport_id: AirportId,
    pub arrival_time: Option<Timestamp>,
    pub ground_minutes: Option<u32>,
    pub note: Option<String>,
}

impl StopoverInput {
    pub fn new(airport_id: AirportId, arrival_time: Timestamp, ground_minutes: u32) -> Self {
        StopoverInput {
            airport_id,
            arrival_time: Some(arrival_time),
            ground_minutes: Some(ground_minutes),
            note: None,
        }
    }
}

/// Request-scoped schedule proposal; never persisted as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleProposal {
    pub route_id: RouteId,
    pub aircraft_id: AircraftId,
    pub depart_time: Timestamp,
    /// Minutes from departure to final arrival, ground time excluded.
    pub flight_minutes: u32,
    pub stopovers: Vec<StopoverInput>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IntermediateLeg {
    pub airport_id: AirportId,
    pub arrival_time: Timestamp,
    pub departure_time: Timestamp,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedSchedule {
    pub depart_time: Timestamp,
    pub arrive_time: Timestamp,
    pub legs: Vec<IntermediateLeg>,
}
