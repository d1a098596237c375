use crate::aircraft::AircraftId;
use crate::airport::AirportId;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub type RouteId = u32;
pub type FlightId = u32;

/// Ordered depart/arrive airport pair, unique per pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Route {
    pub id: RouteId,
    #[tabled(rename = "depart")]
    pub depart_airport_id: AirportId,
    #[tabled(rename = "arrive")]
    pub arrive_airport_id: AirportId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Flight {
    pub id: FlightId,
    #[tabled(rename = "route")]
    pub route_id: RouteId,
    #[tabled(rename = "depart")]
    pub depart_time: Timestamp,
    #[tabled(rename = "arrive")]
    pub arrive_time: Timestamp,
    #[tabled(rename = "aircraft")]
    pub aircraft_id: AircraftId,
}

impl Flight {
    pub fn window(&self) -> (Timestamp, Timestamp) {
        (self.depart_time, self.arrive_time)
    }
}

/// Persisted stopover row, keyed by `(airport_id, flight_id, arrival_time)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct IntermediateAirport {
    #[tabled(rename = "airport")]
    pub airport_id: AirportId,
    #[tabled(rename = "flight")]
    pub flight_id: FlightId,
    #[tabled(rename = "arrival")]
    pub arrival_time: Timestamp,
    #[tabled(rename = "departure")]
    pub departure_time: Timestamp,
    pub order: u32,
}

impl IntermediateAirport {
    pub fn key(&self) -> (&AirportId, FlightId, Timestamp) {
        (&self.airport_id, self.flight_id, self.arrival_time)
    }
}
