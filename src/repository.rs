//! Persistence contract for routes, flights and their intermediate legs.

pub mod memory;

use crate::aircraft::{Aircraft, AircraftId};
use crate::airport::{Airport, AirportId};
use crate::error::ScheduleResult;
use crate::flight::{Flight, FlightId, IntermediateAirport, Route, RouteId};
use crate::schedule::proposal::DerivedSchedule;

/// Optional depart/arrive airport filter for route listings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteFilter {
    pub depart_airport: Option<AirportId>,
    pub arrive_airport: Option<AirportId>,
}

impl RouteFilter {
    pub fn matches(&self, route: &Route) -> bool {
        self.depart_airport
            .as_ref()
            .is_none_or(|id| *id == route.depart_airport_id)
            && self
                .arrive_airport
                .as_ref()
                .is_none_or(|id| *id == route.arrive_airport_id)
    }
}

/// One 1-based page of a listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub pages: usize,
    pub total: usize,
}

impl<T: Clone> Page<T> {
    /// Page 0 is read as page 1; pages past the end are empty.
    pub fn slice(all: &[T], page: usize, size: usize) -> Page<T> {
        let page = page.max(1);
        let size = size.max(1);
        let total = all.len();
        let items = all
            .iter()
            .skip((page - 1).saturating_mul(size))
            .take(size)
            .cloned()
            .collect();
        Page {
            items,
            page,
            pages: total.div_ceil(size),
            total,
        }
    }
}

pub trait ScheduleRepository: Send + Sync {
    fn route(&self, id: RouteId) -> ScheduleResult<Route>;

    fn aircraft(&self, id: &AircraftId) -> ScheduleResult<Aircraft>;

    fn airport(&self, id: &AirportId) -> ScheduleResult<Airport>;

    /// All airports except `exclude`, ordered by id.
    fn airports(&self, exclude: &[AirportId]) -> Vec<Airport>;

    fn aircraft_list(&self) -> Vec<Aircraft>;

    /// Rejects a route onto itself and a pair that already exists.
    fn add_route(&self, depart: &AirportId, arrive: &AirportId) -> ScheduleResult<Route>;

    fn load_routes(&self, filter: &RouteFilter, page: usize) -> Page<Route>;

    fn count_routes(&self, filter: &RouteFilter) -> usize;

    fn load_flights(&self, route_id: RouteId, page: usize) -> Page<Flight>;

    fn count_flights(&self, route_id: RouteId) -> usize;

    /// Legs of a flight in `order`.
    fn intermediate_airports(&self, flight_id: FlightId) -> Vec<IntermediateAirport>;

    /// Atomically checks that `aircraft_id` is free for the whole
    /// `[depart_time, arrive_time)` window, then writes the flight followed by
    /// its legs. Nothing is written when any step fails.
    fn save(
        &self,
        schedule: &DerivedSchedule,
        route_id: RouteId,
        aircraft_id: &AircraftId,
    ) -> ScheduleResult<Flight>;
}
