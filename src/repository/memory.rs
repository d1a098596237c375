//! In-memory repository seeded from a JSON scenario file.
//!
//! All tables live behind one mutex. Writes that span several rows go through
//! a [`Transaction`], which holds the lock for its whole lifetime and stages
//! rows until [`Transaction::commit`]; dropping it uncommitted discards them.

use crate::aircraft::{Aircraft, AircraftId};
use crate::airport::{Airport, AirportId};
use crate::error::{ScheduleError, ScheduleResult};
use crate::flight::{Flight, FlightId, IntermediateAirport, Route, RouteId};
use crate::regulation::{Regulation, RegulationBounds, RegulationStore};
use crate::repository::{Page, RouteFilter, ScheduleRepository};
use crate::schedule::proposal::DerivedSchedule;
use crate::time::Timestamp;
use parking_lot::{Mutex, MutexGuard};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Default)]
struct Tables {
    airports: BTreeMap<AirportId, Airport>,
    aircraft: BTreeMap<AircraftId, Aircraft>,
    routes: Vec<Route>,
    flights: Vec<Flight>,
    legs: Vec<IntermediateAirport>,
    regulations: BTreeMap<String, Regulation>,
}

impl Tables {
    fn next_route_id(&self) -> RouteId {
        self.routes.iter().map(|r| r.id).max().unwrap_or(0) + 1
    }

    fn next_flight_id(&self) -> FlightId {
        self.flights.iter().map(|f| f.id).max().unwrap_or(0) + 1
    }
}

#[derive(Deserialize)]
struct Scenario {
    airports: Vec<Airport>,
    aircraft: Vec<Aircraft>,
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    regulations: Vec<Regulation>,
    #[serde(default)]
    flights: Vec<Flight>,
    #[serde(default)]
    intermediate_airports: Vec<IntermediateAirport>,
}

pub struct InMemoryRepository {
    tables: Mutex<Tables>,
    page_size: usize,
}

impl InMemoryRepository {
    pub fn new(page_size: usize) -> Self {
        InMemoryRepository {
            tables: Mutex::new(Tables::default()),
            page_size: page_size.max(1),
        }
    }

    pub fn load_from_file(path: &Path, page_size: usize) -> ScheduleResult<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data, page_size)
    }

    pub fn from_json(data: &str, page_size: usize) -> ScheduleResult<Self> {
        let raw: Scenario = serde_json::from_str(data)?;
        let repository = InMemoryRepository::new(page_size);
        raw.airports.into_iter().for_each(|a| repository.insert_airport(a));
        raw.aircraft.into_iter().for_each(|a| repository.insert_aircraft(a));
        repository.set_regulations(raw.regulations);
        {
            let mut tables = repository.tables.lock();
            for route in raw.routes {
                check_route(&tables, &route.depart_airport_id, &route.arrive_airport_id)?;
                if tables.routes.iter().any(|r| r.id == route.id) {
                    return Err(ScheduleError::Config(format!(
                        "scenario defines route {} twice",
                        route.id
                    )));
                }
                tables.routes.push(route);
            }
        }
        if let Some(orphan) = raw
            .intermediate_airports
            .iter()
            .find(|l| !raw.flights.iter().any(|f| f.id == l.flight_id))
        {
            return Err(ScheduleError::Config(format!(
                "scenario stop at {} refers to unknown flight {}",
                orphan.airport_id, orphan.flight_id
            )));
        }
        for flight in raw.flights {
            let legs: Vec<IntermediateAirport> = raw
                .intermediate_airports
                .iter()
                .filter(|l| l.flight_id == flight.id)
                .cloned()
                .collect();
            repository.insert_flight(flight, legs)?;
        }
        Ok(repository)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn insert_airport(&self, airport: Airport) {
        self.tables.lock().airports.insert(airport.id.clone(), airport);
    }

    pub fn insert_aircraft(&self, aircraft: Aircraft) {
        self.tables
            .lock()
            .aircraft
            .insert(aircraft.id.clone(), aircraft);
    }

    /// Replaces several regulations at once; readers see all or none of them.
    pub fn set_regulations(&self, regulations: Vec<Regulation>) {
        let mut tables = self.tables.lock();
        for regulation in regulations {
            tables.regulations.insert(regulation.key.clone(), regulation);
        }
    }

    /// Inserts an already scheduled flight with its legs, subject to the same
    /// checks as [`ScheduleRepository::save`] except that the id is kept.
    pub fn insert_flight(
        &self,
        flight: Flight,
        legs: Vec<IntermediateAirport>,
    ) -> ScheduleResult<()> {
        let mut tx = self.begin();
        tx.check_references(flight.route_id, &flight.aircraft_id)?;
        if tx.tables.flights.iter().any(|f| f.id == flight.id) {
            return Err(ScheduleError::InvariantViolation(format!(
                "flight {} already exists",
                flight.id
            )));
        }
        tx.check_availability(&flight.aircraft_id, flight.depart_time, flight.arrive_time)?;
        tx.stage_flight(flight)?;
        for leg in legs {
            tx.stage_leg(leg)?;
        }
        tx.commit();
        Ok(())
    }

    pub fn flight_count(&self) -> usize {
        self.tables.lock().flights.len()
    }

    pub fn leg_count(&self) -> usize {
        self.tables.lock().legs.len()
    }

    fn begin(&self) -> Transaction<'_> {
        Transaction {
            tables: self.tables.lock(),
            flights: vec![],
            legs: vec![],
        }
    }
}

fn check_route(tables: &Tables, depart: &AirportId, arrive: &AirportId) -> ScheduleResult<()> {
    for id in [depart, arrive] {
        if !tables.airports.contains_key(id) {
            return Err(ScheduleError::not_found("airport", id));
        }
    }
    if depart == arrive {
        return Err(ScheduleError::InvariantViolation(format!(
            "route cannot depart from and arrive at {}",
            depart
        )));
    }
    if tables
        .routes
        .iter()
        .any(|r| r.depart_airport_id == *depart && r.arrive_airport_id == *arrive)
    {
        return Err(ScheduleError::DuplicateRoute {
            depart: depart.clone(),
            arrive: arrive.clone(),
        });
    }
    Ok(())
}

/// Exclusive access to the tables with staged, not yet visible, rows.
pub struct Transaction<'a> {
    tables: MutexGuard<'a, Tables>,
    flights: Vec<Flight>,
    legs: Vec<IntermediateAirport>,
}

impl Transaction<'_> {
    fn check_references(&self, route_id: RouteId, aircraft_id: &AircraftId) -> ScheduleResult<()> {
        if !self.tables.routes.iter().any(|r| r.id == route_id) {
            return Err(ScheduleError::not_found("route", route_id));
        }
        if !self.tables.aircraft.contains_key(aircraft_id) {
            return Err(ScheduleError::not_found("aircraft", aircraft_id));
        }
        Ok(())
    }

    fn check_availability(
        &self,
        aircraft_id: &AircraftId,
        depart: Timestamp,
        arrive: Timestamp,
    ) -> ScheduleResult<()> {
        let conflict = self
            .tables
            .flights
            .iter()
            .chain(self.flights.iter())
            .filter(|f| f.aircraft_id == *aircraft_id)
            .find(|f| Timestamp::is_overlapping(&(depart, arrive), &f.window()));
        match conflict {
            Some(existing) => {
                warn!(
                    aircraft = %aircraft_id,
                    %depart,
                    %arrive,
                    conflicting_flight = existing.id,
                    "aircraft unavailable"
                );
                Err(ScheduleError::AircraftConflict {
                    aircraft_id: aircraft_id.clone(),
                    depart,
                    arrive,
                    conflicting_flight: existing.id,
                })
            }
            None => Ok(()),
        }
    }

    fn next_flight_id(&self) -> FlightId {
        let staged = self.flights.iter().map(|f| f.id).max().unwrap_or(0);
        self.tables.next_flight_id().max(staged + 1)
    }

    fn stage_flight(&mut self, flight: Flight) -> ScheduleResult<()> {
        if flight.depart_time >= flight.arrive_time {
            return Err(ScheduleError::InvariantViolation(format!(
                "flight {} departs at {} but arrives at {}",
                flight.id, flight.depart_time, flight.arrive_time
            )));
        }
        self.flights.push(flight);
        Ok(())
    }

    fn stage_leg(&mut self, leg: IntermediateAirport) -> ScheduleResult<()> {
        if !self.tables.airports.contains_key(&leg.airport_id) {
            return Err(ScheduleError::not_found("airport", &leg.airport_id));
        }
        if !self.flights.iter().any(|f| f.id == leg.flight_id) {
            return Err(ScheduleError::InvariantViolation(format!(
                "leg at {} refers to flight {} outside this transaction",
                leg.airport_id, leg.flight_id
            )));
        }
        if self
            .tables
            .legs
            .iter()
            .chain(self.legs.iter())
            .any(|l| l.key() == leg.key())
        {
            return Err(ScheduleError::InvariantViolation(format!(
                "flight {} already stops at {} arriving {}",
                leg.flight_id, leg.airport_id, leg.arrival_time
            )));
        }
        self.legs.push(leg);
        Ok(())
    }

    fn commit(mut self) {
        let flights = std::mem::take(&mut self.flights);
        let legs = std::mem::take(&mut self.legs);
        self.tables.flights.extend(flights);
        self.tables.legs.extend(legs);
    }
}

/// Regulation reads against tables whose lock is already held.
struct TablesView<'a>(&'a Tables);

impl RegulationStore for TablesView<'_> {
    fn get_bound(&self, name: &str) -> ScheduleResult<u32> {
        self.0
            .regulations
            .get(name)
            .map(|r| r.value)
            .ok_or_else(|| ScheduleError::not_found("regulation", name))
    }

    fn regulations(&self) -> Vec<Regulation> {
        self.0.regulations.values().cloned().collect()
    }
}

impl RegulationStore for InMemoryRepository {
    fn get_bound(&self, name: &str) -> ScheduleResult<u32> {
        TablesView(&self.tables.lock()).get_bound(name)
    }

    fn regulations(&self) -> Vec<Regulation> {
        TablesView(&self.tables.lock()).regulations()
    }

    fn bounds(&self) -> ScheduleResult<RegulationBounds> {
        let tables = self.tables.lock();
        RegulationBounds::load(&TablesView(&tables))
    }
}

impl ScheduleRepository for InMemoryRepository {
    fn route(&self, id: RouteId) -> ScheduleResult<Route> {
        self.tables
            .lock()
            .routes
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ScheduleError::not_found("route", id))
    }

    fn aircraft(&self, id: &AircraftId) -> ScheduleResult<Aircraft> {
        self.tables
            .lock()
            .aircraft
            .get(id)
            .cloned()
            .ok_or_else(|| ScheduleError::not_found("aircraft", id))
    }

    fn airport(&self, id: &AirportId) -> ScheduleResult<Airport> {
        self.tables
            .lock()
            .airports
            .get(id)
            .cloned()
            .ok_or_else(|| ScheduleError::not_found("airport", id))
    }

    fn airports(&self, exclude: &[AirportId]) -> Vec<Airport> {
        let excluded: HashSet<&AirportId> = exclude.iter().collect();
        self.tables
            .lock()
            .airports
            .values()
            .filter(|a| !excluded.contains(&a.id))
            .cloned()
            .collect()
    }

    fn aircraft_list(&self) -> Vec<Aircraft> {
        self.tables.lock().aircraft.values().cloned().collect()
    }

    fn add_route(&self, depart: &AirportId, arrive: &AirportId) -> ScheduleResult<Route> {
        let mut tables = self.tables.lock();
        check_route(&tables, depart, arrive)?;
        let route = Route {
            id: tables.next_route_id(),
            depart_airport_id: depart.clone(),
            arrive_airport_id: arrive.clone(),
        };
        tables.routes.push(route.clone());
        info!(route = route.id, %depart, %arrive, "route added");
        Ok(route)
    }

    fn load_routes(&self, filter: &RouteFilter, page: usize) -> Page<Route> {
        let tables = self.tables.lock();
        let mut routes: Vec<Route> = tables
            .routes
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        routes.sort_by_key(|r| r.id);
        Page::slice(&routes, page, self.page_size)
    }

    fn count_routes(&self, filter: &RouteFilter) -> usize {
        self.tables
            .lock()
            .routes
            .iter()
            .filter(|r| filter.matches(r))
            .count()
    }

    fn load_flights(&self, route_id: RouteId, page: usize) -> Page<Flight> {
        let tables = self.tables.lock();
        let mut flights: Vec<Flight> = tables
            .flights
            .iter()
            .filter(|f| f.route_id == route_id)
            .cloned()
            .collect();
        flights.sort_by_key(|f| (f.depart_time, f.id));
        Page::slice(&flights, page, self.page_size)
    }

    fn count_flights(&self, route_id: RouteId) -> usize {
        self.tables
            .lock()
            .flights
            .iter()
            .filter(|f| f.route_id == route_id)
            .count()
    }

    fn intermediate_airports(&self, flight_id: FlightId) -> Vec<IntermediateAirport> {
        let mut legs: Vec<IntermediateAirport> = self
            .tables
            .lock()
            .legs
            .iter()
            .filter(|l| l.flight_id == flight_id)
            .cloned()
            .collect();
        legs.sort_by_key(|l| l.order);
        legs
    }

    fn save(
        &self,
        schedule: &DerivedSchedule,
        route_id: RouteId,
        aircraft_id: &AircraftId,
    ) -> ScheduleResult<Flight> {
        let mut tx = self.begin();
        tx.check_references(route_id, aircraft_id)?;
        tx.check_availability(aircraft_id, schedule.depart_time, schedule.arrive_time)?;

        let flight = Flight {
            id: tx.next_flight_id(),
            route_id,
            depart_time: schedule.depart_time,
            arrive_time: schedule.arrive_time,
            aircraft_id: aircraft_id.clone(),
        };
        tx.stage_flight(flight.clone())?;
        for leg in &schedule.legs {
            tx.stage_leg(IntermediateAirport {
                airport_id: leg.airport_id.clone(),
                flight_id: flight.id,
                arrival_time: leg.arrival_time,
                departure_time: leg.departure_time,
                order: leg.order,
            })?;
        }
        tx.commit();

        info!(
            flight = flight.id,
            route = route_id,
            aircraft = %aircraft_id,
            depart = %flight.depart_time,
            arrive = %flight.arrive_time,
            "flight scheduled"
        );
        debug!(flight = flight.id, legs = schedule.legs.len(), "legs persisted");
        Ok(flight)
    }
}
