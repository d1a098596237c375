use crate::aircraft::Aircraft;
use crate::airport::Airport;
use crate::flight::Route;
use crate::regulation::{
    MAX_FLIGHT_DURATION, MAX_STOPOVER_AIRPORTS, MAX_STOPOVER_DURATION, MIN_FLIGHT_DURATION,
    MIN_STOPOVER_DURATION, Regulation, RegulationBounds,
};
use crate::repository::ScheduleRepository;
use crate::repository::memory::InMemoryRepository;
use crate::schedule::proposal::{ScheduleProposal, StopoverInput};
use crate::time::Timestamp;
use proptest::prelude::Strategy;
use proptest::prop_oneof;
use proptest::strategy::Just;
use std::sync::Arc;

pub fn id(s: &str) -> Arc<str> {
    Arc::from(s)
}

pub fn at(s: &str) -> Timestamp {
    Timestamp::parse(s).unwrap()
}

/// A "now" safely before every departure used in the tests.
pub fn now() -> Timestamp {
    at("2023-12-31T00:00")
}

pub fn bounds() -> RegulationBounds {
    RegulationBounds::new(30, 600, 20, 120, 3)
}

pub fn stopover(airport_id: &str, arrival_time: &str, ground_minutes: u32) -> StopoverInput {
    StopoverInput::new(id(airport_id), at(arrival_time), ground_minutes)
}

pub fn proposal(depart_time: &str, flight_minutes: u32, stopovers: Vec<StopoverInput>) -> ScheduleProposal {
    ScheduleProposal {
        route_id: 1,
        aircraft_id: id("VN-A321"),
        depart_time: at(depart_time),
        flight_minutes,
        stopovers,
    }
}

pub fn add_airport(repository: &InMemoryRepository, airport_id: &str, name: &str) {
    repository.insert_airport(Airport {
        id: id(airport_id),
        name: name.to_string(),
        country: "Vietnam".to_string(),
    });
}

pub fn add_aircraft(repository: &InMemoryRepository, aircraft_id: &str) {
    repository.insert_aircraft(Aircraft {
        id: id(aircraft_id),
        name: aircraft_id.to_string(),
        airline: "Vietnam Airlines".to_string(),
    });
}

pub fn add_regulation(repository: &InMemoryRepository, key: &str, value: u32) {
    repository.set_regulations(vec![Regulation {
        key: key.to_string(),
        value,
        description: String::new(),
    }]);
}

/// Airports SGN HAN DAD HUI PQC, aircraft VN-A321 and VN-A350, route 1
/// SGN -> HAN and the bounds of [`bounds`].
pub fn repository(page_size: usize) -> InMemoryRepository {
    let repository = InMemoryRepository::new(page_size);
    add_airport(&repository, "SGN", "Tan Son Nhat");
    add_airport(&repository, "HAN", "Noi Bai");
    add_airport(&repository, "DAD", "Da Nang");
    add_airport(&repository, "HUI", "Phu Bai");
    add_airport(&repository, "PQC", "Phu Quoc");
    add_aircraft(&repository, "VN-A321");
    add_aircraft(&repository, "VN-A350");

    let b = bounds();
    add_regulation(&repository, MIN_FLIGHT_DURATION, b.min_flight_duration);
    add_regulation(&repository, MAX_FLIGHT_DURATION, b.max_flight_duration);
    add_regulation(&repository, MIN_STOPOVER_DURATION, b.min_stopover_duration);
    add_regulation(&repository, MAX_STOPOVER_DURATION, b.max_stopover_duration);
    add_regulation(&repository, MAX_STOPOVER_AIRPORTS, b.max_stopover_airports);

    let route: Route = repository.add_route(&id("SGN"), &id("HAN")).unwrap();
    assert_eq!(1, route.id);
    repository
}

pub fn arb_airport() -> impl Strategy<Value = Arc<str>> {
    prop_oneof![
        Just(id("DAD")),
        Just(id("HUI")),
        Just(id("PQC")),
    ]
}

/// Stopovers with arbitrary airports, arrival offsets (minutes after
/// 2024-01-01T10:00, possibly negative) and ground durations.
pub fn arb_stopovers() -> impl Strategy<Value = Vec<StopoverInput>> {
    proptest::collection::vec((arb_airport(), -120..600i64, 0..200u32), 0..6).prop_map(|stops| {
        stops
            .into_iter()
            .map(|(airport_id, offset, ground)| {
                let arrival = Timestamp(at("2024-01-01T10:00").0 + chrono::Duration::minutes(offset));
                StopoverInput::new(airport_id, arrival, ground)
            })
            .collect()
    })
}
