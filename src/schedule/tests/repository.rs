use crate::error::ScheduleError;
use crate::regulation::{
    MAX_FLIGHT_DURATION, MAX_STOPOVER_AIRPORTS, MAX_STOPOVER_DURATION, MIN_FLIGHT_DURATION,
    MIN_STOPOVER_DURATION, Regulation, RegulationBounds, RegulationStore,
};
use crate::repository::memory::InMemoryRepository;
use crate::repository::{RouteFilter, ScheduleRepository};
use crate::schedule::builder::build;
use crate::schedule::proposal::{DerivedSchedule, IntermediateLeg};
use crate::schedule::tests::utils::{at, id, proposal, repository, stopover};
use std::sync::Arc;
use std::thread;

fn window(depart: &str, arrive: &str) -> DerivedSchedule {
    DerivedSchedule {
        depart_time: at(depart),
        arrive_time: at(arrive),
        legs: vec![],
    }
}

#[test]
fn test_save_persists_flight_then_legs() {
    let repository = repository(10);
    let schedule = build(&proposal(
        "2024-01-01T10:00",
        120,
        vec![
            stopover("DAD", "2024-01-01T11:00", 30),
            stopover("HUI", "2024-01-01T12:00", 45),
        ],
    ))
    .unwrap();

    let flight = repository.save(&schedule, 1, &id("VN-A321")).unwrap();
    assert_eq!(1, flight.id);
    assert_eq!(at("2024-01-01T13:15"), flight.arrive_time);

    let legs = repository.intermediate_airports(flight.id);
    assert_eq!(2, legs.len());
    assert_eq!((&id("DAD"), 1, at("2024-01-01T11:00")), legs[0].key());
    assert_eq!(1, legs[0].order);
    assert_eq!(at("2024-01-01T12:45"), legs[1].departure_time);
    assert_eq!(2, legs[1].order);

    let second = repository
        .save(&window("2024-01-02T10:00", "2024-01-02T12:00"), 1, &id("VN-A321"))
        .unwrap();
    assert_eq!(2, second.id);
}

#[test]
fn test_overlap_conflicts() {
    let repository = repository(10);
    repository
        .save(&window("2024-01-01T10:00", "2024-01-01T12:00"), 1, &id("VN-A321"))
        .unwrap();

    let result = repository.save(
        &window("2024-01-01T11:00", "2024-01-01T13:00"),
        1,
        &id("VN-A321"),
    );
    match result {
        Err(e @ ScheduleError::AircraftConflict { .. }) => {
            assert!(e.is_retryable());
            if let ScheduleError::AircraftConflict {
                conflicting_flight, ..
            } = e
            {
                assert_eq!(1, conflicting_flight);
            }
        }
        other => panic!("expected AircraftConflict, got {:?}", other),
    }

    // enclosing window
    assert!(matches!(
        repository.save(&window("2024-01-01T09:00", "2024-01-01T13:00"), 1, &id("VN-A321")),
        Err(ScheduleError::AircraftConflict { .. })
    ));
    // another aircraft is free
    assert!(
        repository
            .save(&window("2024-01-01T11:00", "2024-01-01T13:00"), 1, &id("VN-A350"))
            .is_ok()
    );
    assert_eq!(2, repository.flight_count());
}

#[test]
fn test_back_to_back_flights_do_not_conflict() {
    let repository = repository(10);
    repository
        .save(&window("2024-01-01T10:00", "2024-01-01T12:00"), 1, &id("VN-A321"))
        .unwrap();
    repository
        .save(&window("2024-01-01T12:00", "2024-01-01T14:00"), 1, &id("VN-A321"))
        .unwrap();
    repository
        .save(&window("2024-01-01T08:00", "2024-01-01T10:00"), 1, &id("VN-A321"))
        .unwrap();
    assert_eq!(3, repository.flight_count());
}

#[test]
fn test_failed_save_writes_nothing() {
    let repository = repository(10);
    let leg = |airport: &str, order| IntermediateLeg {
        airport_id: id(airport),
        arrival_time: at("2024-01-01T11:00"),
        departure_time: at("2024-01-01T11:30"),
        order,
    };
    // same airport and arrival twice collides on the leg key after the flight row is staged
    let schedule = DerivedSchedule {
        depart_time: at("2024-01-01T10:00"),
        arrive_time: at("2024-01-01T13:00"),
        legs: vec![leg("DAD", 1), leg("DAD", 2)],
    };
    assert!(matches!(
        repository.save(&schedule, 1, &id("VN-A321")),
        Err(ScheduleError::InvariantViolation(_))
    ));
    assert_eq!(0, repository.flight_count());
    assert_eq!(0, repository.leg_count());

    let unknown_airport = DerivedSchedule {
        legs: vec![leg("XXX", 1)],
        ..schedule.clone()
    };
    assert!(matches!(
        repository.save(&unknown_airport, 1, &id("VN-A321")),
        Err(ScheduleError::NotFound { entity: "airport", .. })
    ));
    assert_eq!(0, repository.flight_count());

    let backwards = window("2024-01-01T10:00", "2024-01-01T10:00");
    assert!(matches!(
        repository.save(&backwards, 1, &id("VN-A321")),
        Err(ScheduleError::InvariantViolation(_))
    ));
    assert_eq!(0, repository.flight_count());

    // the lock was released and the aircraft is still free
    let single = DerivedSchedule {
        legs: vec![leg("DAD", 1)],
        ..schedule
    };
    assert!(repository.save(&single, 1, &id("VN-A321")).is_ok());
    assert_eq!(1, repository.leg_count());
}

#[test]
fn test_save_unknown_references() {
    let repository = repository(10);
    let schedule = window("2024-01-01T10:00", "2024-01-01T12:00");
    assert!(matches!(
        repository.save(&schedule, 42, &id("VN-A321")),
        Err(ScheduleError::NotFound { entity: "route", .. })
    ));
    assert!(matches!(
        repository.save(&schedule, 1, &id("VN-B787")),
        Err(ScheduleError::NotFound { entity: "aircraft", .. })
    ));
}

#[test]
fn test_concurrent_saves_for_one_aircraft() {
    let repository = Arc::new(repository(10));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let repository = Arc::clone(&repository);
            thread::spawn(move || {
                // all windows overlap 11:00-12:00
                let depart = at("2024-01-01T10:00") + i * 5;
                let schedule = DerivedSchedule {
                    depart_time: depart,
                    arrive_time: depart + 120,
                    legs: vec![],
                };
                repository.save(&schedule, 1, &id("VN-A321"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(1, results.iter().filter(|r| r.is_ok()).count());
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.is_retryable())
    );
    assert_eq!(1, repository.flight_count());
}

#[test]
fn test_routes_pagination_and_filters() {
    let repository = repository(2);
    for (depart, arrive) in [("HAN", "SGN"), ("SGN", "DAD"), ("DAD", "SGN"), ("SGN", "PQC")] {
        repository.add_route(&id(depart), &id(arrive)).unwrap();
    }

    let all = RouteFilter::default();
    assert_eq!(5, repository.count_routes(&all));
    let page = repository.load_routes(&all, 3);
    assert_eq!(3, page.pages);
    assert_eq!(vec![5], page.items.iter().map(|r| r.id).collect::<Vec<_>>());

    let from_sgn = RouteFilter {
        depart_airport: Some(id("SGN")),
        arrive_airport: None,
    };
    assert_eq!(3, repository.count_routes(&from_sgn));
    let page = repository.load_routes(&from_sgn, 1);
    assert_eq!(vec![1, 3], page.items.iter().map(|r| r.id).collect::<Vec<_>>());
    assert_eq!(2, page.pages);

    let to_sgn = RouteFilter {
        depart_airport: None,
        arrive_airport: Some(id("SGN")),
    };
    assert_eq!(2, repository.count_routes(&to_sgn));
}

#[test]
fn test_add_route_rejections() {
    let repository = repository(10);
    assert!(matches!(
        repository.add_route(&id("SGN"), &id("HAN")),
        Err(ScheduleError::DuplicateRoute { .. })
    ));
    assert!(matches!(
        repository.add_route(&id("SGN"), &id("SGN")),
        Err(ScheduleError::InvariantViolation(_))
    ));
    assert!(matches!(
        repository.add_route(&id("SGN"), &id("XXX")),
        Err(ScheduleError::NotFound { entity: "airport", .. })
    ));
    assert_eq!(2, repository.add_route(&id("HAN"), &id("SGN")).unwrap().id);
}

#[test]
fn test_flights_pagination_per_route() {
    let repository = repository(2);
    repository.add_route(&id("HAN"), &id("SGN")).unwrap();
    for day in 1..=3 {
        let depart = format!("2024-01-0{}T10:00", day);
        let arrive = format!("2024-01-0{}T12:00", day);
        repository.save(&window(&depart, &arrive), 1, &id("VN-A321")).unwrap();
    }
    repository
        .save(&window("2024-01-05T10:00", "2024-01-05T12:00"), 2, &id("VN-A321"))
        .unwrap();

    assert_eq!(3, repository.count_flights(1));
    assert_eq!(1, repository.count_flights(2));
    let page = repository.load_flights(1, 2);
    assert_eq!(2, page.pages);
    assert_eq!(at("2024-01-03T10:00"), page.items[0].depart_time);
    assert!(repository.load_flights(7, 1).items.is_empty());
}

#[test]
fn test_airports_excluding_route_endpoints() {
    let repository = repository(10);
    let route = repository.route(1).unwrap();
    let ids: Vec<String> = repository
        .airports(&[route.depart_airport_id, route.arrive_airport_id])
        .iter()
        .map(|a| a.id.to_string())
        .collect();
    assert_eq!(vec!["DAD", "HUI", "PQC"], ids);
    assert_eq!(5, repository.airports(&[]).len());
}

#[test]
fn test_regulation_lookup() {
    let repository = repository(10);
    assert_eq!(600, repository.get_bound(MAX_FLIGHT_DURATION).unwrap());
    assert!(matches!(
        repository.get_bound("max_passengers"),
        Err(ScheduleError::NotFound { entity: "regulation", .. })
    ));
    assert_eq!(5, repository.regulations().len());
}

#[test]
fn test_bounds_snapshot_is_never_mixed() {
    let relaxed = RegulationBounds::new(30, 600, 20, 120, 3);
    let strict = RegulationBounds::new(60, 300, 30, 60, 1);
    let as_rows = |b: RegulationBounds| {
        [
            (MIN_FLIGHT_DURATION, b.min_flight_duration),
            (MAX_FLIGHT_DURATION, b.max_flight_duration),
            (MIN_STOPOVER_DURATION, b.min_stopover_duration),
            (MAX_STOPOVER_DURATION, b.max_stopover_duration),
            (MAX_STOPOVER_AIRPORTS, b.max_stopover_airports),
        ]
        .into_iter()
        .map(|(key, value)| Regulation {
            key: key.to_string(),
            value,
            description: String::new(),
        })
        .collect::<Vec<_>>()
    };

    let repository = Arc::new(repository(10));
    assert_eq!(relaxed, repository.bounds().unwrap());

    let writer = {
        let repository = Arc::clone(&repository);
        let (relaxed, strict) = (as_rows(relaxed), as_rows(strict));
        thread::spawn(move || {
            for i in 0..500 {
                let rows = if i % 2 == 0 { &strict } else { &relaxed };
                repository.set_regulations(rows.clone());
            }
        })
    };
    for _ in 0..500 {
        let snapshot = repository.bounds().unwrap();
        assert!(snapshot == relaxed || snapshot == strict, "{:?}", snapshot);
    }
    writer.join().unwrap();
    assert_eq!(relaxed, repository.bounds().unwrap());
}

const SCENARIO: &str = r#"{
    "airports": [
        {"id": "SGN", "name": "Tan Son Nhat", "country": "Vietnam"},
        {"id": "HAN", "name": "Noi Bai"},
        {"id": "DAD", "name": "Da Nang"}
    ],
    "aircraft": [{"id": "VN-A321", "name": "A321", "airline": "Vietnam Airlines"}],
    "routes": [{"id": 4, "depart_airport_id": "SGN", "arrive_airport_id": "HAN"}],
    "regulations": [{"key": "max_flight_duration", "value": 600}],
    "flights": [{"id": 9, "route_id": 4, "depart_time": "2024-01-01T10:00",
                 "arrive_time": "2024-01-01T12:30", "aircraft_id": "VN-A321"}],
    "intermediate_airports": [{"airport_id": "DAD", "flight_id": 9,
                               "arrival_time": "2024-01-01T11:00",
                               "departure_time": "2024-01-01T11:30", "order": 1}]
}"#;

#[test]
fn test_load_scenario() {
    let repository = InMemoryRepository::from_json(SCENARIO, 10).unwrap();
    assert_eq!(1, repository.flight_count());
    assert_eq!(1, repository.leg_count());
    assert_eq!("", repository.airport(&id("HAN")).unwrap().country);
    assert_eq!(600, repository.get_bound(MAX_FLIGHT_DURATION).unwrap());

    // ids continue after the seeded ones
    assert_eq!(5, repository.add_route(&id("HAN"), &id("SGN")).unwrap().id);
    let flight = repository
        .save(&window("2024-01-01T12:30", "2024-01-01T14:00"), 4, &id("VN-A321"))
        .unwrap();
    assert_eq!(10, flight.id);
}

#[test]
fn test_load_scenario_rejects_stop_without_flight() {
    let orphan = SCENARIO.replace(r#""flight_id": 9,"#, r#""flight_id": 3,"#);
    match InMemoryRepository::from_json(&orphan, 10) {
        Err(ScheduleError::Config(message)) => {
            assert!(message.contains("DAD"), "{}", message);
            assert!(message.contains("flight 3"), "{}", message);
        }
        other => panic!("expected Config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_load_scenario_rejects_overlapping_flights() {
    let doubled = SCENARIO.replace(
        r#""flights": [{"id": 9,"#,
        r#""flights": [{"id": 8, "route_id": 4, "depart_time": "2024-01-01T11:00",
                 "arrive_time": "2024-01-01T13:00", "aircraft_id": "VN-A321"}, {"id": 9,"#,
    );
    assert!(matches!(
        InMemoryRepository::from_json(&doubled, 10),
        Err(ScheduleError::AircraftConflict { .. })
    ));
}
