//! Stored regulation bounds and the snapshot the validator works against.

use crate::error::ScheduleResult;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const MIN_FLIGHT_DURATION: &str = "min_flight_duration";
pub const MAX_FLIGHT_DURATION: &str = "max_flight_duration";
pub const MIN_STOPOVER_DURATION: &str = "min_stopover_duration";
pub const MAX_STOPOVER_DURATION: &str = "max_stopover_duration";
pub const MAX_STOPOVER_AIRPORTS: &str = "max_stopover_airports";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Tabled)]
pub struct Regulation {
    pub key: String,
    pub value: u32,
    #[serde(default)]
    pub description: String,
}

/// Key/value lookup of named numeric bounds.
pub trait RegulationStore {
    /// Fails with `NotFound` when no regulation is stored under `name`.
    fn get_bound(&self, name: &str) -> ScheduleResult<u32>;

    fn regulations(&self) -> Vec<Regulation>;

    /// Snapshot of the five bounds. Stores that can change concurrently
    /// should override this to read them under one lock.
    fn bounds(&self) -> ScheduleResult<RegulationBounds> {
        RegulationBounds::load(self)
    }
}

/// Frozen view of the five bounds, read once per validation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegulationBounds {
    pub min_flight_duration: u32,
    pub max_flight_duration: u32,
    pub min_stopover_duration: u32,
    pub max_stopover_duration: u32,
    pub max_stopover_airports: u32,
}

impl RegulationBounds {
    pub fn new(
        min_flight_duration: u32,
        max_flight_duration: u32,
        min_stopover_duration: u32,
        max_stopover_duration: u32,
        max_stopover_airports: u32,
    ) -> Self {
        RegulationBounds {
            min_flight_duration,
            max_flight_duration,
            min_stopover_duration,
            max_stopover_duration,
            max_stopover_airports,
        }
    }

    pub fn load<S: RegulationStore + ?Sized>(store: &S) -> ScheduleResult<Self> {
        Ok(RegulationBounds {
            min_flight_duration: store.get_bound(MIN_FLIGHT_DURATION)?,
            max_flight_duration: store.get_bound(MAX_FLIGHT_DURATION)?,
            min_stopover_duration: store.get_bound(MIN_STOPOVER_DURATION)?,
            max_stopover_duration: store.get_bound(MAX_STOPOVER_DURATION)?,
            max_stopover_airports: store.get_bound(MAX_STOPOVER_AIRPORTS)?,
        })
    }
}
