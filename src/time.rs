use chrono::{Duration, Local, NaiveDateTime, ParseError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Datetime format used by the scheduling form, e.g. `2024-01-01T10:00`.
pub const FORM_FORMAT: &str = "%Y-%m-%dT%H:%M";
const FORM_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Copy, Ord, Eq, PartialEq, PartialOrd, Hash)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Timestamp(Local::now().naive_local())
    }

    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let value = value.trim();
        NaiveDateTime::parse_from_str(value, FORM_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(value, FORM_FORMAT_SECONDS))
            .map(Timestamp)
    }

    /// Signed number of whole minutes from `earlier` to `self`.
    pub fn minutes_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).num_minutes()
    }

    /// Open/open interval test: touching endpoints do not overlap.
    pub(crate) fn is_overlapping(
        time: &(Timestamp, Timestamp),
        window: &(Timestamp, Timestamp),
    ) -> bool {
        time.0 < window.1 && time.1 > window.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORM_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl Add<u32> for Timestamp {
    type Output = Self;

    fn add(self, minutes: u32) -> Self::Output {
        Timestamp(self.0 + Duration::minutes(i64::from(minutes)))
    }
}

impl AddAssign<u32> for Timestamp {
    fn add_assign(&mut self, minutes: u32) {
        self.0 += Duration::minutes(i64::from(minutes));
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}
