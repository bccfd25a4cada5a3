use chrono::prelude::*;
use serde::{de::Visitor, Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// A wall-clock time of day in 24h `HH:MM` form, truncated to the minute.
/// Schedule entries and the engine's current-minute comparison both use
/// this representation, so equality is exact-minute matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hours: u32,
    minutes: u32,
}

#[derive(Error, Debug)]
pub enum InvalidTimeOfDayError {
    #[error("Time of day: {0} is malformed")]
    Malformed(String),
}

impl TimeOfDay {
    pub fn new(hours: u32, minutes: u32) -> Result<Self, InvalidTimeOfDayError> {
        if hours > 23 || minutes > 59 {
            return Err(InvalidTimeOfDayError::Malformed(format!(
                "{}:{}",
                hours, minutes
            )));
        }
        Ok(Self { hours, minutes })
    }

    /// The current minute of a local datetime, seconds discarded.
    pub fn from_datetime(datetime: &NaiveDateTime) -> Self {
        Self {
            hours: datetime.hour(),
            minutes: datetime.minute(),
        }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(':').collect::<Vec<_>>();
        if parts.len() != 2 {
            return Err(InvalidTimeOfDayError::Malformed(s.to_string()));
        }
        let hours = parts[0].parse::<u32>();
        let minutes = parts[1].parse::<u32>();
        match (hours, minutes) {
            (Ok(hours), Ok(minutes)) => Self::new(hours, minutes)
                .map_err(|_| InvalidTimeOfDayError::Malformed(s.to_string())),
            _ => Err(InvalidTimeOfDayError::Malformed(s.to_string())),
        }
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TimeOfDayVisitor;

        impl<'de> Visitor<'de> for TimeOfDayVisitor {
            type Value = TimeOfDay;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "a time of day in HH:MM form")
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value
                    .parse::<TimeOfDay>()
                    .map_err(|_| E::custom(format!("malformed time of day: {}", value)))
            }
        }

        deserializer.deserialize_str(TimeOfDayVisitor)
    }
}

/// Local calendar date formatted as `YYYY-MM-DD`, the day component of
/// fire-record store keys. Lexicographic order on the output matches
/// chronological order, which the retention pruning relies on.
pub fn format_day(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
