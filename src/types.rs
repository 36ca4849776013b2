//! Trip and station records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::Minute;

/// A single bikeshare ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    pub ride_id: Option<String>,
    pub bike_type: Option<String>,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub start_station_id: String,
    pub end_station_id: String,
    pub is_member: Option<bool>,
}

impl Trip {
    pub fn new(
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
        start_station_id: impl Into<String>,
        end_station_id: impl Into<String>,
    ) -> Self {
        Trip {
            ride_id: None,
            bike_type: None,
            started_at,
            ended_at,
            start_station_id: start_station_id.into(),
            end_station_id: end_station_id.into(),
            is_member: None,
        }
    }

    pub fn start_minute(&self) -> Minute {
        Minute::of(&self.started_at)
    }

    pub fn end_minute(&self) -> Minute {
        Minute::of(&self.ended_at)
    }
}

/// A dock station. The traffic fields are overwritten by every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub short_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub capacity: Option<u32>,

    // derived per query
    #[serde(default)]
    pub departures: usize,
    #[serde(default)]
    pub arrivals: usize,
    #[serde(default)]
    pub total_traffic: usize,
}

impl Station {
    pub fn new(short_name: impl Into<String>) -> Self {
        Station {
            short_name: short_name.into(),
            ..Default::default()
        }
    }

    /// Set station metadata (name and coordinates)
    pub fn with_location(mut self, name: &str, lat: f64, lon: f64) -> Self {
        self.name = name.to_string();
        self.lat = lat;
        self.lon = lon;
        self
    }
}
