//! Loaders for the trip CSV and the station JSON feed.

use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, TrafficError};
use crate::types::{Station, Trip};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// One row of the trip CSV. Only the timestamps and station ids are required.
#[derive(Debug, Deserialize)]
struct TripRecord {
    #[serde(default)]
    ride_id: Option<String>,
    #[serde(default)]
    bike_type: Option<String>,
    started_at: String,
    ended_at: String,
    start_station_id: String,
    end_station_id: String,
    #[serde(default)]
    is_member: Option<String>,
}

/// Parses a wall-clock timestamp.
///
/// RFC 3339 values keep the clock time of their own offset, so
/// `2024-03-01T08:15:00-05:00` lands in minute 495.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "member" => Some(true),
        "0" | "false" | "no" | "casual" => Some(false),
        _ => None,
    }
}

/// Reads trips from CSV, in file order.
///
/// # Errors
///
/// Fails on the first row with a missing column or an unparseable timestamp.
pub fn parse_trips<R: Read>(reader: R) -> Result<Vec<Trip>> {
    let mut trips = Vec::new();

    for (i, rec) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        let rec: TripRecord = rec?;
        let row = i + 1;

        let started_at = parse_timestamp(&rec.started_at).ok_or_else(|| {
            TrafficError::InvalidTimestamp {
                row,
                field: "started_at",
                value: rec.started_at.clone(),
            }
        })?;
        let ended_at =
            parse_timestamp(&rec.ended_at).ok_or_else(|| TrafficError::InvalidTimestamp {
                row,
                field: "ended_at",
                value: rec.ended_at.clone(),
            })?;

        trips.push(Trip {
            ride_id: rec.ride_id,
            bike_type: rec.bike_type,
            started_at,
            ended_at,
            start_station_id: rec.start_station_id,
            end_station_id: rec.end_station_id,
            is_member: rec.is_member.as_deref().and_then(parse_flag),
        });
    }

    debug!(trips = trips.len(), "Parsed trip CSV");
    Ok(trips)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StationFeed {
    Envelope { data: StationData },
    List(Vec<Station>),
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

/// Decodes a station list from either `{"data": {"stations": [...]}}` or a
/// bare JSON array.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let stations = match serde_json::from_slice(bytes)? {
        StationFeed::Envelope { data } => data.stations,
        StationFeed::List(stations) => stations,
    };
    debug!(stations = stations.len(), "Parsed station feed");
    Ok(stations)
}

pub fn load_trips(path: impl AsRef<Path>) -> Result<Vec<Trip>> {
    parse_trips(File::open(path)?)
}

pub fn load_stations(path: impl AsRef<Path>) -> Result<Vec<Station>> {
    parse_stations(&std::fs::read(path)?)
}
