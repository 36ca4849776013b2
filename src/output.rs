//! Output formatting and export for station traffic.
//!
//! Supports pretty-printing, JSON serialization, CSV append and gzip export.

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::marker::{RadiusScale, departure_flow};
use crate::time::TimeFilter;
use crate::types::Station;

/// One station's traffic for one query, flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    /// `-1` for an unfiltered query.
    pub minute: i64,
    pub time_label: String,
    pub short_name: String,
    pub name: String,
    pub departures: usize,
    pub arrivals: usize,
    pub total_traffic: usize,
    pub departure_flow: Option<f64>,
    pub radius: f64,
}

impl TrafficRecord {
    pub fn from_station(station: &Station, filter: TimeFilter, scale: &RadiusScale) -> Self {
        TrafficRecord {
            minute: filter.as_i64(),
            time_label: filter.label(),
            short_name: station.short_name.clone(),
            name: station.name.clone(),
            departures: station.departures,
            arrivals: station.arrivals,
            total_traffic: station.total_traffic,
            departure_flow: departure_flow(station),
            radius: scale.radius(station.total_traffic),
        }
    }

    /// Records for every station. Radii are sized against `any_time_max`,
    /// the busiest station's traffic with no time filter.
    pub fn from_stations(
        stations: &[Station],
        filter: TimeFilter,
        any_time_max: usize,
    ) -> Vec<Self> {
        let scale = RadiusScale::for_filter(any_time_max, filter);
        stations
            .iter()
            .map(|s| Self::from_station(s, filter, &scale))
            .collect()
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends records as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: impl AsRef<Path>, records: &[TrafficRecord]) -> Result<()> {
    let path = path.as_ref();
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes records as a gzip-compressed CSV, replacing any existing file.
pub fn write_gzip(path: impl AsRef<Path>, records: &[TrafficRecord]) -> Result<()> {
    let path = path.as_ref();
    let encoder = GzEncoder::new(File::create(path)?, Compression::default());

    let mut writer = WriterBuilder::new().from_writer(encoder);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let mut encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.flush()?;
    encoder.finish()?;

    debug!(path = %path.display(), rows = records.len(), "Wrote gzip CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::env;
    use std::fs;
    use std::io::Read;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn records() -> Vec<TrafficRecord> {
        let mut a = Station::new("A").with_location("Fan Pier", 42.353, -71.044);
        a.departures = 2;
        a.arrivals = 1;
        a.total_traffic = 3;
        let b = Station::new("B");
        TrafficRecord::from_stations(&[a, b], TimeFilter::try_from(480).unwrap(), 12)
    }

    #[test]
    fn test_records_from_stations() {
        let rows = records();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].minute, 480);
        assert_eq!(rows[0].time_label, "8:00 AM");
        assert_eq!(rows[0].departure_flow, Some(1.0));
        // sqrt(3 / 12) of the way from 3 to 50
        assert_eq!(rows[0].radius, 26.5);
        assert_eq!(rows[1].departure_flow, None);
        assert_eq!(rows[1].radius, 3.0);
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&records());
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&records()).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("bluebikes_traffic_test_header.csv");
        let _ = fs::remove_file(&path); // clean up any prior run

        append_records(&path, &records()).unwrap();
        append_records(&path, &records()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // 1 header + 2 appends of 2 rows
        assert_eq!(lines.len(), 5);
        let header_count = lines.iter().filter(|l| l.starts_with("minute,")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_gzip_round_trips() {
        let path = temp_path("bluebikes_traffic_test_export.csv.gz");
        let _ = fs::remove_file(&path);

        write_gzip(&path, &records()).unwrap();

        let mut content = String::new();
        GzDecoder::new(fs::File::open(&path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.starts_with("minute,time_label,short_name"));
        assert!(content.contains("A,Fan Pier,2,1,3"));

        fs::remove_file(&path).unwrap();
    }
}
