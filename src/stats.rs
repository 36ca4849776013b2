use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::buckets::{BucketKind, DEFAULT_WINDOW_RADIUS, MinuteBuckets, validate_radius};
use crate::error::Result;
use crate::time::TimeFilter;
use crate::types::{Station, Trip};

/// Sets `departures`, `arrivals` and `total_traffic` on every station for the
/// window around `filter`.
///
/// Stations are updated in place and keep their order. A station with no
/// trips in the window ends up with all three fields at zero.
pub fn compute_station_traffic(
    stations: &mut [Station],
    buckets: &MinuteBuckets,
    filter: TimeFilter,
) {
    apply_counts(stations, buckets, filter, DEFAULT_WINDOW_RADIUS);
}

/// Same as [`compute_station_traffic`] with an explicit window radius.
///
/// # Errors
///
/// Returns an error if `radius` is not between 1 and 719 minutes; the
/// stations are left untouched in that case.
pub fn compute_station_traffic_with_radius(
    stations: &mut [Station],
    buckets: &MinuteBuckets,
    filter: TimeFilter,
    radius: u16,
) -> Result<()> {
    validate_radius(radius)?;
    apply_counts(stations, buckets, filter, radius);
    Ok(())
}

fn apply_counts(
    stations: &mut [Station],
    buckets: &MinuteBuckets,
    filter: TimeFilter,
    radius: u16,
) {
    let window = |kind: BucketKind| buckets.window(kind, filter, radius);
    let departures = count_by(window(BucketKind::Departures), |t| &t.start_station_id);
    let arrivals = count_by(window(BucketKind::Arrivals), |t| &t.end_station_id);

    debug!(
        filter = filter.as_i64(),
        radius,
        departing_stations = departures.len(),
        arriving_stations = arrivals.len(),
        "Counted windowed trips"
    );

    for station in stations.iter_mut() {
        let id = station.short_name.as_str();
        station.departures = departures.get(id).copied().unwrap_or(0);
        station.arrivals = arrivals.get(id).copied().unwrap_or(0);
        station.total_traffic = station.departures + station.arrivals;
    }
}

fn count_by<'a>(
    trips: impl Iterator<Item = &'a Trip>,
    key: impl Fn(&'a Trip) -> &'a String,
) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for trip in trips {
        *counts.entry(key(trip).as_str()).or_insert(0) += 1;
    }
    counts
}

/// Busiest station's total traffic with no time filter.
///
/// Computed on a copy, so the caller's stations keep their current counts.
pub fn any_time_max_traffic(stations: &[Station], buckets: &MinuteBuckets) -> usize {
    let mut all_day = stations.to_vec();
    apply_counts(&mut all_day, buckets, TimeFilter::AnyTime, DEFAULT_WINDOW_RADIUS);
    all_day
        .iter()
        .map(|s| s.total_traffic)
        .max()
        .unwrap_or(0)
}

/// Totals over a station list after a traffic query.
#[derive(Debug, Default, Serialize)]
pub struct TrafficSummary {
    pub stations: usize,
    pub active_stations: usize,
    pub departures: usize,
    pub arrivals: usize,
    pub max_total_traffic: usize,
    pub busiest_station: Option<String>,
}

impl TrafficSummary {
    pub fn from_stations(stations: &[Station]) -> Self {
        let mut s = TrafficSummary {
            stations: stations.len(),
            ..Default::default()
        };

        for station in stations {
            s.departures += station.departures;
            s.arrivals += station.arrivals;

            if station.total_traffic > 0 {
                s.active_stations += 1;
            }

            if station.total_traffic > s.max_total_traffic {
                s.max_total_traffic = station.total_traffic;
                s.busiest_station = Some(station.short_name.clone());
            }
        }

        s
    }

    pub fn total_traffic(&self) -> usize {
        self.departures + self.arrivals
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn active_pct(&self) -> f64 {
        Self::pct(self.active_stations, self.stations)
    }
}

/// Stations sorted by descending total traffic, ties broken by `short_name`.
pub fn busiest(stations: &[Station], top: usize) -> Vec<&Station> {
    let mut ranked: Vec<&Station> = stations.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_traffic
            .cmp(&a.total_traffic)
            .then_with(|| a.short_name.cmp(&b.short_name))
    });
    ranked.truncate(top);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrafficError;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at_minute(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(minute / 60, minute % 60, 0)
            .unwrap()
    }

    fn trip(start: u32, end: u32, from: &str, to: &str) -> Trip {
        Trip::new(at_minute(start), at_minute(end), from, to)
    }

    fn stations(names: &[&str]) -> Vec<Station> {
        names.iter().map(|n| Station::new(*n)).collect()
    }

    fn traffic(station: &Station) -> (usize, usize, usize) {
        (station.departures, station.arrivals, station.total_traffic)
    }

    #[test]
    fn test_single_trip_any_time() {
        let buckets = MinuteBuckets::build(vec![trip(10, 50, "A", "B")]);
        let mut list = stations(&["A", "B", "C"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);

        assert_eq!(traffic(&list[0]), (1, 0, 1));
        assert_eq!(traffic(&list[1]), (0, 1, 1));
        assert_eq!(traffic(&list[2]), (0, 0, 0));
    }

    #[test]
    fn test_any_time_total_is_twice_trip_count() {
        let buckets = MinuteBuckets::build(vec![
            trip(10, 50, "A", "B"),
            trip(300, 320, "B", "A"),
            trip(1430, 5, "C", "C"),
            trip(700, 720, "A", "C"),
        ]);
        let mut list = stations(&["A", "B", "C"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);

        let total: usize = list.iter().map(|s| s.total_traffic).sum();
        assert_eq!(total, 2 * buckets.len());
    }

    #[test]
    fn test_window_wraps_around_midnight() {
        let buckets = MinuteBuckets::build(vec![trip(0, 30, "A", "B")]);
        let mut list = stations(&["A", "B"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::try_from(1439).unwrap());

        assert_eq!(traffic(&list[0]), (1, 0, 1));
        assert_eq!(traffic(&list[1]), (0, 1, 1));
    }

    #[test]
    fn test_departures_and_arrivals_windowed_independently() {
        // leaves at 9:00, arrives at 12:00
        let buckets = MinuteBuckets::build(vec![trip(540, 720, "A", "B")]);
        let mut list = stations(&["A", "B"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::try_from(540).unwrap());
        assert_eq!(traffic(&list[0]), (1, 0, 1));
        assert_eq!(traffic(&list[1]), (0, 0, 0));

        compute_station_traffic(&mut list, &buckets, TimeFilter::try_from(720).unwrap());
        assert_eq!(traffic(&list[0]), (0, 0, 0));
        assert_eq!(traffic(&list[1]), (0, 1, 1));
    }

    #[test]
    fn test_recompute_is_idempotent_and_overwrites() {
        let buckets = MinuteBuckets::build(vec![trip(10, 50, "A", "B"), trip(20, 40, "B", "A")]);
        let mut list = stations(&["A", "B"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);
        let first = list.clone();
        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);
        assert_eq!(list, first);

        compute_station_traffic(&mut list, &buckets, TimeFilter::try_from(900).unwrap());
        assert!(list.iter().all(|s| s.total_traffic == 0));
    }

    #[test]
    fn test_order_preserved_and_unknown_ids_ignored() {
        let buckets = MinuteBuckets::build(vec![trip(10, 50, "ghost", "C")]);
        let mut list = stations(&["C", "A"]);

        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);

        assert_eq!(list[0].short_name, "C");
        assert_eq!(list[1].short_name, "A");
        assert_eq!(traffic(&list[0]), (0, 1, 1));
        assert_eq!(traffic(&list[1]), (0, 0, 0));
    }

    #[test]
    fn test_empty_inputs() {
        let buckets = MinuteBuckets::build(vec![]);
        let mut list = stations(&["A"]);
        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);
        assert_eq!(traffic(&list[0]), (0, 0, 0));

        let mut none: Vec<Station> = vec![];
        compute_station_traffic(&mut none, &buckets, TimeFilter::AnyTime);
        assert!(none.is_empty());
    }

    #[test]
    fn test_invalid_radius_leaves_stations_untouched() {
        let buckets = MinuteBuckets::build(vec![trip(10, 50, "A", "B")]);
        let mut list = stations(&["A"]);
        list[0].departures = 7;

        let result =
            compute_station_traffic_with_radius(&mut list, &buckets, TimeFilter::AnyTime, 0);

        assert!(matches!(result, Err(TrafficError::InvalidRadius(0))));
        assert_eq!(list[0].departures, 7);
    }

    #[test]
    fn test_summary_and_busiest() {
        let buckets = MinuteBuckets::build(vec![
            trip(10, 50, "A", "B"),
            trip(20, 60, "A", "B"),
            trip(30, 70, "B", "A"),
        ]);
        let mut list = stations(&["A", "B", "C"]);
        compute_station_traffic(&mut list, &buckets, TimeFilter::AnyTime);

        let summary = TrafficSummary::from_stations(&list);
        assert_eq!(summary.stations, 3);
        assert_eq!(summary.active_stations, 2);
        assert_eq!(summary.total_traffic(), 6);
        assert_eq!(summary.max_total_traffic, 3);
        // A and B tie at 3; the first one seen wins
        assert_eq!(summary.busiest_station.as_deref(), Some("A"));

        let top = busiest(&list, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].short_name, "A");
        assert_eq!(top[1].short_name, "B");
    }

    #[test]
    fn test_any_time_max_leaves_stations_untouched() {
        let buckets = MinuteBuckets::build(vec![
            trip(10, 50, "A", "B"),
            trip(20, 60, "A", "B"),
            trip(900, 910, "B", "A"),
        ]);
        let mut list = stations(&["A", "B", "C"]);
        compute_station_traffic(&mut list, &buckets, TimeFilter::try_from(900).unwrap());

        assert_eq!(any_time_max_traffic(&list, &buckets), 3);
        assert_eq!(traffic(&list[0]), (0, 1, 1));
        assert_eq!(any_time_max_traffic(&[], &buckets), 0);
    }

    #[test]
    fn test_pct_with_zero_total() {
        assert_eq!(TrafficSummary::pct(10, 0), 0.0);
        assert_eq!(TrafficSummary::pct(1, 4), 25.0);
    }
}
