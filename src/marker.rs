//! Marker sizing, coloring and tooltip text for a station after a query.

use crate::time::TimeFilter;
use crate::types::Station;

/// Radius range used when no time filter is applied.
pub const ANY_TIME_RADIUS: (f64, f64) = (0.0, 25.0);
/// Radius range used for a filtered query, so quiet stations stay visible.
pub const FILTERED_RADIUS: (f64, f64) = (3.0, 50.0);

/// Square-root scale from total traffic to marker radius.
///
/// The domain is `[0, max]` where `max` is the busiest station's traffic over
/// the whole day, so marker sizes stay comparable between time windows. Only
/// the range changes with the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    max_traffic: usize,
    range: (f64, f64),
}

impl RadiusScale {
    pub fn new(max_traffic: usize, range: (f64, f64)) -> Self {
        RadiusScale { max_traffic, range }
    }

    /// Scale over `[0, any_time_max]` with the range that matches `filter`.
    pub fn for_filter(any_time_max: usize, filter: TimeFilter) -> Self {
        let range = match filter {
            TimeFilter::AnyTime => ANY_TIME_RADIUS,
            TimeFilter::At(_) => FILTERED_RADIUS,
        };
        Self::new(any_time_max, range)
    }

    /// Radius for a traffic count. An empty domain maps everything to the
    /// middle of the range.
    pub fn radius(&self, traffic: usize) -> f64 {
        let (lo, hi) = self.range;
        if self.max_traffic == 0 {
            return (lo + hi) / 2.0;
        }
        let t = (traffic as f64).sqrt() / (self.max_traffic as f64).sqrt();
        lo + (hi - lo) * t
    }
}

/// Share of a station's traffic that is departures, quantized to
/// `0.0`, `0.5` or `1.0`. `None` for a station with no traffic.
pub fn departure_flow(station: &Station) -> Option<f64> {
    if station.total_traffic == 0 {
        return None;
    }
    let ratio = station.departures as f64 / station.total_traffic as f64;
    let flow = match ratio {
        r if r < 1.0 / 3.0 => 0.0,
        r if r < 2.0 / 3.0 => 0.5,
        _ => 1.0,
    };
    Some(flow)
}

/// Tooltip text shown when hovering a station marker.
pub fn tooltip(station: &Station) -> String {
    format!(
        "{} trips ({} departures, {} arrivals)",
        station.total_traffic, station.departures, station.arrivals
    )
}
