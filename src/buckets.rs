//! Minute-of-day bucketing of trips and the wrapped window query over it.

use tracing::debug;

use crate::error::{Result, TrafficError};
use crate::time::{MINUTES_PER_DAY, Minute, TimeFilter};
use crate::types::Trip;

/// Default half-width of the query window, in minutes.
pub const DEFAULT_WINDOW_RADIUS: u16 = 60;

/// Selects which timestamp of a trip a bucket set is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    /// Keyed by `started_at`.
    Departures,
    /// Keyed by `ended_at`.
    Arrivals,
}

/// Trips grouped by the minute of the day they start and end in.
///
/// Each bucket holds indices into the owned trip list, in insertion order.
/// Nothing is mutated after [`MinuteBuckets::build`] returns.
#[derive(Debug, Clone)]
pub struct MinuteBuckets {
    trips: Vec<Trip>,
    departures: Vec<Vec<usize>>,
    arrivals: Vec<Vec<usize>>,
}

impl MinuteBuckets {
    pub fn build(trips: Vec<Trip>) -> Self {
        let mut departures = vec![Vec::new(); usize::from(MINUTES_PER_DAY)];
        let mut arrivals = vec![Vec::new(); usize::from(MINUTES_PER_DAY)];

        for (i, trip) in trips.iter().enumerate() {
            departures[trip.start_minute().index()].push(i);
            arrivals[trip.end_minute().index()].push(i);
        }

        debug!(trips = trips.len(), "Trips bucketed by minute");

        MinuteBuckets {
            trips,
            departures,
            arrivals,
        }
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    /// The trips in bucket `minute` of the given kind.
    pub fn bucket(&self, kind: BucketKind, minute: Minute) -> impl Iterator<Item = &Trip> + '_ {
        self.slots(kind)[minute.index()]
            .iter()
            .map(move |&i| &self.trips[i])
    }

    /// Sizes of all 1440 buckets of the given kind.
    pub fn bucket_sizes(&self, kind: BucketKind) -> Vec<usize> {
        self.slots(kind).iter().map(Vec::len).collect()
    }

    fn slots(&self, kind: BucketKind) -> &[Vec<usize>] {
        match kind {
            BucketKind::Departures => &self.departures,
            BucketKind::Arrivals => &self.arrivals,
        }
    }

    /// Trips in the window around `filter`, using [`DEFAULT_WINDOW_RADIUS`].
    pub fn windowed_trips(
        &self,
        kind: BucketKind,
        filter: TimeFilter,
    ) -> impl Iterator<Item = &Trip> + '_ {
        self.window(kind, filter, DEFAULT_WINDOW_RADIUS)
    }

    /// Trips whose `kind` minute falls in `[m - radius, m + radius)`, wrapped
    /// around midnight, or every trip for [`TimeFilter::AnyTime`].
    ///
    /// Buckets are visited in minute order. When the window crosses midnight
    /// the tail of the day comes first, then the head.
    ///
    /// # Errors
    ///
    /// Returns [`TrafficError::InvalidRadius`] unless `1 <= radius <= 719`.
    pub fn windowed_trips_with_radius(
        &self,
        kind: BucketKind,
        filter: TimeFilter,
        radius: u16,
    ) -> Result<impl Iterator<Item = &Trip> + '_> {
        validate_radius(radius)?;
        Ok(self.window(kind, filter, radius))
    }

    pub(crate) fn window(
        &self,
        kind: BucketKind,
        filter: TimeFilter,
        radius: u16,
    ) -> impl Iterator<Item = &Trip> + '_ {
        self.slot_ranges(filter, radius)
            .into_iter()
            .flat_map(move |range| self.slots(kind)[range].iter().flatten())
            .map(move |&i| &self.trips[i])
    }

    fn slot_ranges(&self, filter: TimeFilter, radius: u16) -> Vec<std::ops::Range<usize>> {
        let day = usize::from(MINUTES_PER_DAY);
        match filter {
            TimeFilter::AnyTime => vec![0..day],
            TimeFilter::At(minute) => {
                let m = minute.index();
                let r = usize::from(radius);
                let lo = (m + day - r) % day;
                let hi = (m + r) % day;
                if lo > hi {
                    vec![lo..day, 0..hi]
                } else {
                    vec![lo..hi]
                }
            }
        }
    }
}

pub fn validate_radius(radius: u16) -> Result<()> {
    if radius == 0 || radius >= MINUTES_PER_DAY / 2 {
        return Err(TrafficError::InvalidRadius(radius));
    }
    Ok(())
}
