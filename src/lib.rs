pub mod buckets;
pub mod error;
pub mod marker;
pub mod output;
pub mod parser;
pub mod stats;
pub mod time;
pub mod types;

pub use buckets::{BucketKind, DEFAULT_WINDOW_RADIUS, MinuteBuckets};
pub use error::TrafficError;
pub use stats::{TrafficSummary, compute_station_traffic, compute_station_traffic_with_radius};
pub use time::{Minute, TimeFilter};
pub use types::{Station, Trip};
