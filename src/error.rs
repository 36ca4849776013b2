//! Error type shared by the loaders and the aggregation core.

/// Errors raised while loading trip data or validating a query.
#[derive(Debug, thiserror::Error)]
pub enum TrafficError {
    /// A minute-of-day outside `[0, 1439]` (or `-1` for a time filter).
    #[error("minute {0} is out of range")]
    MinuteOutOfRange(i64),

    /// A window radius that would make the window empty or degenerate.
    #[error("window radius {0} must be between 1 and 719 minutes")]
    InvalidRadius(u16),

    /// A trip timestamp that could not be parsed.
    #[error("row {row}: invalid {field} timestamp {value:?}")]
    InvalidTimestamp {
        /// 1-based data row in the trip CSV.
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrafficError>;
