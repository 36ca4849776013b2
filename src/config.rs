use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use bluebikes_traffic::DEFAULT_WINDOW_RADIUS;

/// Where the dataset lives and how wide a query window is.
///
/// Read from the environment (after `.env` is loaded); CLI flags override
/// individual fields.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub trips_path: PathBuf,
    pub stations_path: PathBuf,
    pub window_radius: u16,
}

fn env_str(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl DataConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let window_radius = match lookup("BLUEBIKES_WINDOW_RADIUS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .with_context(|| format!("BLUEBIKES_WINDOW_RADIUS={raw:?} is not a number"))?,
            _ => DEFAULT_WINDOW_RADIUS,
        };

        Ok(DataConfig {
            trips_path: env_str(
                &lookup,
                "BLUEBIKES_TRIPS_PATH",
                "data/bluebikes-traffic.csv",
            )
            .into(),
            stations_path: env_str(
                &lookup,
                "BLUEBIKES_STATIONS_PATH",
                "data/bluebikes-stations.json",
            )
            .into(),
            window_radius,
        })
    }

    pub fn with_overrides(
        mut self,
        trips: Option<PathBuf>,
        stations: Option<PathBuf>,
        radius: Option<u16>,
    ) -> Self {
        if let Some(trips) = trips {
            self.trips_path = trips;
        }
        if let Some(stations) = stations {
            self.stations_path = stations;
        }
        if let Some(radius) = radius {
            self.window_radius = radius;
        }
        self
    }
}
