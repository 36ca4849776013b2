//! CLI entry point for the Bluebikes traffic tool.
//!
//! Loads the trip CSV and station feed from disk, then answers time-of-day
//! traffic queries per station, logging or exporting the results.

mod config;

use crate::config::DataConfig;
use anyhow::{Result, bail};
use bluebikes_traffic::buckets::{BucketKind, validate_radius};
use bluebikes_traffic::marker::tooltip;
use bluebikes_traffic::output::{
    TrafficRecord, append_records, print_json, print_pretty, write_gzip,
};
use bluebikes_traffic::parser::{load_stations, load_trips};
use bluebikes_traffic::stats::{any_time_max_traffic, busiest};
use bluebikes_traffic::time::{MINUTES_PER_DAY, Minute, format_time};
use bluebikes_traffic::{
    MinuteBuckets, Station, TimeFilter, TrafficSummary, compute_station_traffic_with_radius,
};
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bluebikes_traffic")]
#[command(about = "Per-station bikeshare traffic by time of day", long_about = None)]
struct Cli {
    /// Trip CSV (overrides BLUEBIKES_TRIPS_PATH)
    #[arg(long, global = true)]
    trips: Option<PathBuf>,

    /// Station JSON feed (overrides BLUEBIKES_STATIONS_PATH)
    #[arg(long, global = true)]
    stations: Option<PathBuf>,

    /// Half-width of the query window in minutes (overrides BLUEBIKES_WINDOW_RADIUS)
    #[arg(short, long, global = true)]
    radius: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute station traffic around one minute of the day
    Traffic {
        /// Minute of the day (0-1439), or -1 for any time
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        minute: i64,

        /// Number of busiest stations to log
        #[arg(short, long, default_value_t = 10)]
        top: usize,

        /// Log every station as JSON instead of the busiest few
        #[arg(long, default_value_t = false)]
        json: bool,

        /// CSV file to append results to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compute station traffic at regular steps through the day and export it
    Sweep {
        /// Minutes between queries
        #[arg(short, long, default_value_t = 60)]
        step: u16,

        /// CSV file to write results to
        #[arg(short, long, default_value = "traffic.csv")]
        output: PathBuf,

        /// Gzip compress the CSV
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Describe the loaded dataset
    Summary,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bluebikes_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bluebikes_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = DataConfig::from_env()?.with_overrides(cli.trips, cli.stations, cli.radius);
    validate_radius(config.window_radius)?;

    let mut dataset = load_dataset(&config)?;

    match cli.command {
        Commands::Traffic {
            minute,
            top,
            json,
            output,
        } => {
            let filter = TimeFilter::try_from(minute)?;
            traffic(&mut dataset, filter, config.window_radius, top, json, output)?;
        }
        Commands::Sweep { step, output, gzip } => {
            sweep(&mut dataset, step, config.window_radius, &output, gzip)?;
        }
        Commands::Summary => {
            summary(&dataset.buckets, &dataset.stations);
        }
    }

    Ok(())
}

/// Bucketed trips plus the station list queries write into.
struct Dataset {
    buckets: MinuteBuckets,
    stations: Vec<Station>,
    /// Busiest station's traffic over the whole day; fixes the radius domain.
    any_time_max: usize,
}

/// Reads trips and stations from disk and buckets the trips.
#[tracing::instrument(fields(
    trips = %config.trips_path.display(),
    stations = %config.stations_path.display()
))]
fn load_dataset(config: &DataConfig) -> Result<Dataset> {
    let trips = load_trips(&config.trips_path)?;
    let stations = load_stations(&config.stations_path)?;

    if stations.is_empty() {
        warn!("Station feed is empty");
    }

    let buckets = MinuteBuckets::build(trips);
    let any_time_max = any_time_max_traffic(&stations, &buckets);
    info!(
        trips = buckets.len(),
        stations = stations.len(),
        any_time_max,
        "Dataset loaded"
    );

    Ok(Dataset {
        buckets,
        stations,
        any_time_max,
    })
}

/// Runs a single query and logs (or appends) the result.
#[tracing::instrument(skip(dataset, output), fields(filter = filter.as_i64()))]
fn traffic(
    dataset: &mut Dataset,
    filter: TimeFilter,
    radius: u16,
    top: usize,
    json: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let stations = &mut dataset.stations;
    compute_station_traffic_with_radius(stations, &dataset.buckets, filter, radius)?;

    let summary = TrafficSummary::from_stations(stations);
    info!(
        time = %filter.label(),
        departures = summary.departures,
        arrivals = summary.arrivals,
        active_stations = summary.active_stations,
        active_pct = %format!("{:.1}", summary.active_pct()),
        busiest = summary.busiest_station.as_deref().unwrap_or("-"),
        "Traffic computed"
    );
    print_pretty(&summary);

    let records = TrafficRecord::from_stations(stations, filter, dataset.any_time_max);

    if json {
        print_json(&records)?;
    } else {
        for station in busiest(stations, top) {
            info!(
                station = %station.short_name,
                name = %station.name,
                "{}",
                tooltip(station)
            );
        }
    }

    if let Some(path) = output {
        append_records(&path, &records)?;
        info!(path = %path.display(), rows = records.len(), "Results appended");
    }

    Ok(())
}

/// Queries every `step` minutes from midnight and exports all rows.
#[tracing::instrument(skip(dataset, output), fields(output = %output.display()))]
fn sweep(
    dataset: &mut Dataset,
    step: u16,
    radius: u16,
    output: &Path,
    gzip: bool,
) -> Result<()> {
    if step == 0 || step > MINUTES_PER_DAY {
        bail!("step must be between 1 and {MINUTES_PER_DAY} minutes, got {step}");
    }

    let mut records = Vec::new();

    for minute in (0..MINUTES_PER_DAY).step_by(usize::from(step)) {
        let filter = TimeFilter::At(Minute::new(i64::from(minute))?);
        compute_station_traffic_with_radius(&mut dataset.stations, &dataset.buckets, filter, radius)?;
        records.extend(TrafficRecord::from_stations(
            &dataset.stations,
            filter,
            dataset.any_time_max,
        ));
    }

    if gzip {
        write_gzip(output, &records)?;
    } else {
        if output.exists() {
            warn!(path = %output.display(), "Appending to existing file");
        }
        append_records(output, &records)?;
    }

    info!(rows = records.len(), gzip, "Sweep exported");
    Ok(())
}

/// Logs dataset-level statistics.
fn summary(buckets: &MinuteBuckets, stations: &[Station]) {
    let known: HashSet<&str> = stations.iter().map(|s| s.short_name.as_str()).collect();
    let unknown = buckets
        .trips()
        .iter()
        .filter(|t| {
            !known.contains(t.start_station_id.as_str()) || !known.contains(t.end_station_id.as_str())
        })
        .count();

    for kind in [BucketKind::Departures, BucketKind::Arrivals] {
        let sizes = buckets.bucket_sizes(kind);
        let bucketed: usize = sizes.iter().sum();
        let (peak_minute, peak) = sizes
            .iter()
            .enumerate()
            .max_by_key(|&(i, n)| (*n, std::cmp::Reverse(i)))
            .map(|(i, n)| (i, *n))
            .unwrap_or((0, 0));
        let peak_label = Minute::new(peak_minute as i64)
            .map(format_time)
            .unwrap_or_default();

        info!(
            kind = ?kind,
            bucketed,
            peak_minute,
            peak_time = %peak_label,
            peak,
            "Bucket distribution"
        );
    }

    info!(
        trips = buckets.len(),
        stations = stations.len(),
        trips_with_unknown_station = unknown,
        "Dataset summary"
    );
}
