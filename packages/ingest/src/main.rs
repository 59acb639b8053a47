#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the trash bin map toolchain.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use trash_bin_map_cli_utils::IndicatifProgress;
use trash_bin_map_ingest::backfill::DEFAULT_CHECKPOINT_EVERY;
use trash_bin_map_ingest::interactive::print_sources;
use trash_bin_map_ingest::{all_sources, enabled_sources, find_source, geocode_file, load_source};
use trash_bin_map_record_models::{BoundingBox, CanonicalRecord, Coordinate};
use trash_bin_map_source::progress::ProgressCallback;
use trash_bin_map_source::source_def::SourceDefinition;
use trash_bin_map_spatial::{SpatialQuery, distance_m};

/// Source queried when `--source` is not given.
const DEFAULT_SOURCE: &str = "seoul_sample";

#[derive(Parser)]
#[command(name = "trash_bin_map", about = "Trash bin map dataset tool")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all configured data sources
    Sources,
    /// Load sources and report record counts
    Load {
        /// Comma-separated list of source IDs (overrides `TRASH_BIN_MAP_SOURCES` env var)
        #[arg(long)]
        sources: Option<String>,
    },
    /// List bins strictly within a radius of a point
    Nearby {
        /// Latitude of the origin
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude of the origin
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Radius in meters
        #[arg(long, default_value = "1000")]
        radius: f64,
        /// Source identifier
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: String,
    },
    /// List located bins inside a bounding box (inclusive)
    Bounds {
        #[command(flatten)]
        bounds: BoundsArgs,
        /// Source identifier
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: String,
    },
    /// Case-insensitive search over name, address, category, waste type,
    /// and district. A blank query lists the bounding box instead.
    Search {
        /// Text to search for
        query: String,
        #[command(flatten)]
        bounds: BoundsArgs,
        /// Source identifier
        #[arg(long, default_value = DEFAULT_SOURCE)]
        source: String,
    },
    /// Fill in missing coordinates in a dataset file via Nominatim,
    /// overwriting the file in place (1 lookup per second).
    Geocode {
        /// Dataset file to update
        #[arg(long)]
        file: PathBuf,
        /// Maximum number of lookups. If not set, every record without
        /// coordinates is processed.
        #[arg(long)]
        limit: Option<u64>,
        /// Successful lookups between checkpoints
        #[arg(long, default_value_t = DEFAULT_CHECKPOINT_EVERY)]
        checkpoint_every: u64,
    },
}

/// Bounding box; defaults to the whole globe.
#[derive(Args)]
struct BoundsArgs {
    #[arg(long, default_value = "-90", allow_hyphen_values = true)]
    south: f64,
    #[arg(long, default_value = "-180", allow_hyphen_values = true)]
    west: f64,
    #[arg(long, default_value = "90", allow_hyphen_values = true)]
    north: f64,
    #[arg(long, default_value = "180", allow_hyphen_values = true)]
    east: f64,
}

impl BoundsArgs {
    const fn to_box(&self) -> BoundingBox {
        BoundingBox::new(
            Coordinate::new(self.south, self.west),
            Coordinate::new(self.north, self.east),
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = trash_bin_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return trash_bin_map_ingest::interactive::run(&multi).await;
    };

    match command {
        Commands::Sources => print_sources(&all_sources()),
        Commands::Load { sources } => {
            let sources = enabled_sources(sources);
            log::info!(
                "Loading {} source(s): {}",
                sources.len(),
                sources
                    .iter()
                    .map(SourceDefinition::id)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            for source in &sources {
                let progress = IndicatifProgress::records_bar(&multi, source.name());
                match load_source(source, progress.clone()).await {
                    Ok(store) => {
                        progress.finish(format!("{}: done", source.id()));
                        println!(
                            "{:<22} {:>6} records {:>6} locatable",
                            source.id(),
                            store.len(),
                            store.locatable_count()
                        );
                    }
                    Err(e) => {
                        progress.finish(format!("{}: failed", source.id()));
                        log::error!("Failed to load {}: {e}", source.id());
                    }
                }
            }
        }
        Commands::Nearby {
            lat,
            lng,
            radius,
            source,
        } => {
            let origin = Coordinate::new(lat, lng);
            run_query(
                &multi,
                &source,
                &SpatialQuery::Radius {
                    origin: Some(origin),
                    radius_m: radius,
                },
                Some(origin),
            )
            .await?;
        }
        Commands::Bounds { bounds, source } => {
            run_query(&multi, &source, &SpatialQuery::Bounds(bounds.to_box()), None).await?;
        }
        Commands::Search {
            query,
            bounds,
            source,
        } => {
            run_query(
                &multi,
                &source,
                &SpatialQuery::Text {
                    query,
                    viewport: bounds.to_box(),
                },
                None,
            )
            .await?;
        }
        Commands::Geocode {
            file,
            limit,
            checkpoint_every,
        } => {
            let start = Instant::now();
            let progress = IndicatifProgress::geocode_bar(&multi, "Geocoding");
            let summary = geocode_file(&file, limit, checkpoint_every, &progress).await?;
            log::info!(
                "Geocoding complete: {} of {} lookups succeeded in {:.1}s",
                summary.succeeded,
                summary.lookups(),
                start.elapsed().as_secs_f64()
            );
        }
    }

    Ok(())
}

async fn run_query(
    multi: &trash_bin_map_cli_utils::MultiProgress,
    source_id: &str,
    query: &SpatialQuery,
    origin: Option<Coordinate>,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = find_source(source_id).ok_or_else(|| format!("Unknown source: {source_id}"))?;
    let progress = IndicatifProgress::records_bar(multi, source.name());
    let store = load_source(&source, progress.clone()).await?;
    progress.finish(format!("{} records", store.len()));

    let matches = query.apply(store.records());
    log::info!("{} mode: {} match(es)", query.effective_mode(), matches.len());
    print_records(&matches, origin);
    Ok(())
}

fn print_records(records: &[&CanonicalRecord], origin: Option<Coordinate>) {
    if records.is_empty() {
        println!("No trash bins found.");
        return;
    }
    for record in records {
        let distance = origin
            .zip(record.coordinate())
            .map(|(a, b)| format!("{:>6.0} m  ", distance_m(a, b)))
            .unwrap_or_default();
        println!(
            "{distance}{}  |  {}  |  {} / {}",
            record.name, record.address, record.category, record.collection_type
        );
    }
}
