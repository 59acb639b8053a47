#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the trash bin map tool.
//!
//! Provides a menu-driven interface using `dialoguer` for running commands
//! without memorizing CLI flags.

use std::path::PathBuf;
use std::time::Instant;

use dialoguer::{Input, Select};
use trash_bin_map_cli_utils::{IndicatifProgress, MultiProgress};
use trash_bin_map_record_models::{BoundingBox, Coordinate};
use trash_bin_map_source::progress::ProgressCallback;
use trash_bin_map_source::source_def::SourceDefinition;
use trash_bin_map_spatial::SpatialQuery;

use crate::backfill::DEFAULT_CHECKPOINT_EVERY;

/// Top-level actions available in the interactive menu.
enum Action {
    ListSources,
    LoadSource,
    Nearby,
    Search,
    Geocode,
}

impl Action {
    const ALL: &[Self] = &[
        Self::ListSources,
        Self::LoadSource,
        Self::Nearby,
        Self::Search,
        Self::Geocode,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::ListSources => "List sources",
            Self::LoadSource => "Load a source",
            Self::Nearby => "Find bins near a point",
            Self::Search => "Search bins by text",
            Self::Geocode => "Geocode missing coordinates in a file",
        }
    }
}

/// Runs the interactive menu, prompting the user to select and configure
/// an operation.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected operation fails.
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::ListSources => print_sources(&crate::all_sources()),
        Action::LoadSource => {
            let source = select_source()?;
            let store = load(multi, &source).await?;
            println!(
                "{}: {} records, {} locatable",
                source.id(),
                store.len(),
                store.locatable_count()
            );
        }
        Action::Nearby => {
            let source = select_source()?;
            let lat: f64 = Input::new()
                .with_prompt("Latitude")
                .default(37.5665)
                .interact_text()?;
            let lng: f64 = Input::new()
                .with_prompt("Longitude")
                .default(126.978)
                .interact_text()?;
            let radius_m: f64 = Input::new()
                .with_prompt("Radius (m)")
                .default(1000.0)
                .interact_text()?;

            let store = load(multi, &source).await?;
            let query = SpatialQuery::Radius {
                origin: Some(Coordinate::new(lat, lng)),
                radius_m,
            };
            print_names(&query.apply(store.records()));
        }
        Action::Search => {
            let source = select_source()?;
            let text: String = Input::new()
                .with_prompt("Search")
                .allow_empty(true)
                .interact_text()?;

            let store = load(multi, &source).await?;
            let query = SpatialQuery::Text {
                query: text,
                viewport: BoundingBox::new(
                    Coordinate::new(-90.0, -180.0),
                    Coordinate::new(90.0, 180.0),
                ),
            };
            print_names(&query.apply(store.records()));
        }
        Action::Geocode => geocode_interactive(multi).await?,
    }

    Ok(())
}

/// Prints the source table.
pub fn print_sources(sources: &[SourceDefinition]) {
    println!("{:<22} {:<8} NAME", "ID", "ENABLED");
    println!("{}", "-".repeat(70));
    for source in sources {
        println!(
            "{:<22} {:<8} {}",
            source.id(),
            if source.enabled { "yes" } else { "no" },
            source.name()
        );
    }
}

fn select_source() -> Result<SourceDefinition, Box<dyn std::error::Error>> {
    let mut sources = crate::all_sources();
    let labels: Vec<String> = sources
        .iter()
        .map(|s| format!("{} ({})", s.id(), s.name()))
        .collect();

    let idx = Select::new()
        .with_prompt("Source")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(sources.swap_remove(idx))
}

async fn load(
    multi: &MultiProgress,
    source: &SourceDefinition,
) -> Result<trash_bin_map_source::store::RecordStore, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::records_bar(multi, source.name());
    let store = crate::load_source(source, progress.clone()).await?;
    progress.finish(format!("{} records", store.len()));
    Ok(store)
}

fn print_names(records: &[&trash_bin_map_record_models::CanonicalRecord]) {
    if records.is_empty() {
        println!("No trash bins found.");
    }
    for record in records {
        println!("{}  |  {}", record.name, record.address);
    }
}

/// Prompts for a dataset file and backfill limits, then runs the backfill.
async fn geocode_interactive(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let file: String = Input::new()
        .with_prompt("Dataset file")
        .default("data.json".to_string())
        .interact_text()?;
    let limit = prompt_optional_u64("Lookup limit (empty for no limit)")?;
    let checkpoint_every: u64 = Input::new()
        .with_prompt("Successful lookups between checkpoints")
        .default(DEFAULT_CHECKPOINT_EVERY)
        .interact_text()?;

    let start = Instant::now();
    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding");
    let summary =
        crate::geocode_file(&PathBuf::from(file), limit, checkpoint_every, &progress).await?;

    log::info!(
        "Geocoding complete: {} geocoded, {} failed, {} skipped in {:.1}s",
        summary.succeeded,
        summary.failed,
        summary.skipped_located + summary.skipped_no_address,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Prompts the user for an optional `u64` value. Returns `None` if the
/// input is empty.
fn prompt_optional_u64(prompt: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}
