//! Geocoding backfill: fills in coordinates for records that only carry an
//! address.
//!
//! Records are processed one at a time in store order. Each lookup starts
//! at least [`BackfillOptions::rate_limit`] after the previous one finished,
//! so a slow answer never eats into the pause, and the whole document is checkpointed after every
//! [`BackfillOptions::checkpoint_every`] successes plus once at the end.
//! A failed lookup or a failed checkpoint is logged, counted, and skipped;
//! neither stops the pass.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use trash_bin_map_geocoder::Geocoder;
use trash_bin_map_geocoder::address::build_query;
use trash_bin_map_geocoder::service_registry::NominatimConfig;
use trash_bin_map_source::progress::ProgressCallback;
use trash_bin_map_source::store::RecordStore;

use crate::BackfillError;
use crate::checkpoint::CheckpointSink;

/// Default number of successful lookups between checkpoints.
pub const DEFAULT_CHECKPOINT_EVERY: u64 = 50;

/// Default minimum spacing between lookups.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(1);

/// Tuning for a backfill pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillOptions {
    /// Minimum idle time between the end of one lookup and the start of the
    /// next.
    pub rate_limit: Duration,
    /// Successful lookups between checkpoints. Must be non-zero.
    pub checkpoint_every: u64,
    /// Maximum number of lookups; `None` processes every record.
    pub limit: Option<u64>,
    /// Prefix for every query (e.g., `"서울"`).
    pub region: Option<String>,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            rate_limit: DEFAULT_RATE_LIMIT,
            checkpoint_every: DEFAULT_CHECKPOINT_EVERY,
            limit: None,
            region: None,
        }
    }
}

impl BackfillOptions {
    /// Rate limit and region taken from a geocoding service config.
    #[must_use]
    pub fn for_service(config: &NominatimConfig) -> Self {
        Self {
            rate_limit: config.rate_limit(),
            region: config.region.clone(),
            ..Self::default()
        }
    }
}

/// Tallies for one backfill pass.
///
/// Skip counters cover only records visited before `limit` was reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Records in the store.
    pub total: u64,
    /// Records that already had coordinates.
    pub skipped_located: u64,
    /// Records with no address to look up.
    pub skipped_no_address: u64,
    /// Lookups that produced a coordinate.
    pub succeeded: u64,
    /// Lookups that errored or found nothing.
    pub failed: u64,
    /// Checkpoints written, including the final one.
    pub checkpoints_written: u64,
    /// Checkpoint writes that failed.
    pub checkpoint_failures: u64,
}

impl BackfillSummary {
    /// Number of lookups issued.
    #[must_use]
    pub const fn lookups(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// Runs a backfill pass over `store`, writing checkpoints to `sink`.
///
/// # Errors
///
/// Returns [`BackfillError::InvalidCheckpointInterval`] if
/// `options.checkpoint_every` is zero. Lookup and checkpoint failures are
/// never returned.
pub async fn backfill(
    store: &mut RecordStore,
    geocoder: &dyn Geocoder,
    sink: &dyn CheckpointSink,
    options: &BackfillOptions,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<BackfillSummary, BackfillError> {
    if options.checkpoint_every == 0 {
        return Err(BackfillError::InvalidCheckpointInterval);
    }

    let mut summary = BackfillSummary {
        total: store.len() as u64,
        ..BackfillSummary::default()
    };
    progress.set_total(summary.total);

    let mut last_finished: Option<Instant> = None;

    for index in 0..store.len() {
        if options.limit.is_some_and(|limit| summary.lookups() >= limit) {
            log::info!("Reached limit of {} lookups", summary.lookups());
            break;
        }
        progress.inc(1);

        let Some(record) = store.get(index) else {
            break;
        };
        if record.is_locatable() {
            summary.skipped_located += 1;
            continue;
        }
        let district = record.district.clone();
        let query = store
            .address_of(index)
            .and_then(|address| build_query(options.region.as_deref(), district.as_deref(), &address));
        let Some(query) = query else {
            log::debug!("Record {}: no address, skipping", index + 1);
            summary.skipped_no_address += 1;
            continue;
        };

        if let Some(finished) = last_finished {
            tokio::time::sleep_until(finished + options.rate_limit).await;
        }

        log::debug!("{}/{}: geocoding {query}", index + 1, summary.total);
        let result = geocoder.geocode(&query).await;
        last_finished = Some(Instant::now());

        match result {
            Ok(Some(found)) => {
                store.fill_coordinate(index, found.coordinate());
                summary.succeeded += 1;
                progress.set_message(format!("{} geocoded", summary.succeeded));

                if summary.succeeded % options.checkpoint_every == 0 {
                    log::info!("Checkpointing after {} successes", summary.succeeded);
                    write_checkpoint(store, sink, &mut summary).await;
                }
            }
            Ok(None) => {
                log::warn!("Record {}: no match for {query}", index + 1);
                summary.failed += 1;
            }
            Err(e) => {
                log::warn!("Record {}: lookup failed for {query}: {e}", index + 1);
                summary.failed += 1;
            }
        }
    }

    log::info!("Writing final checkpoint");
    write_checkpoint(store, sink, &mut summary).await;

    progress.finish(format!(
        "{} geocoded, {} failed",
        summary.succeeded, summary.failed
    ));
    log::info!(
        "Backfill complete: {} records, {} already located, {} without address, \
         {} geocoded, {} failed, {} checkpoint(s) written, {} checkpoint failure(s)",
        summary.total,
        summary.skipped_located,
        summary.skipped_no_address,
        summary.succeeded,
        summary.failed,
        summary.checkpoints_written,
        summary.checkpoint_failures,
    );

    Ok(summary)
}

async fn write_checkpoint(
    store: &RecordStore,
    sink: &dyn CheckpointSink,
    summary: &mut BackfillSummary,
) {
    match sink.persist(&store.to_dataset().to_value()).await {
        Ok(()) => summary.checkpoints_written += 1,
        Err(e) => {
            log::warn!("Checkpoint failed, continuing: {e}");
            summary.checkpoint_failures += 1;
        }
    }
}
