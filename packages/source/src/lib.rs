#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Trash bin dataset sources and normalization logic.
//!
//! Each configured source (a static JSON document or the public data
//! portal's paginated REST endpoint) implements [`DatasetLoader`]. Loaded
//! rows are normalized through a [`fields::FieldMapping`] into the
//! canonical record shape and kept in a [`store::RecordStore`].

pub mod dataset;
pub mod fields;
pub mod json_paginated;
pub mod progress;
pub mod registry;
pub mod retry;
pub mod source_def;
pub mod store;

use async_trait::async_trait;

use crate::dataset::Dataset;
use crate::fields::FieldMapping;
use crate::store::RecordStore;

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source definition is not valid TOML or is missing fields.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The source answered with a non-success status.
    #[error("Source unavailable: HTTP {status} from {url}")]
    Unavailable {
        /// HTTP status code.
        status: u16,
        /// Request URL (without credentials).
        url: String,
    },

    /// The response is not a record array and no known wrapper key matched.
    #[error("Malformed source: {message}")]
    Malformed {
        /// Description of what was wrong with the document.
        message: String,
    },

    /// The source definition is unusable (missing API key, unsupported
    /// option).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// Something that can produce a full dataset document.
///
/// A load either returns every record or fails; partial results are never
/// handed out, so callers can keep their previous store on error.
#[async_trait]
pub trait DatasetLoader: Send + Sync {
    /// Human-readable label used in log lines.
    fn label(&self) -> &str;

    /// Field-fallback table used to normalize this source's records.
    fn fields(&self) -> FieldMapping {
        FieldMapping::default()
    }

    /// Fetches the whole dataset.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the source is unreachable, answers with a
    /// non-success status, or returns an unrecognized document.
    async fn load(&self) -> Result<Dataset, SourceError>;
}

/// Loads a dataset and normalizes it into a fresh [`RecordStore`].
///
/// # Errors
///
/// Returns [`SourceError`] if the underlying load fails.
pub async fn load_store(loader: &dyn DatasetLoader) -> Result<RecordStore, SourceError> {
    let dataset = loader.load().await?;
    let store = RecordStore::new(dataset, loader.fields());
    log::info!(
        "[{}] Loaded {} record(s), {} locatable",
        loader.label(),
        store.len(),
        store.locatable_count()
    );
    Ok(store)
}
