//! Config-driven dataset source definition.
//!
//! [`SourceDefinition`] captures everything unique about a dataset source
//! in a serializable config struct. A single generic loader,
//! [`SourceLoader`], handles every source.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::dataset::Dataset;
use crate::fields::FieldMapping;
use crate::json_paginated::{JsonPaginatedConfig, fetch_json_paginated};
use crate::progress::{ProgressCallback, null_progress};
use crate::{DatasetLoader, SourceError};

/// User agent sent with every dataset request.
pub const USER_AGENT: &str = concat!("TrashBinMap/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding the data portal credential unless a source
/// names another one.
pub const DEFAULT_API_KEY_ENV: &str = "TRASH_BIN_MAP_SERVICE_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ── Top-level source definition ──────────────────────────────────────────

/// A complete, config-driven dataset source.
///
/// Loaded from TOML files embedded at compile time.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"seoul_sample"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Disabled sources are listed but skipped unless requested by id.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// How to fetch the raw document.
    pub fetcher: FetcherConfig,
    /// Field-fallback overrides. Omitted attributes keep their defaults.
    #[serde(default)]
    pub fields: FieldMapping,
}

const fn default_true() -> bool {
    true
}

impl SourceDefinition {
    /// Returns the source's unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the source's human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ── Fetcher config ───────────────────────────────────────────────────────

/// How to fetch the raw document.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetcherConfig {
    /// A JSON document on local disk.
    StaticFile {
        /// Path to the document, relative to the working directory.
        path: PathBuf,
    },
    /// The public data portal's page-number paginated REST API.
    PaginatedApi {
        /// Endpoint URL without query string.
        api_url: String,
        /// Records per page.
        #[serde(default = "default_page_size")]
        page_size: u64,
        /// Optional cap on pages fetched.
        max_pages: Option<u32>,
        /// Environment variable holding the service key.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
    },
}

const fn default_page_size() -> u64 {
    100
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Parses a [`SourceDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns [`SourceError::Toml`] if the TOML is malformed or missing
/// required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, SourceError> {
    Ok(toml::de::from_str(toml_str)?)
}

/// Reads and parses a static dataset document.
///
/// # Errors
///
/// Returns [`SourceError::Io`] if the file cannot be read, and
/// [`SourceError::Json`] or [`SourceError::Malformed`] if it is not a
/// dataset document.
pub async fn load_static_file(path: &Path) -> Result<Dataset, SourceError> {
    log::info!("Reading dataset from {}", path.display());
    let text = tokio::fs::read_to_string(path).await?;
    Dataset::from_json_str(&text)
}

// ── Generic loader ───────────────────────────────────────────────────────

/// Loads any [`SourceDefinition`].
pub struct SourceLoader {
    definition: SourceDefinition,
    client: reqwest::Client,
    progress: Arc<dyn ProgressCallback>,
}

impl SourceLoader {
    /// Creates a loader with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the HTTP client cannot be built.
    pub fn new(definition: SourceDefinition) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            definition,
            client,
            progress: null_progress(),
        })
    }

    /// Reports fetched record counts to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// The definition this loader was built from.
    #[must_use]
    pub const fn definition(&self) -> &SourceDefinition {
        &self.definition
    }
}

#[async_trait]
impl DatasetLoader for SourceLoader {
    fn label(&self) -> &str {
        &self.definition.name
    }

    fn fields(&self) -> FieldMapping {
        self.definition.fields.clone()
    }

    async fn load(&self) -> Result<Dataset, SourceError> {
        match &self.definition.fetcher {
            FetcherConfig::StaticFile { path } => load_static_file(path).await,
            FetcherConfig::PaginatedApi {
                api_url,
                page_size,
                max_pages,
                api_key_env,
            } => {
                let service_key = std::env::var(api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| SourceError::Config {
                        message: format!(
                            "{}: set {api_key_env} to the data portal service key",
                            self.definition.id
                        ),
                    })?;

                let config = JsonPaginatedConfig {
                    api_url,
                    label: &self.definition.name,
                    page_size: *page_size,
                    max_pages: *max_pages,
                    service_key: &service_key,
                };
                fetch_json_paginated(&self.client, &config, &self.progress).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use crate::load_store;

    use super::*;

    const STATIC_TOML: &str = r#"
        id = "local"
        name = "Local file"

        [fetcher]
        type = "static_file"
        path = "data.json"
    "#;

    #[test]
    fn parses_static_file_source() {
        let source = parse_source_toml(STATIC_TOML).unwrap();
        assert_eq!(source.id(), "local");
        assert!(source.enabled);
        assert!(matches!(
            &source.fetcher,
            FetcherConfig::StaticFile { path } if path == Path::new("data.json")
        ));
        assert_eq!(source.fields, FieldMapping::default());
    }

    #[test]
    fn paginated_api_defaults() {
        let source = parse_source_toml(
            r#"
            id = "api"
            name = "API"
            enabled = false

            [fetcher]
            type = "paginated_api"
            api_url = "https://example.invalid/v1"

            [fields]
            name = ["place"]
            "#,
        )
        .unwrap();
        assert!(!source.enabled);
        match source.fetcher {
            FetcherConfig::PaginatedApi {
                page_size,
                max_pages,
                api_key_env,
                ..
            } => {
                assert_eq!(page_size, 100);
                assert_eq!(max_pages, None);
                assert_eq!(api_key_env, DEFAULT_API_KEY_ENV);
            }
            FetcherConfig::StaticFile { .. } => panic!("expected paginated_api"),
        }
        assert_eq!(source.fields.name, ["place"]);
        assert_eq!(source.fields.address, FieldMapping::default().address);
    }

    #[test]
    fn rejects_unknown_fetcher_type() {
        let err = parse_source_toml(
            r#"
            id = "x"
            name = "x"
            [fetcher]
            type = "ftp"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SourceError::Toml(_)));
    }

    #[tokio::test]
    async fn loads_static_file_into_store() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"데이터": [{{"설치장소명": "a", "위도": 37.5, "경도": 127.0}}, {{"설치장소명": "b"}}]}}"#
        )
        .unwrap();

        let mut source = parse_source_toml(STATIC_TOML).unwrap();
        source.fetcher = FetcherConfig::StaticFile {
            path: file.path().to_path_buf(),
        };
        let loader = SourceLoader::new(source).unwrap();
        let store = load_store(&loader).await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.locatable_count(), 1);
    }

    #[tokio::test]
    async fn missing_static_file_is_io_error() {
        let err = load_static_file(Path::new("/nonexistent/trash-bins.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[tokio::test]
    async fn missing_service_key_is_config_error() {
        let source = SourceDefinition {
            id: "api".to_string(),
            name: "API".to_string(),
            enabled: true,
            fetcher: FetcherConfig::PaginatedApi {
                api_url: "https://example.invalid/v1".to_string(),
                page_size: 100,
                max_pages: None,
                api_key_env: "TRASH_BIN_MAP_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            },
            fields: FieldMapping::default(),
        };
        let err = SourceLoader::new(source).unwrap().load().await.unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
    }
}
