//! Source registry: loads all source definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a new source means adding a
//! TOML file and one line below.

use crate::source_def::{SourceDefinition, parse_source_toml};

/// Environment variable holding a comma-separated source id filter.
pub const SOURCES_ENV: &str = "TRASH_BIN_MAP_SOURCES";

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("seoul_sample", include_str!("../sources/seoul_sample.toml")),
    ("odcloud_seoul", include_str!("../sources/odcloud_seoul.toml")),
    (
        "seoul_district_file",
        include_str!("../sources/seoul_district_file.toml"),
    ),
];

#[cfg(test)]
const EXPECTED_SOURCE_COUNT: usize = 3;

/// Returns all configured source definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sources() -> Vec<SourceDefinition> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the sources to load, filtered by the `--sources` CLI flag or the
/// [`SOURCES_ENV`] environment variable. Without a filter, only enabled
/// sources are returned; an explicit filter may name disabled ones.
#[must_use]
pub fn enabled_sources(cli_filter: Option<String>) -> Vec<SourceDefinition> {
    let filter = cli_filter.or_else(|| std::env::var(SOURCES_ENV).ok());
    select_sources(all_sources(), filter.as_deref())
}

fn select_sources(all: Vec<SourceDefinition>, filter: Option<&str>) -> Vec<SourceDefinition> {
    let Some(filter) = filter.filter(|f| !f.trim().is_empty()) else {
        return all.into_iter().filter(|s| s.enabled).collect();
    };

    let ids: Vec<&str> = filter.split(',').map(str::trim).collect();
    let available = all.iter().map(|s| s.id.clone()).collect::<Vec<_>>();
    let filtered: Vec<SourceDefinition> =
        all.into_iter().filter(|s| ids.contains(&s.id())).collect();

    if filtered.is_empty() {
        log::warn!(
            "No matching sources found for filter {ids:?}. Available: {}",
            available.join(", ")
        );
    }

    filtered
}
