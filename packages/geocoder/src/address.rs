//! Geocoding query construction.
//!
//! The district export stores a road address relative to its district
//! (`"세종대로 110"` under `자치구명 = "중구"`), while the API schema stores a
//! full road address (`"서울특별시 중구 세종대로 110"`). Both become a
//! single free-form query of the form `<region> <district> <address>`.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of whitespace, including full-width and non-breaking spaces.
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Administrative suffixes that turn a short region name into its long
/// form (`서울` into `서울특별시` or `서울시`).
const ADMIN_SUFFIXES: &[&str] = &["특별시", "광역시", "특별자치시", "특별자치도", "시", "도"];

/// Collapses whitespace runs into single spaces and trims the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

/// Builds a free-form query for `address`.
///
/// Empty parts are skipped. `region` and `district` are left out when the
/// address already contains them as a whole word, or in a long form
/// (`서울특별시` covers `서울`). Road names that merely begin with the
/// region (`서울숲2길`, `서울로`) do not count. Returns `None` when the
/// address is blank.
#[must_use]
pub fn build_query(region: Option<&str>, district: Option<&str>, address: &str) -> Option<String> {
    let address = collapse_whitespace(address);
    if address.is_empty() {
        return None;
    }

    let mut parts = Vec::with_capacity(3);
    for prefix in [region, district].into_iter().flatten() {
        let prefix = collapse_whitespace(prefix);
        if !prefix.is_empty() && !address.split(' ').any(|word| names(word, &prefix)) {
            parts.push(prefix);
        }
    }
    parts.push(address);

    Some(parts.join(" "))
}

/// Whether `word` is `name` or one of its administrative long forms.
fn names(word: &str, name: &str) -> bool {
    word.strip_prefix(name)
        .is_some_and(|rest| rest.is_empty() || ADMIN_SUFFIXES.contains(&rest))
}
