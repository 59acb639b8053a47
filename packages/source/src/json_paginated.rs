//! Page-number paginated JSON API fetcher.
//!
//! Talks to the public data portal's REST endpoints
//! (`?page=N&perPage=M&returnType=json&serviceKey=...`), which answer with
//! `{ "data": [...], "totalCount": ... }` or, for some datasets, a bare
//! array. Pages are accumulated into a single [`Dataset`]; a failed page
//! fails the whole load.

use std::sync::Arc;

use crate::SourceError;
use crate::dataset::{Dataset, DocumentLayout};
use crate::progress::ProgressCallback;
use crate::retry;

/// Keys the portal uses for the total number of matching rows.
const TOTAL_COUNT_KEYS: &[&str] = &["totalCount", "matchCount"];

/// Configuration for the paginated JSON fetcher.
pub struct JsonPaginatedConfig<'a> {
    /// Endpoint URL without query string.
    pub api_url: &'a str,
    /// Human-readable label for log messages.
    pub label: &'a str,
    /// Records per page (`perPage`).
    pub page_size: u64,
    /// Hard cap on the number of pages requested.
    pub max_pages: Option<u32>,
    /// API credential, sent both as `serviceKey` and as a bearer token.
    pub service_key: &'a str,
}

/// Fetches every page and returns the combined dataset.
///
/// # Errors
///
/// Returns [`SourceError`] if any page fetch fails or a page is not a
/// record array.
#[allow(clippy::future_not_send)]
pub async fn fetch_json_paginated(
    client: &reqwest::Client,
    config: &JsonPaginatedConfig<'_>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, SourceError> {
    log::info!(
        "[{}] Fetching paginated JSON from {} (perPage={})",
        config.label,
        config.api_url,
        config.page_size
    );

    let mut records = Vec::new();
    let mut layout = None;
    let mut page: u32 = 1;

    loop {
        let body = retry::send_json(|| page_request(client, config, page)).await?;

        let total_count = total_count(&body);
        if page == 1
            && let Some(total) = total_count
        {
            progress.set_total(total);
        }

        let dataset = Dataset::from_value(body)?;
        let count = dataset.records.len() as u64;
        progress.inc(count);
        layout.get_or_insert_with(|| without_envelope(dataset.layout));
        records.extend(dataset.records);

        log::info!(
            "[{}] Page {page}: {count} records (total: {})",
            config.label,
            records.len()
        );

        if !has_more(
            page,
            count,
            config.page_size,
            records.len() as u64,
            total_count,
            config.max_pages,
        ) {
            break;
        }

        page += 1;
    }

    Ok(Dataset {
        records,
        layout: layout.unwrap_or_default(),
    })
}

/// Request for one 1-based page. The key goes both in the query string and
/// in the `Authorization` header; endpoints differ in which one they read.
fn page_request(
    client: &reqwest::Client,
    config: &JsonPaginatedConfig<'_>,
    page: u32,
) -> reqwest::RequestBuilder {
    client
        .get(config.api_url)
        .query(&[
            ("page", page.to_string().as_str()),
            ("perPage", config.page_size.to_string().as_str()),
            ("returnType", "json"),
            ("serviceKey", config.service_key),
        ])
        .bearer_auth(config.service_key)
        .header(reqwest::header::ACCEPT, "application/json")
}

/// Whether another page should be requested after `page` returned `count`
/// rows and `fetched` rows have been collected so far.
fn has_more(
    page: u32,
    count: u64,
    page_size: u64,
    fetched: u64,
    total_count: Option<u64>,
    max_pages: Option<u32>,
) -> bool {
    if count == 0 || count < page_size {
        return false;
    }
    if max_pages.is_some_and(|max| page >= max) {
        return false;
    }
    total_count.is_none_or(|total| fetched < total)
}

fn total_count(body: &serde_json::Value) -> Option<u64> {
    TOTAL_COUNT_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(serde_json::Value::as_u64))
}

/// Page metadata (`page`, `currentCount`, ...) describes one page only, so
/// the combined document keeps just the wrapper key.
fn without_envelope(layout: DocumentLayout) -> DocumentLayout {
    match layout {
        DocumentLayout::Wrapped { key, .. } => DocumentLayout::Wrapped {
            key,
            envelope: serde_json::Map::new(),
        },
        DocumentLayout::BareArray => DocumentLayout::BareArray,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn page_request_carries_paging_params_and_credentials() {
        let client = reqwest::Client::new();
        let config = JsonPaginatedConfig {
            api_url: "https://api.odcloud.kr/api/15068871/v1/uddi",
            label: "test",
            page_size: 100,
            max_pages: None,
            service_key: "secret-key",
        };

        let request = page_request(&client, &config, 3).build().unwrap();

        let query: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            query,
            [
                ("page".to_string(), "3".to_string()),
                ("perPage".to_string(), "100".to_string()),
                ("returnType".to_string(), "json".to_string()),
                ("serviceKey".to_string(), "secret-key".to_string()),
            ]
        );
        assert_eq!(request.url().path(), "/api/15068871/v1/uddi");

        let headers = request.headers();
        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer secret-key"
        );
        assert_eq!(
            headers.get(reqwest::header::ACCEPT).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn stops_on_short_or_empty_page() {
        assert!(!has_more(1, 40, 100, 40, None, None));
        assert!(!has_more(3, 0, 100, 200, None, None));
        assert!(has_more(1, 100, 100, 100, None, None));
    }

    #[test]
    fn stops_at_max_pages() {
        assert!(has_more(1, 100, 100, 100, None, Some(2)));
        assert!(!has_more(2, 100, 100, 200, None, Some(2)));
    }

    #[test]
    fn stops_once_total_count_is_covered() {
        assert!(has_more(1, 100, 100, 100, Some(250), None));
        assert!(!has_more(2, 100, 100, 200, Some(200), None));
    }

    #[test]
    fn reads_total_count() {
        assert_eq!(
            total_count(&json!({ "data": [], "totalCount": 7416 })),
            Some(7416)
        );
        assert_eq!(total_count(&json!({ "matchCount": 3 })), Some(3));
        assert_eq!(total_count(&json!([])), None);
    }

    #[test]
    fn drops_page_metadata_from_layout() {
        let mut envelope = serde_json::Map::new();
        envelope.insert("page".to_string(), json!(1));
        let layout = without_envelope(DocumentLayout::Wrapped {
            key: "data".to_string(),
            envelope,
        });
        assert_eq!(
            layout,
            DocumentLayout::Wrapped {
                key: "data".to_string(),
                envelope: serde_json::Map::new(),
            }
        );
    }
}
