//! HTTP asset backend.
//! Fetches flags from `<base_url>/flags/<code>.svg` for deployments that
//! serve the SVG files separately instead of embedding them.

use crate::assets::{
    flag_path, is_well_formed, normalize_country_code, AssetError, AssetSource, AssetStore, Markup,
};
use futures_util::future::join_all;
use std::borrow::Cow;
use std::time::Duration;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Asset source backed by an HTTP server
#[derive(Debug, Clone)]
pub struct HttpAssets {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpAssets {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of a (normalized) country code
    pub fn url_for(&self, code: &str) -> String {
        format!("{}{}", self.base_url, flag_path(code))
    }
}

impl AssetSource for HttpAssets {
    async fn resolve(&self, code: &str) -> Result<Markup, AssetError> {
        let code = normalize_country_code(code);
        if !is_well_formed(&code) {
            tracing::debug!("Not fetching malformed country code {:?}", code);
            return Err(AssetError::NotFound(code));
        }
        let url = self.url_for(&code);
        tracing::debug!("Fetching flag from {}", url);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| AssetError::FetchFailed { code: code.clone(), source })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound(code));
        }
        if !status.is_success() {
            return Err(AssetError::Status { code, status: status.as_u16() });
        }

        let body = response
            .text()
            .await
            .map_err(|source| AssetError::FetchFailed { code: code.clone(), source })?;
        Ok(Cow::Owned(body))
    }
}

/// Resolves `codes` concurrently and keeps the hits in an in-memory store,
/// for components that need many flags synchronously (e.g. a selector).
/// Failed lookups are logged and left out.
pub async fn prefetch<S: AssetSource>(source: &S, codes: &[&str]) -> AssetStore {
    let results = join_all(codes.iter().map(|code| async move {
        let result = source.resolve(code).await;
        (normalize_country_code(code), result)
    }))
    .await;

    let mut hits = Vec::with_capacity(results.len());
    for (code, result) in results {
        match result {
            Ok(svg) => hits.push((code, svg)),
            Err(e) if e.is_not_found() => tracing::debug!("Prefetch: {}", e),
            Err(e) => tracing::warn!("Prefetch of {} failed: {}", code, e),
        }
    }
    tracing::info!("Prefetched {} of {} flags", hits.len(), codes.len());
    AssetStore::from_entries(hits)
}
