use std::fs;

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http_cache::PageCache;
use crate::http_client::http_client;
use crate::normalize::{RawRow, normalize};
use crate::record::{CanonicalRow, MatchRecord, sort_records};

/// Returns the raw body behind a locator. Failures are final for that locator.
pub trait PageFetcher: Sync {
    fn fetch(&self, locator: &str) -> Result<String>;
}

/// Loads a previously published results table.
pub trait RemoteArchive {
    fn load(&self, location: &str) -> Result<Vec<MatchRecord>>;
}

pub struct HttpPageFetcher {
    client: &'static Client,
    cache: Option<PageCache>,
}

impl HttpPageFetcher {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(settings.request_timeout_secs)?,
            cache: settings.http_cache.then(PageCache::in_user_cache_dir),
        })
    }

    fn fetch_uncached(&self, url: &str) -> anyhow::Result<String> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {status}"));
        }
        Ok(resp.text()?)
    }
}

impl PageFetcher for HttpPageFetcher {
    fn fetch(&self, locator: &str) -> Result<String> {
        if let Some(path) = local_path(locator) {
            debug!(path, "reading local page");
            return fs::read_to_string(path).map_err(|err| Error::fetch(locator, err));
        }
        debug!(url = locator, cached = self.cache.is_some(), "fetching page");
        let body = match &self.cache {
            Some(cache) => cache.fetch(self.client, locator),
            None => self.fetch_uncached(locator),
        };
        body.map_err(|err| Error::fetch(locator, format!("{err:#}")))
    }
}

// Anything that is not http(s) is treated as a file on disk.
fn local_path(locator: &str) -> Option<&str> {
    if let Some(path) = locator.strip_prefix("file://") {
        return Some(path);
    }
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return None;
    }
    Some(locator)
}

/// Archive published as a JSON array of canonical rows.
pub struct JsonArchive<'a, F: PageFetcher> {
    fetcher: &'a F,
}

impl<'a, F: PageFetcher> JsonArchive<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }
}

impl<F: PageFetcher> RemoteArchive for JsonArchive<'_, F> {
    fn load(&self, location: &str) -> Result<Vec<MatchRecord>> {
        let body = self.fetcher.fetch(location)?;
        decode_archive(&body, location)
    }
}

/// Decodes and validates an archive body. Every row goes through the same
/// normalizer as freshly scraped results.
pub fn decode_archive(body: &str, location: &str) -> Result<Vec<MatchRecord>> {
    let rows: Vec<CanonicalRow> =
        serde_json::from_str(body.trim()).map_err(|err| Error::Archive {
            location: location.to_string(),
            message: err.to_string(),
        })?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(normalize(&RawRow::result(row.into_fields()))?);
    }
    sort_records(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locators_without_scheme_are_files() {
        assert_eq!(local_path("file:///tmp/a.txt"), Some("/tmp/a.txt"));
        assert_eq!(local_path("data/a.txt"), Some("data/a.txt"));
        assert_eq!(local_path("https://afltables.com/"), None);
    }

    #[test]
    fn archive_rejects_non_tables() {
        let err = decode_archive("{\"Game\": 1}", "mem://archive").unwrap_err();
        assert!(matches!(err, Error::Archive { .. }));
    }
}
