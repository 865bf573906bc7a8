//! On-disk page cache with conditional revalidation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{
    ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const FORMAT_VERSION: u32 = 2;
const CACHE_DIR: &str = "footy_tables";
const CACHE_FILE: &str = "pages.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    pages: HashMap<String, CachedPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CachedPage {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    stored_at: DateTime<Utc>,
}

impl CachedPage {
    fn from_response(body: String, headers: &HeaderMap) -> Self {
        let header = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            body,
            etag: header(ETAG),
            last_modified: header(LAST_MODIFIED),
            stored_at: Utc::now(),
        }
    }

    fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }

    fn revalidate(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(etag) = &self.etag {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = &self.last_modified {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
        req
    }
}

/// Pages keyed by URL, loaded lazily from `path` and written back after
/// every change. Without a path the cache lives only in memory.
pub struct PageCache {
    path: Option<PathBuf>,
    pages: Mutex<Option<CacheFile>>,
}

impl PageCache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            pages: Mutex::new(None),
        }
    }

    pub fn in_user_cache_dir() -> Self {
        Self {
            path: app_cache_dir().map(|dir| dir.join(CACHE_FILE)),
            pages: Mutex::new(None),
        }
    }

    /// GET `url`, revalidating any stored copy. A 304 serves the stored body.
    pub fn fetch(&self, client: &Client, url: &str) -> Result<String> {
        let stored = self.lookup(url);

        let mut req = client.get(url);
        if let Some(page) = stored.as_ref().filter(|p| p.has_validators()) {
            req = page.revalidate(req);
        }

        let resp = req.send().context("request failed")?;
        let status = resp.status();
        if status == StatusCode::NOT_MODIFIED {
            let page = stored.ok_or_else(|| anyhow!("304 for a page that is not cached"))?;
            debug!(url, stored_at = %page.stored_at, "page not modified");
            return Ok(page.body);
        }
        if !status.is_success() {
            return Err(anyhow!("http {status}"));
        }

        let headers = resp.headers().clone();
        let body = resp.text().context("failed reading body")?;
        self.store(url, CachedPage::from_response(body.clone(), &headers));
        Ok(body)
    }

    fn lookup(&self, url: &str) -> Option<CachedPage> {
        let mut guard = self.pages.lock().unwrap_or_else(|p| p.into_inner());
        let file = guard.get_or_insert_with(|| read_cache_file(self.path.as_deref()));
        file.pages.get(url).cloned()
    }

    fn store(&self, url: &str, page: CachedPage) {
        let mut guard = self.pages.lock().unwrap_or_else(|p| p.into_inner());
        let file = guard.get_or_insert_with(|| read_cache_file(self.path.as_deref()));
        file.pages.insert(url.to_string(), page);
        if let Some(path) = &self.path
            && let Err(err) = write_cache_file(path, file)
        {
            warn!(path = %path.display(), error = %err, "could not save page cache");
        }
    }
}

// A missing, unreadable or outdated file starts an empty cache.
fn read_cache_file(path: Option<&Path>) -> CacheFile {
    let Some(raw) = path.and_then(|p| fs::read_to_string(p).ok()) else {
        return CacheFile::default();
    };
    match serde_json::from_str::<CacheFile>(&raw) {
        Ok(file) if file.version == FORMAT_VERSION => file,
        _ => CacheFile::default(),
    }
}

fn write_cache_file(path: &Path, file: &mut CacheFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    file.version = FORMAT_VERSION;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(file).context("serialize page cache")?;
    fs::write(&tmp, json).context("write page cache")?;
    fs::rename(&tmp, path).context("replace page cache")?;
    Ok(())
}

/// `$XDG_CACHE_HOME/footy_tables`, falling back to `~/.cache/footy_tables`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
