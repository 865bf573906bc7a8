use std::path::PathBuf;

use crate::http_cache::app_cache_dir;

pub const DEFAULT_RESULTS_URL: &str = "https://afltables.com/afl/stats/biglists/bg3.txt";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PARALLELISM: usize = 6;
const DB_FILE: &str = "match_results.sqlite";

/// Runtime settings, read from `FOOTY_*` environment variables (a `.env`
/// file is honoured). Command-line flags override these.
#[derive(Debug, Clone)]
pub struct Settings {
    pub results_url: String,
    /// Fixture page template; `{season}` is substituted.
    pub fixture_url: Option<String>,
    /// Listing of every match id the source holds.
    pub index_url: Option<String>,
    /// Single-match page template; `{id}` is substituted.
    pub match_url: Option<String>,
    pub archive_url: Option<String>,
    pub db_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub fetch_parallelism: usize,
    pub trust_archive: bool,
    pub http_cache: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_url: DEFAULT_RESULTS_URL.to_string(),
            fixture_url: None,
            index_url: None,
            match_url: None,
            archive_url: None,
            db_path: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            fetch_parallelism: DEFAULT_PARALLELISM,
            trust_archive: true,
            http_cache: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup, so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            results_url: text("FOOTY_RESULTS_URL").unwrap_or(defaults.results_url),
            fixture_url: text("FOOTY_FIXTURE_URL"),
            index_url: text("FOOTY_INDEX_URL"),
            match_url: text("FOOTY_MATCH_URL"),
            archive_url: text("FOOTY_ARCHIVE_URL"),
            db_path: text("FOOTY_DB_PATH").map(PathBuf::from),
            request_timeout_secs: text("FOOTY_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.request_timeout_secs)
                .max(1),
            fetch_parallelism: text("FOOTY_FETCH_PARALLELISM")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(defaults.fetch_parallelism)
                .clamp(1, 32),
            trust_archive: text("FOOTY_TRUST_ARCHIVE")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.trust_archive),
            http_cache: text("FOOTY_HTTP_CACHE")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.http_cache),
        }
    }

    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        self.db_path
            .clone()
            .or_else(|| app_cache_dir().map(|dir| dir.join(DB_FILE)))
    }

    pub fn fixture_locator(&self, season: i32) -> Option<String> {
        self.fixture_url
            .as_deref()
            .map(|t| t.replace("{season}", &season.to_string()))
    }

    pub fn match_locator(&self, id: u32) -> Option<String> {
        self.match_url
            .as_deref()
            .map(|t| t.replace("{id}", &id.to_string()))
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let s = settings(&[]);
        assert_eq!(s.results_url, DEFAULT_RESULTS_URL);
        assert_eq!(s.fetch_parallelism, 6);
        assert!(s.trust_archive);
        assert!(s.fixture_url.is_none());
    }

    #[test]
    fn parallelism_is_clamped_and_flags_parse() {
        let s = settings(&[
            ("FOOTY_FETCH_PARALLELISM", "500"),
            ("FOOTY_TRUST_ARCHIVE", "no"),
            ("FOOTY_HTTP_CACHE", "maybe"),
        ]);
        assert_eq!(s.fetch_parallelism, 32);
        assert!(!s.trust_archive);
        assert!(s.http_cache);
    }

    #[test]
    fn templates_substitute() {
        let s = settings(&[
            ("FOOTY_FIXTURE_URL", "https://example.test/fixture/{season}.json"),
            ("FOOTY_MATCH_URL", "https://example.test/match/{id}.json"),
        ]);
        assert_eq!(
            s.fixture_locator(2018).as_deref(),
            Some("https://example.test/fixture/2018.json")
        );
        assert_eq!(
            s.match_locator(42).as_deref(),
            Some("https://example.test/match/42.json")
        );
    }
}
