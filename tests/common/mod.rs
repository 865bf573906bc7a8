#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use footy_tables::fetch::PageFetcher;
use footy_tables::{Error, MatchId, MatchRecord, MatchStatus, Result, RoundType, Tally};

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// In-memory pages keyed by locator. Records every locator asked for.
#[derive(Default)]
pub struct MapFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, locator: &str, body: impl Into<String>) -> Self {
        self.pages.insert(locator.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for MapFetcher {
    fn fetch(&self, locator: &str) -> Result<String> {
        self.requests.lock().unwrap().push(locator.to_string());
        self.pages
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::fetch(locator, "http 404 Not Found"))
    }
}

pub fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(hh, mm, 0))
        .unwrap()
}

pub fn final_record(id: MatchId, date: NaiveDateTime, home: (u16, u16), away: (u16, u16)) -> MatchRecord {
    MatchRecord {
        id,
        date,
        season: 2018,
        round: 1,
        round_label: "R1".to_string(),
        round_type: RoundType::Regular,
        home_team: "Richmond".to_string(),
        away_team: "Carlton".to_string(),
        home_score: Tally::scored(home.0, home.1),
        away_score: Tally::scored(away.0, away.1),
        venue: "M.C.G.".to_string(),
        status: MatchStatus::Final,
    }
}

pub fn scheduled_record(id: MatchId, date: NaiveDateTime) -> MatchRecord {
    MatchRecord {
        home_score: Tally::Unscored,
        away_score: Tally::Unscored,
        status: MatchStatus::Scheduled,
        ..final_record(id, date, (0, 0), (0, 0))
    }
}

/// A one-row match page in the row-table format.
pub fn match_page(record: &MatchRecord) -> String {
    serde_json::to_string(&vec![record.canonical_row().into_fields()]).unwrap()
}
