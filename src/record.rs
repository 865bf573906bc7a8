use std::cmp::Reverse;
use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub type MatchId = u32;

/// Column headers of the canonical results table, in order.
pub const COLUMNS: [&str; 16] = [
    "Game",
    "Date",
    "Round",
    "Home.Team",
    "Home.Goals",
    "Home.Behinds",
    "Home.Points",
    "Away.Team",
    "Away.Goals",
    "Away.Behinds",
    "Away.Points",
    "Venue",
    "Margin",
    "Season",
    "Round.Type",
    "Round.Number",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundType {
    Regular,
    Finals,
}

impl RoundType {
    pub fn as_str(self) -> &'static str {
        match self {
            RoundType::Regular => "Regular",
            RoundType::Finals => "Finals",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "regular" => Some(RoundType::Regular),
            "finals" | "final" => Some(RoundType::Finals),
            _ => None,
        }
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side's score. `Unscored` means the match has not produced a score yet,
/// which is distinct from a scoreless side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tally {
    Unscored,
    Scored { goals: u16, behinds: u16 },
}

impl Tally {
    pub fn scored(goals: u16, behinds: u16) -> Self {
        Tally::Scored { goals, behinds }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Tally::Scored { .. })
    }

    pub fn goals(&self) -> Option<u16> {
        match self {
            Tally::Scored { goals, .. } => Some(*goals),
            Tally::Unscored => None,
        }
    }

    pub fn behinds(&self) -> Option<u16> {
        match self {
            Tally::Scored { behinds, .. } => Some(*behinds),
            Tally::Unscored => None,
        }
    }

    /// `None` when unscored, or when the total does not fit a `u16`.
    pub fn points(&self) -> Option<u16> {
        match self {
            Tally::Scored { goals, behinds } => goals.checked_mul(6)?.checked_add(*behinds),
            Tally::Unscored => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub date: NaiveDateTime,
    pub season: i32,
    pub round: u32,
    pub round_label: String,
    pub round_type: RoundType,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Tally,
    pub away_score: Tally,
    pub venue: String,
    pub status: MatchStatus,
}

impl MatchRecord {
    /// Home points minus away points, only once the result is final.
    pub fn margin(&self) -> Option<i32> {
        if self.status != MatchStatus::Final {
            return None;
        }
        let home = self.home_score.points()?;
        let away = self.away_score.points()?;
        Some(i32::from(home) - i32::from(away))
    }

    /// Date ascending, then id ascending, then status descending.
    pub fn sort_key(&self) -> (NaiveDateTime, MatchId, Reverse<MatchStatus>) {
        (self.date, self.id, Reverse(self.status))
    }

    pub fn canonical_row(&self) -> CanonicalRow {
        CanonicalRow {
            game: self.id,
            date: format_date(self.date),
            round: self.round_label.clone(),
            home_team: self.home_team.clone(),
            home_goals: self.home_score.goals(),
            home_behinds: self.home_score.behinds(),
            home_points: self.home_score.points(),
            away_team: self.away_team.clone(),
            away_goals: self.away_score.goals(),
            away_behinds: self.away_score.behinds(),
            away_points: self.away_score.points(),
            venue: self.venue.clone(),
            margin: self.margin(),
            season: self.season,
            round_type: self.round_type.as_str().to_string(),
            round_number: self.round,
        }
    }
}

pub fn sort_records(records: &mut [MatchRecord]) {
    records.sort_by_key(MatchRecord::sort_key);
}

/// Serialized shape of a match in the 16-column results schema. Archives are
/// deserialized into this type and then normalized like any other result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    #[serde(rename = "Game")]
    pub game: MatchId,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Round")]
    pub round: String,
    #[serde(rename = "Home.Team")]
    pub home_team: String,
    #[serde(rename = "Home.Goals")]
    pub home_goals: Option<u16>,
    #[serde(rename = "Home.Behinds")]
    pub home_behinds: Option<u16>,
    #[serde(rename = "Home.Points")]
    pub home_points: Option<u16>,
    #[serde(rename = "Away.Team")]
    pub away_team: String,
    #[serde(rename = "Away.Goals")]
    pub away_goals: Option<u16>,
    #[serde(rename = "Away.Behinds")]
    pub away_behinds: Option<u16>,
    #[serde(rename = "Away.Points")]
    pub away_points: Option<u16>,
    #[serde(rename = "Venue")]
    pub venue: String,
    #[serde(rename = "Margin")]
    pub margin: Option<i32>,
    #[serde(rename = "Season")]
    pub season: i32,
    #[serde(rename = "Round.Type")]
    pub round_type: String,
    #[serde(rename = "Round.Number")]
    pub round_number: u32,
}

impl CanonicalRow {
    pub fn into_fields(self) -> Vec<String> {
        vec![
            self.game.to_string(),
            self.date,
            self.round,
            self.home_team,
            opt_to_string(self.home_goals),
            opt_to_string(self.home_behinds),
            opt_to_string(self.home_points),
            self.away_team,
            opt_to_string(self.away_goals),
            opt_to_string(self.away_behinds),
            opt_to_string(self.away_points),
            self.venue,
            opt_to_string(self.margin),
            self.season.to_string(),
            self.round_type,
            self.round_number.to_string(),
        ]
    }

    pub fn to_fields(&self) -> Vec<String> {
        self.clone().into_fields()
    }
}

fn opt_to_string<T: fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_date(date: NaiveDateTime) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M").to_string()
    }
}
