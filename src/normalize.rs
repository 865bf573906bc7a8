use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::record::{MatchId, MatchRecord, MatchStatus, RoundType, Tally};

pub const FIXTURE_FIELDS: usize = 3;
pub const RESULT_FIELDS: usize = 16;

// Multiplier that folds a season into fixture identifiers.
const SEASON_ID_STRIDE: u32 = 1000;

const PLACEHOLDERS: &[&str] = &["", "-", "NA", "N/A", "na"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y"];
// Listing style without a year, e.g. "Thu 22 Mar 7:25pm".
const SEASONAL_FORMAT: &str = "%a %d %b %I:%M%p %Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Fixture,
    Result,
}

impl RowKind {
    pub fn expected_fields(self) -> usize {
        match self {
            RowKind::Fixture => FIXTURE_FIELDS,
            RowKind::Result => RESULT_FIELDS,
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Fixture => f.write_str("fixture"),
            RowKind::Result => f.write_str("result"),
        }
    }
}

/// Where a fixture row sits in its season. Fixture listings carry neither an
/// identifier nor a round, so the fixture pipeline supplies both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureSlot {
    pub season: i32,
    pub ordinal: u32,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRow {
    Fixture { fields: Vec<String>, slot: FixtureSlot },
    Result { fields: Vec<String> },
}

impl RawRow {
    pub fn fixture(fields: Vec<String>, slot: FixtureSlot) -> Self {
        RawRow::Fixture { fields, slot }
    }

    pub fn result(fields: Vec<String>) -> Self {
        RawRow::Result { fields }
    }

    pub fn kind(&self) -> RowKind {
        match self {
            RawRow::Fixture { .. } => RowKind::Fixture,
            RawRow::Result { .. } => RowKind::Result,
        }
    }

    pub fn fields(&self) -> &[String] {
        match self {
            RawRow::Fixture { fields, .. } | RawRow::Result { fields } => fields,
        }
    }
}

pub fn normalize(raw: &RawRow) -> Result<MatchRecord> {
    check_shape(raw.kind(), raw.fields())?;
    match raw {
        RawRow::Fixture { fields, slot } => normalize_fixture(fields, *slot),
        RawRow::Result { fields } => normalize_result(fields),
    }
}

pub fn check_shape(kind: RowKind, fields: &[String]) -> Result<()> {
    let expected = kind.expected_fields();
    if fields.len() != expected {
        return Err(Error::MalformedRow {
            kind,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn normalize_fixture(fields: &[String], slot: FixtureSlot) -> Result<MatchRecord> {
    let kind = RowKind::Fixture;
    let date = parse_kickoff(&fields[0], Some(slot.season))
        .ok_or_else(|| invalid(kind, "date", &fields[0]))?;
    let (home_team, away_team) =
        split_teams(&fields[1]).ok_or_else(|| invalid(kind, "teams", &fields[1]))?;
    if slot.ordinal == 0 || slot.ordinal >= SEASON_ID_STRIDE {
        return Err(invalid(kind, "ordinal", &slot.ordinal.to_string()));
    }
    let id = fixture_id(slot.season, slot.ordinal)
        .ok_or_else(|| invalid(kind, "season", &slot.season.to_string()))?;
    if slot.round == 0 {
        return Err(invalid(kind, "round", "0"));
    }

    Ok(MatchRecord {
        id,
        date,
        season: slot.season,
        round: slot.round,
        round_label: format!("R{}", slot.round),
        round_type: RoundType::Regular,
        home_team,
        away_team,
        home_score: Tally::Unscored,
        away_score: Tally::Unscored,
        venue: collapse_ws(&fields[2]),
        status: MatchStatus::Scheduled,
    })
}

fn normalize_result(fields: &[String]) -> Result<MatchRecord> {
    let kind = RowKind::Result;
    let id = parse_number::<MatchId>(kind, "Game", fields[0].trim_end_matches('.'))?;
    let season = parse_number::<i32>(kind, "Season", &fields[13])?;
    let date =
        parse_kickoff(&fields[1], Some(season)).ok_or_else(|| invalid(kind, "Date", &fields[1]))?;
    let round_type =
        RoundType::parse(&fields[14]).ok_or_else(|| invalid(kind, "Round.Type", &fields[14]))?;
    let round = parse_number::<u32>(kind, "Round.Number", &fields[15])?;
    if round == 0 {
        return Err(invalid(kind, "Round.Number", &fields[15]));
    }

    let home_score = parse_tally(kind, "Home", &fields[4], &fields[5], &fields[6])?;
    let away_score = parse_tally(kind, "Away", &fields[8], &fields[9], &fields[10])?;
    let margin = if is_placeholder(&fields[12]) {
        None
    } else {
        Some(parse_number::<i32>(kind, "Margin", &fields[12])?)
    };

    let status = match (home_score.points(), away_score.points(), margin) {
        (None, None, None) => MatchStatus::Scheduled,
        (Some(_), Some(_), None) => MatchStatus::InProgress,
        (Some(home), Some(away), Some(margin)) => {
            if i32::from(home) - i32::from(away) != margin {
                return Err(invalid(kind, "Margin", &fields[12]));
            }
            MatchStatus::Final
        }
        _ => return Err(invalid(kind, "score", &fields[4..11].join(","))),
    };

    Ok(MatchRecord {
        id,
        date,
        season,
        round,
        round_label: fields[2].trim().to_string(),
        round_type,
        home_team: collapse_ws(&fields[3]),
        away_team: collapse_ws(&fields[7]),
        home_score,
        away_score,
        venue: collapse_ws(&fields[11]),
        status,
    })
}

fn parse_tally(
    kind: RowKind,
    side: &'static str,
    goals: &str,
    behinds: &str,
    points: &str,
) -> Result<Tally> {
    match (is_placeholder(goals), is_placeholder(behinds)) {
        (true, true) => {
            if !is_placeholder(points) {
                return Err(invalid(kind, points_field(side), points));
            }
            Ok(Tally::Unscored)
        }
        (false, false) => {
            let tally = Tally::scored(
                parse_number(kind, goals_field(side), goals)?,
                parse_number(kind, behinds_field(side), behinds)?,
            );
            let total = tally
                .points()
                .ok_or_else(|| invalid(kind, goals_field(side), goals))?;
            if !is_placeholder(points) {
                let stated = parse_number::<u16>(kind, points_field(side), points)?;
                if stated != total {
                    return Err(invalid(kind, points_field(side), points));
                }
            }
            Ok(tally)
        }
        _ => Err(invalid(kind, goals_field(side), &format!("{goals}.{behinds}"))),
    }
}

fn goals_field(side: &'static str) -> &'static str {
    if side == "Home" { "Home.Goals" } else { "Away.Goals" }
}

fn behinds_field(side: &'static str) -> &'static str {
    if side == "Home" { "Home.Behinds" } else { "Away.Behinds" }
}

fn points_field(side: &'static str) -> &'static str {
    if side == "Home" { "Home.Points" } else { "Away.Points" }
}

fn parse_number<T: std::str::FromStr>(kind: RowKind, field: &'static str, raw: &str) -> Result<T> {
    raw.trim().parse::<T>().map_err(|_| invalid(kind, field, raw))
}

fn invalid(kind: RowKind, field: &'static str, value: &str) -> Error {
    Error::InvalidField {
        kind,
        field,
        value: value.to_string(),
    }
}

pub fn is_placeholder(raw: &str) -> bool {
    PLACEHOLDERS.contains(&raw.trim())
}

/// Parses a kickoff in any of the source conventions. `season` completes
/// listings that omit the year.
pub fn parse_kickoff(raw: &str, season: Option<i32>) -> Option<NaiveDateTime> {
    let cleaned = collapse_ws(raw);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    let season = season?;
    NaiveDateTime::parse_from_str(&format!("{cleaned} {season}"), SEASONAL_FORMAT).ok()
}

/// Splits a paired team cell such as `"Richmond\nv \nCarlton"` or
/// `"Richmond v Carlton"` into home and away names.
pub fn split_teams(raw: &str) -> Option<(String, String)> {
    let parts: Vec<String> = if raw.contains('\n') {
        raw.lines()
            .map(collapse_ws)
            .filter(|line| !line.is_empty() && !is_separator(line))
            .collect()
    } else {
        let cleaned = collapse_ws(raw);
        let mut found = Vec::new();
        for sep in [" v ", " vs ", " vs. "] {
            if let Some((home, away)) = cleaned.split_once(sep) {
                found = vec![home.trim().to_string(), away.trim().to_string()];
                break;
            }
        }
        found
    };

    match parts.as_slice() {
        [home, away] if !home.is_empty() && !away.is_empty() => {
            Some((home.clone(), away.clone()))
        }
        _ => None,
    }
}

fn is_separator(token: &str) -> bool {
    token.eq_ignore_ascii_case("v")
        || token.eq_ignore_ascii_case("vs")
        || token.eq_ignore_ascii_case("vs.")
}

fn fixture_id(season: i32, ordinal: u32) -> Option<MatchId> {
    let season = u32::try_from(season).ok()?;
    season
        .checked_mul(SEASON_ID_STRIDE)?
        .checked_add(ordinal)
}

fn collapse_ws(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
