//! Parsers for the raw payloads handed back by page fetchers.
//!
//! Three shapes are understood:
//! - the afltables fixed-width results list (`bg3.txt`), one match per line;
//! - row tables, a JSON array of string arrays, used for fixture pages and
//!   single-match pages;
//! - id listings, integers separated by commas, semicolons or whitespace
//!   (a JSON array of integers also parses).

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDateTime};

use crate::error::{Error, Result};
use crate::normalize::{RawRow, RowKind, parse_kickoff};
use crate::record::MatchId;
use crate::rounds::infer_rounds;

#[derive(Debug, Clone)]
struct ListingLine {
    game: MatchId,
    date_raw: String,
    date: NaiveDateTime,
    round: String,
    home_team: String,
    home: (u16, u16, u16),
    away_team: String,
    away: (u16, u16, u16),
    venue: String,
}

/// Parses the results list into 16-field result rows.
///
/// Regular rounds are labelled `R<n>`. Anything else is a final; finals are
/// numbered on from the season's last regular round, one number per finals
/// weekend.
pub fn parse_results_listing(text: &str) -> Result<Vec<RawRow>> {
    let mut lines = Vec::new();
    for line in text.lines() {
        if !is_match_line(line) {
            continue;
        }
        lines.push(parse_listing_line(line)?);
    }

    let mut last_regular: HashMap<i32, u32> = HashMap::new();
    let mut finals_by_season: HashMap<i32, Vec<usize>> = HashMap::new();
    for (idx, line) in lines.iter().enumerate() {
        let season = line.date.year();
        match regular_round(&line.round) {
            Some(n) => {
                let entry = last_regular.entry(season).or_insert(0);
                *entry = (*entry).max(n);
            }
            None => finals_by_season.entry(season).or_default().push(idx),
        }
    }

    let mut finals_round: HashMap<usize, u32> = HashMap::new();
    for (season, indices) in &finals_by_season {
        let kickoffs: Vec<NaiveDateTime> = indices.iter().map(|i| lines[*i].date).collect();
        let weeks = infer_rounds(&kickoffs)?;
        let base = last_regular.get(season).copied().unwrap_or(0);
        for (idx, week) in indices.iter().zip(weeks) {
            finals_round.insert(*idx, base + week);
        }
    }

    let mut out = Vec::with_capacity(lines.len());
    for (idx, line) in lines.into_iter().enumerate() {
        let (round_type, round_number) = match regular_round(&line.round) {
            Some(n) => ("Regular", n),
            None => ("Finals", finals_round.get(&idx).copied().unwrap_or(1)),
        };
        let margin = i32::from(line.home.2) - i32::from(line.away.2);
        out.push(RawRow::result(vec![
            line.game.to_string(),
            line.date_raw,
            line.round,
            line.home_team,
            line.home.0.to_string(),
            line.home.1.to_string(),
            line.home.2.to_string(),
            line.away_team,
            line.away.0.to_string(),
            line.away.1.to_string(),
            line.away.2.to_string(),
            line.venue,
            margin.to_string(),
            line.date.year().to_string(),
            round_type.to_string(),
            round_number.to_string(),
        ]));
    }
    Ok(out)
}

// Match lines open with the game number followed by a dot; headers and
// footers do not.
fn is_match_line(line: &str) -> bool {
    let Some(first) = line.split_whitespace().next() else {
        return false;
    };
    first
        .strip_suffix('.')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn parse_listing_line(line: &str) -> Result<ListingLine> {
    let bad = || Error::InvalidField {
        kind: RowKind::Result,
        field: "listing line",
        value: line.trim().to_string(),
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 8 {
        return Err(bad());
    }
    let game = tokens[0]
        .trim_end_matches('.')
        .parse::<MatchId>()
        .map_err(|_| bad())?;
    let date = parse_kickoff(tokens[1], None).ok_or_else(bad)?;

    let scores: Vec<usize> = tokens
        .iter()
        .enumerate()
        .skip(4)
        .filter(|(_, t)| parse_score(t).is_some())
        .map(|(i, _)| i)
        .collect();
    let [home_at, away_at] = scores[..] else {
        return Err(bad());
    };
    if away_at <= home_at + 1 || away_at + 1 >= tokens.len() {
        return Err(bad());
    }

    let home = parse_score(tokens[home_at]).ok_or_else(bad)?;
    let away = parse_score(tokens[away_at]).ok_or_else(bad)?;

    Ok(ListingLine {
        game,
        date_raw: tokens[1].to_string(),
        date,
        round: tokens[2].to_string(),
        home_team: tokens[3..home_at].join(" "),
        home,
        away_team: tokens[home_at + 1..away_at].join(" "),
        away,
        venue: tokens[away_at + 1..].join(" "),
    })
}

/// `"6.13.49"` → goals, behinds, points.
fn parse_score(token: &str) -> Option<(u16, u16, u16)> {
    let mut parts = token.split('.');
    let goals = parts.next()?.parse().ok()?;
    let behinds = parts.next()?.parse().ok()?;
    let points = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((goals, behinds, points))
}

fn regular_round(label: &str) -> Option<u32> {
    label.strip_prefix('R')?.parse().ok()
}

/// Decodes a row table. `null` and empty bodies are an empty table.
pub fn parse_row_table(text: &str) -> std::result::Result<Vec<Vec<String>>, serde_json::Error> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed)
}

pub fn parse_id_listing(text: &str) -> Result<BTreeSet<MatchId>> {
    let mut out = BTreeSet::new();
    for part in text.split([',', ';', ' ', '\n', '\r', '\t', '[', ']']) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part.parse::<MatchId>().map_err(|_| Error::InvalidField {
            kind: RowKind::Result,
            field: "Game",
            value: part.to_string(),
        })?;
        out.insert(id);
    }
    Ok(out)
}
