//! Local SQLite cache of match records.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use tracing::debug;

use crate::record::{MatchId, MatchRecord, MatchStatus, RoundType, Tally, sort_records};
use crate::sync::SyncOutcome;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRun {
    pub run_id: i64,
    pub finished_at: String,
    pub planned: usize,
    pub fetched: usize,
    pub failures: Vec<String>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db directory {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            match_date TEXT NOT NULL,
            season INTEGER NOT NULL,
            round INTEGER NOT NULL,
            round_label TEXT NOT NULL,
            round_type TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NULL,
            home_behinds INTEGER NULL,
            away_goals INTEGER NULL,
            away_behinds INTEGER NULL,
            venue TEXT NOT NULL,
            status INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season);
        CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(match_date);

        CREATE TABLE IF NOT EXISTS sync_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            finished_at TEXT NOT NULL,
            planned INTEGER NOT NULL,
            fetched INTEGER NOT NULL,
            failures_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn local_ids(conn: &Connection) -> Result<BTreeSet<MatchId>> {
    let mut stmt = conn
        .prepare("SELECT match_id FROM matches")
        .context("prepare local ids query")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, MatchId>(0))
        .context("query local ids")?;
    let mut out = BTreeSet::new();
    for id in rows {
        out.insert(id.context("decode match id")?);
    }
    Ok(out)
}

pub fn load_records(conn: &Connection) -> Result<Vec<MatchRecord>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                match_id, match_date, season, round, round_label, round_type,
                home_team, away_team, home_goals, home_behinds,
                away_goals, away_behinds, venue, status
            FROM matches
            "#,
        )
        .context("prepare load matches query")?;

    let rows = stmt
        .query_map([], decode_record)
        .context("query load matches")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode match row")?);
    }
    sort_records(&mut out);
    Ok(out)
}

/// Writes records in one transaction. A stored row is only replaced by one
/// at least as complete, so a late scheduled row never hides a final score.
pub fn upsert_records(conn: &mut Connection, records: &[MatchRecord]) -> Result<usize> {
    let tx = conn.transaction().context("begin upsert transaction")?;
    let updated_at = Utc::now().to_rfc3339();
    let mut written = 0usize;
    for record in records {
        written += upsert_record(&tx, record, &updated_at)?;
    }
    tx.commit().context("commit upsert transaction")?;
    debug!(received = records.len(), written, "stored match records");
    Ok(written)
}

fn upsert_record(tx: &rusqlite::Transaction<'_>, m: &MatchRecord, updated_at: &str) -> Result<usize> {
    let changed = tx
        .execute(
            r#"
            INSERT INTO matches (
                match_id, match_date, season, round, round_label, round_type,
                home_team, away_team, home_goals, home_behinds,
                away_goals, away_behinds, venue, status, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15
            )
            ON CONFLICT(match_id) DO UPDATE SET
                match_date = excluded.match_date,
                season = excluded.season,
                round = excluded.round,
                round_label = excluded.round_label,
                round_type = excluded.round_type,
                home_team = excluded.home_team,
                away_team = excluded.away_team,
                home_goals = excluded.home_goals,
                home_behinds = excluded.home_behinds,
                away_goals = excluded.away_goals,
                away_behinds = excluded.away_behinds,
                venue = excluded.venue,
                status = excluded.status,
                updated_at = excluded.updated_at
            WHERE excluded.status >= matches.status
            "#,
            params![
                m.id,
                m.date.format(DATE_FORMAT).to_string(),
                m.season,
                m.round,
                m.round_label,
                m.round_type.as_str(),
                m.home_team,
                m.away_team,
                m.home_score.goals(),
                m.home_score.behinds(),
                m.away_score.goals(),
                m.away_score.behinds(),
                m.venue,
                status_rank(m.status),
                updated_at,
            ],
        )
        .context("upsert match")?;
    Ok(changed)
}

pub fn record_sync_run(conn: &Connection, outcome: &SyncOutcome) -> Result<i64> {
    let failures: Vec<String> = outcome
        .failures
        .iter()
        .map(|(id, err)| format!("{id}: {err}"))
        .collect();
    let failures_json = serde_json::to_string(&failures).context("serialize sync failures")?;
    conn.execute(
        "INSERT INTO sync_runs(finished_at, planned, fetched, failures_json)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            Utc::now().to_rfc3339(),
            outcome.planned.len() as i64,
            outcome.fetched.len() as i64,
            failures_json
        ],
    )
    .context("insert sync run")?;
    Ok(conn.last_insert_rowid())
}

pub fn last_sync_run(conn: &Connection) -> Result<Option<SyncRun>> {
    let mut stmt = conn
        .prepare(
            "SELECT run_id, finished_at, planned, fetched, failures_json
             FROM sync_runs ORDER BY run_id DESC LIMIT 1",
        )
        .context("prepare sync run query")?;
    let mut rows = stmt.query([]).context("query sync runs")?;
    let Some(row) = rows.next().context("read sync run")? else {
        return Ok(None);
    };
    let failures_json: String = row.get(4)?;
    Ok(Some(SyncRun {
        run_id: row.get(0)?,
        finished_at: row.get(1)?,
        planned: row.get::<_, i64>(2)? as usize,
        fetched: row.get::<_, i64>(3)? as usize,
        failures: serde_json::from_str(&failures_json).context("decode sync failures")?,
    }))
}

fn decode_record(row: &Row<'_>) -> rusqlite::Result<MatchRecord> {
    let date_raw: String = row.get(1)?;
    let date = NaiveDateTime::parse_from_str(&date_raw, DATE_FORMAT)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))?;
    let round_type_raw: String = row.get(5)?;
    let round_type = RoundType::parse(&round_type_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown round type {round_type_raw:?}").into(),
        )
    })?;
    let status_raw: i64 = row.get(13)?;
    let status = status_from_rank(status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            13,
            Type::Integer,
            format!("unknown status {status_raw}").into(),
        )
    })?;

    Ok(MatchRecord {
        id: row.get(0)?,
        date,
        season: row.get(2)?,
        round: row.get(3)?,
        round_label: row.get(4)?,
        round_type,
        home_team: row.get(6)?,
        away_team: row.get(7)?,
        home_score: tally(row.get(8)?, row.get(9)?),
        away_score: tally(row.get(10)?, row.get(11)?),
        venue: row.get(12)?,
        status,
    })
}

fn tally(goals: Option<u16>, behinds: Option<u16>) -> Tally {
    match (goals, behinds) {
        (Some(goals), Some(behinds)) => Tally::scored(goals, behinds),
        _ => Tally::Unscored,
    }
}

fn status_rank(status: MatchStatus) -> i64 {
    match status {
        MatchStatus::Scheduled => 0,
        MatchStatus::InProgress => 1,
        MatchStatus::Final => 2,
    }
}

fn status_from_rank(rank: i64) -> Option<MatchStatus> {
    match rank {
        0 => Some(MatchStatus::Scheduled),
        1 => Some(MatchStatus::InProgress),
        2 => Some(MatchStatus::Final),
        _ => None,
    }
}
