use tracing::info;

use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::listing::parse_row_table;
use crate::normalize::{FixtureSlot, RawRow, RowKind, check_shape, normalize, parse_kickoff};
use crate::record::{MatchRecord, sort_records};
use crate::rounds::infer_rounds;
use crate::teams::{TeamAliasTable, default_table};

/// Fetches and normalizes the fixture for one season.
pub fn get_fixture(
    fetcher: &impl PageFetcher,
    locator: &str,
    season: i32,
) -> Result<Vec<MatchRecord>> {
    let body = fetcher.fetch(locator)?;
    let rows = parse_row_table(&body)
        .map_err(|err| Error::fetch(locator, format!("invalid fixture table: {err}")))?;
    let fixture = build_fixture(&rows, season, default_table())?;
    info!(season, matches = fixture.len(), "fixture loaded");
    Ok(fixture)
}

/// Turns raw three-field fixture rows into records: kickoff order decides the
/// per-season ordinal, rounds come from kickoff dates and team names are
/// canonicalized.
pub fn build_fixture(
    rows: &[Vec<String>],
    season: i32,
    teams: &TeamAliasTable,
) -> Result<Vec<MatchRecord>> {
    let mut timed = Vec::with_capacity(rows.len());
    for fields in rows {
        check_shape(RowKind::Fixture, fields)?;
        let kickoff = parse_kickoff(&fields[0], Some(season)).ok_or_else(|| {
            Error::InvalidField {
                kind: RowKind::Fixture,
                field: "date",
                value: fields[0].clone(),
            }
        })?;
        timed.push((kickoff, fields));
    }
    timed.sort_by_key(|(kickoff, _)| *kickoff);

    let kickoffs: Vec<_> = timed.iter().map(|(kickoff, _)| *kickoff).collect();
    let rounds = infer_rounds(&kickoffs)?;

    let mut out = Vec::with_capacity(timed.len());
    for (idx, ((_, fields), round)) in timed.into_iter().zip(rounds).enumerate() {
        let slot = FixtureSlot {
            season,
            ordinal: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            round,
        };
        let record = normalize(&RawRow::fixture(fields.clone(), slot))?;
        out.push(teams.canonicalize_record(record));
    }
    sort_records(&mut out);
    Ok(out)
}
