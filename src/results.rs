use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use tracing::info;

use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::listing::{parse_id_listing, parse_results_listing, parse_row_table};
use crate::normalize::{RawRow, normalize};
use crate::record::{MatchId, MatchRecord, sort_records};
use crate::teams::default_table;

/// Fetches the full results list, optionally keeping only some seasons.
pub fn get_match_results(
    fetcher: &impl PageFetcher,
    locator: &str,
    seasons: Option<RangeInclusive<i32>>,
) -> Result<Vec<MatchRecord>> {
    let body = fetcher.fetch(locator)?;
    let mut records = build_results(&body)?;
    if let Some(range) = seasons {
        records.retain(|r| range.contains(&r.season));
    }
    info!(matches = records.len(), "results loaded");
    Ok(records)
}

pub fn build_results(listing: &str) -> Result<Vec<MatchRecord>> {
    let rows = parse_results_listing(listing)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(default_table().canonicalize_record(normalize(row)?));
    }
    sort_records(&mut out);
    Ok(out)
}

pub fn fetch_source_ids(fetcher: &impl PageFetcher, locator: &str) -> Result<BTreeSet<MatchId>> {
    let body = fetcher.fetch(locator)?;
    parse_id_listing(&body)
}

/// Fetches one match page and returns the row for `id`.
pub fn fetch_match(fetcher: &impl PageFetcher, locator: &str, id: MatchId) -> Result<MatchRecord> {
    let body = fetcher.fetch(locator)?;
    let rows = parse_row_table(&body)
        .map_err(|err| Error::fetch(locator, format!("invalid match table: {err}")))?;
    // Other matches on the page are not validated.
    let fields = rows
        .into_iter()
        .find(|fields| game_id(fields) == Some(id))
        .ok_or_else(|| Error::fetch(locator, format!("match {id} not on page")))?;
    let record = normalize(&RawRow::result(fields))?;
    Ok(default_table().canonicalize_record(record))
}

fn game_id(fields: &[String]) -> Option<MatchId> {
    fields.first()?.trim().trim_end_matches('.').parse().ok()
}
