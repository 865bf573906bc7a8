use crate::error::Result;
use crate::fetch::decode_archive;
use crate::record::MatchRecord;
use crate::teams::default_table;

const MATCH_RESULTS_1897: &str = include_str!("../data/match_results_1897.json");

/// Opening round of the 1897 season, shipped with the crate so the table
/// shape can be explored offline.
pub fn match_results() -> Result<Vec<MatchRecord>> {
    let rows = decode_archive(MATCH_RESULTS_1897, "bundled:match_results_1897")?;
    Ok(rows
        .into_iter()
        .map(|r| default_table().canonicalize_record(r))
        .collect())
}
