use anyhow::{Context, Result, anyhow};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Error;
use crate::fetch::{JsonArchive, PageFetcher, RemoteArchive};
use crate::results::{fetch_match, fetch_source_ids};
use crate::store;
use crate::sync::{ArchivePolicy, FailurePolicy, SyncOutcome, build_fetch_pool, reconcile};
use crate::teams::default_table;

/// Brings the local store up to date with the source and records the run.
///
/// An archive that cannot be loaded is skipped with a warning; every id
/// missing locally is then fetched.
pub fn update_results(
    conn: &mut Connection,
    fetcher: &impl PageFetcher,
    settings: &Settings,
    failure_policy: FailurePolicy,
) -> Result<SyncOutcome> {
    let index_url = settings
        .index_url
        .as_deref()
        .ok_or_else(|| anyhow!("FOOTY_INDEX_URL is not configured"))?;
    if settings.match_url.is_none() {
        return Err(anyhow!("FOOTY_MATCH_URL is not configured"));
    }

    let local = store::load_records(conn)?;
    let archive = match settings.archive_url.as_deref() {
        Some(location) => match JsonArchive::new(fetcher).load(location) {
            Ok(rows) => Some(
                rows.into_iter()
                    .map(|r| default_table().canonicalize_record(r))
                    .collect::<Vec<_>>(),
            ),
            Err(err) => {
                warn!(location, error = %err, "archive unavailable, fetching everything missing locally");
                None
            }
        },
        None => None,
    };
    let source_ids = fetch_source_ids(fetcher, index_url).context("load source index")?;

    let archive_policy = if settings.trust_archive {
        ArchivePolicy::Trusted
    } else {
        ArchivePolicy::Untrusted
    };
    let pool = match build_fetch_pool(settings.fetch_parallelism) {
        Ok(pool) => Some(pool),
        Err(err) => {
            warn!(error = %err, "fetch pool unavailable, fetching sequentially");
            None
        }
    };

    let outcome = reconcile(
        &local,
        archive.as_deref(),
        &source_ids,
        archive_policy,
        failure_policy,
        pool.as_ref(),
        |id| {
            let locator = settings
                .match_locator(id)
                .ok_or_else(|| Error::fetch(format!("match {id}"), "no match url template"))?;
            fetch_match(fetcher, &locator, id)
        },
    )
    .context("reconcile results")?;

    let written = store::upsert_records(conn, &outcome.records)?;
    store::record_sync_run(conn, &outcome)?;
    info!(
        planned = outcome.planned.len(),
        fetched = outcome.fetched.len(),
        failed = outcome.failures.len(),
        written,
        "update complete"
    );
    Ok(outcome)
}
