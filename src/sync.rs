use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::record::{MatchId, MatchRecord, sort_records};

/// Whether ids the remote archive already holds count as known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivePolicy {
    Trusted,
    Untrusted,
}

/// What to do when one planned fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    AbortAll,
    BestEffort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveState {
    pub local: BTreeSet<MatchId>,
    pub archive: BTreeSet<MatchId>,
    pub source: BTreeSet<MatchId>,
}

impl ArchiveState {
    pub fn plan(&self, policy: ArchivePolicy) -> BTreeSet<MatchId> {
        plan_fetch(&self.source, &self.local, &self.archive, policy)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub records: Vec<MatchRecord>,
    pub planned: BTreeSet<MatchId>,
    pub fetched: Vec<MatchRecord>,
    pub failures: Vec<(MatchId, String)>,
}

impl SyncOutcome {
    pub fn is_noop(&self) -> bool {
        self.planned.is_empty()
    }
}

pub fn plan_fetch(
    source: &BTreeSet<MatchId>,
    local: &BTreeSet<MatchId>,
    archive: &BTreeSet<MatchId>,
    policy: ArchivePolicy,
) -> BTreeSet<MatchId> {
    source
        .iter()
        .filter(|id| !local.contains(*id))
        .filter(|id| policy == ArchivePolicy::Untrusted || !archive.contains(*id))
        .copied()
        .collect()
}

/// Merges two tables into one without duplicate ids.
///
/// For an id present more than once, the most complete record wins; on equal
/// status the record from `new` replaces the existing one. Output is ordered
/// by date, then id, then status descending.
pub fn merge(existing: &[MatchRecord], new: &[MatchRecord]) -> Vec<MatchRecord> {
    let mut by_id: HashMap<MatchId, MatchRecord> = HashMap::with_capacity(existing.len());
    for record in existing.iter().chain(new) {
        match by_id.get(&record.id) {
            Some(current) if current.status > record.status => {}
            _ => {
                by_id.insert(record.id, record.clone());
            }
        }
    }
    let mut out: Vec<MatchRecord> = by_id.into_values().collect();
    sort_records(&mut out);
    out
}

/// Brings `local` up to date with the source.
///
/// `archive` is the remote baseline if one could be loaded. Its records are
/// folded into the result either way; with [`ArchivePolicy::Trusted`] its ids
/// are also left out of the fetch plan. `fetch_one` is called once per planned
/// id, in parallel on `pool` when one is given.
pub fn reconcile<F>(
    local: &[MatchRecord],
    archive: Option<&[MatchRecord]>,
    source_ids: &BTreeSet<MatchId>,
    archive_policy: ArchivePolicy,
    failure_policy: FailurePolicy,
    pool: Option<&rayon::ThreadPool>,
    fetch_one: F,
) -> Result<SyncOutcome>
where
    F: Fn(MatchId) -> Result<MatchRecord> + Sync,
{
    let state = ArchiveState {
        local: local.iter().map(|r| r.id).collect(),
        archive: archive
            .map(|rows| rows.iter().map(|r| r.id).collect())
            .unwrap_or_default(),
        source: source_ids.clone(),
    };
    let planned = state.plan(archive_policy);
    let base = merge(local, archive.unwrap_or_default());

    info!(
        source = state.source.len(),
        local = state.local.len(),
        archive = state.archive.len(),
        planned = planned.len(),
        "reconciliation plan"
    );

    if planned.is_empty() {
        return Ok(SyncOutcome {
            records: base,
            planned,
            fetched: Vec::new(),
            failures: Vec::new(),
        });
    }

    let ids: Vec<MatchId> = planned.iter().copied().collect();
    let results: Vec<(MatchId, Result<MatchRecord>)> = with_pool(pool, || {
        ids.par_iter()
            .map(|id| (*id, fetch_one(*id)))
            .collect()
    });

    let mut fetched = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (id, result) in results {
        match result {
            Ok(record) => {
                debug!(id, "fetched match");
                fetched.push(record);
            }
            Err(err) => {
                if failure_policy == FailurePolicy::AbortAll {
                    return Err(err);
                }
                warn!(id, error = %err, "match fetch failed, continuing");
                failures.push((id, err.to_string()));
            }
        }
    }
    sort_records(&mut fetched);

    let records = merge(&base, &fetched);
    Ok(SyncOutcome {
        records,
        planned,
        fetched,
        failures,
    })
}

fn with_pool<T>(pool: Option<&rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match pool {
        Some(pool) => pool.install(action),
        None => action(),
    }
}

pub fn build_fetch_pool(
    threads: usize,
) -> std::result::Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(1, 32))
        .build()
}
