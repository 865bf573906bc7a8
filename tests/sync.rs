mod common;

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{at, final_record, scheduled_record};
use footy_tables::sync::{
    ArchivePolicy, ArchiveState, FailurePolicy, build_fetch_pool, merge, plan_fetch, reconcile,
};
use footy_tables::{Error, MatchId, MatchRecord, MatchStatus};

fn ids(raw: &[MatchId]) -> BTreeSet<MatchId> {
    raw.iter().copied().collect()
}

fn record(id: MatchId) -> MatchRecord {
    final_record(id, at(2018, 3, 22, 19, 25), (10, 10), (5, 5))
}

#[test]
fn plan_scenario_trusted_and_untrusted() {
    let state = ArchiveState {
        source: ids(&[1, 2, 3]),
        local: ids(&[1]),
        archive: ids(&[2]),
    };
    assert_eq!(state.plan(ArchivePolicy::Trusted), ids(&[3]));
    assert_eq!(state.plan(ArchivePolicy::Untrusted), ids(&[2, 3]));
}

#[test]
fn plan_is_subset_of_source_minus_local() {
    let cases: [(&[MatchId], &[MatchId], &[MatchId]); 4] = [
        (&[1, 2, 3, 4], &[2], &[3, 9]),
        (&[], &[1], &[2]),
        (&[5, 6], &[], &[]),
        (&[7, 8], &[7, 8], &[7]),
    ];
    for (source, local, archive) in cases {
        let (source, local, archive) = (ids(source), ids(local), ids(archive));
        let missing: BTreeSet<MatchId> = source.difference(&local).copied().collect();
        for policy in [ArchivePolicy::Trusted, ArchivePolicy::Untrusted] {
            let plan = plan_fetch(&source, &local, &archive, policy);
            assert!(plan.is_subset(&missing));
            assert!(plan.is_disjoint(&local));
        }
    }
}

#[test]
fn merge_with_nothing_is_identity() {
    let table = merge(&[record(2), record(1), record(3)], &[]);
    assert_eq!(merge(&table, &[]), table);
}

#[test]
fn merge_twice_does_not_grow() {
    let existing = vec![record(1), scheduled_record(2, at(2018, 3, 23, 19, 50))];
    let incoming = vec![record(2), record(3)];
    let once = merge(&existing, &incoming);
    let twice = merge(&once, &incoming);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 3);
}

#[test]
fn merge_keeps_the_most_complete_row() {
    let date = at(2018, 3, 22, 19, 25);
    let done = final_record(1, date, (17, 19), (9, 5));
    let stale = scheduled_record(1, date);

    assert_eq!(merge(&[done.clone()], &[stale.clone()]), vec![done.clone()]);
    assert_eq!(merge(&[stale], &[done.clone()]), vec![done]);
}

#[test]
fn merge_prefers_new_rows_on_equal_status() {
    let date = at(2018, 3, 22, 19, 25);
    let old = final_record(1, date, (1, 1), (0, 0));
    let corrected = final_record(1, date, (17, 19), (9, 5));
    assert_eq!(merge(&[old], &[corrected.clone()]), vec![corrected]);
}

#[test]
fn merge_orders_by_date_then_id() {
    let late = final_record(1, at(2018, 3, 29, 19, 25), (1, 1), (0, 0));
    let early_b = final_record(5, at(2018, 3, 22, 19, 25), (1, 1), (0, 0));
    let early_a = final_record(4, at(2018, 3, 22, 19, 25), (1, 1), (0, 0));
    let merged = merge(&[late], &[early_b, early_a]);
    let order: Vec<MatchId> = merged.iter().map(|r| r.id).collect();
    assert_eq!(order, vec![4, 5, 1]);
}

#[test]
fn empty_plan_short_circuits() {
    let calls = AtomicUsize::new(0);
    let local = vec![record(1), record(2)];
    let outcome = reconcile(
        &local,
        None,
        &ids(&[1, 2]),
        ArchivePolicy::Trusted,
        FailurePolicy::AbortAll,
        None,
        |id| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(record(id))
        },
    )
    .unwrap();
    assert!(outcome.is_noop());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.records, merge(&local, &[]));
}

#[test]
fn trusted_archive_is_not_refetched() {
    let fetched = std::sync::Mutex::new(Vec::new());
    let archive = vec![record(2)];
    let outcome = reconcile(
        &[record(1)],
        Some(&archive),
        &ids(&[1, 2, 3]),
        ArchivePolicy::Trusted,
        FailurePolicy::AbortAll,
        None,
        |id| {
            fetched.lock().unwrap().push(id);
            Ok(record(id))
        },
    )
    .unwrap();
    assert_eq!(*fetched.lock().unwrap(), vec![3]);
    assert_eq!(outcome.planned, ids(&[3]));
    let out_ids: Vec<MatchId> = outcome.records.iter().map(|r| r.id).collect();
    assert_eq!(out_ids, vec![1, 2, 3]);
}

#[test]
fn untrusted_archive_is_refetched() {
    let archive = vec![scheduled_record(2, at(2018, 3, 22, 19, 25))];
    let outcome = reconcile(
        &[record(1)],
        Some(&archive),
        &ids(&[1, 2, 3]),
        ArchivePolicy::Untrusted,
        FailurePolicy::AbortAll,
        None,
        |id| Ok(record(id)),
    )
    .unwrap();
    assert_eq!(outcome.planned, ids(&[2, 3]));
    let two = outcome.records.iter().find(|r| r.id == 2).unwrap();
    assert_eq!(two.status, MatchStatus::Final);
}

#[test]
fn missing_archive_fetches_everything_missing_locally() {
    let outcome = reconcile(
        &[],
        None,
        &ids(&[1, 2, 3]),
        ArchivePolicy::Trusted,
        FailurePolicy::AbortAll,
        None,
        |id| Ok(record(id)),
    )
    .unwrap();
    assert_eq!(outcome.planned, ids(&[1, 2, 3]));
    assert_eq!(outcome.records.len(), 3);
}

#[test]
fn abort_all_stops_on_first_failure() {
    let result = reconcile(
        &[],
        None,
        &ids(&[1, 2, 3]),
        ArchivePolicy::Trusted,
        FailurePolicy::AbortAll,
        None,
        |id| {
            if id == 2 {
                Err(Error::fetch(format!("mem://match/{id}"), "http 500"))
            } else {
                Ok(record(id))
            }
        },
    );
    assert!(matches!(result, Err(Error::Fetch { .. })));
}

#[test]
fn best_effort_keeps_what_arrived() {
    let outcome = reconcile(
        &[record(1)],
        None,
        &ids(&[1, 2, 3, 4]),
        ArchivePolicy::Trusted,
        FailurePolicy::BestEffort,
        None,
        |id| {
            if id == 3 {
                Err(Error::fetch(format!("mem://match/{id}"), "http 500"))
            } else {
                Ok(record(id))
            }
        },
    )
    .unwrap();
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, 3);
    let out_ids: Vec<MatchId> = outcome.records.iter().map(|r| r.id).collect();
    assert_eq!(out_ids, vec![1, 2, 4]);
}

#[test]
fn pooled_fetch_matches_sequential() {
    let source: BTreeSet<MatchId> = (1..=40).collect();
    let run = |pool: Option<&rayon::ThreadPool>| {
        reconcile(
            &[],
            None,
            &source,
            ArchivePolicy::Trusted,
            FailurePolicy::AbortAll,
            pool,
            |id| Ok(record(id)),
        )
        .unwrap()
    };
    let pool = build_fetch_pool(4).unwrap();
    let pooled = run(Some(&pool));
    let sequential = run(None);
    assert_eq!(pooled.records, sequential.records);
    assert_eq!(pooled.fetched, sequential.fetched);
}
