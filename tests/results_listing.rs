mod common;

use common::{MapFetcher, at, final_record, read_fixture};
use footy_tables::listing::parse_results_listing;
use footy_tables::results::{build_results, fetch_match, get_match_results};
use footy_tables::{Error, MatchStatus, RoundType};

#[test]
fn listing_rows_have_sixteen_fields() {
    let rows = parse_results_listing(&read_fixture("bg3_sample.txt")).unwrap();
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|r| r.fields().len() == 16));

    let first = rows[0].fields();
    assert_eq!(first[0], "1");
    assert_eq!(first[3], "Fitzroy");
    assert_eq!(&first[4..7], ["6", "13", "49"]);
    assert_eq!(first[11], "Brunswick St");
    assert_eq!(first[12], "33");
    assert_eq!(first[13], "1897");
}

#[test]
fn results_are_final_and_canonical() {
    let records = build_results(&read_fixture("bg3_sample.txt")).unwrap();
    assert_eq!(records.len(), 10);
    assert!(records.iter().all(|r| r.status == MatchStatus::Final));
    assert!(records.windows(2).all(|w| w[0].sort_key() <= w[1].sort_key()));

    let lake_oval = records.iter().find(|r| r.id == 4).unwrap();
    assert_eq!(lake_oval.home_team, "Sydney");
    assert_eq!(lake_oval.margin(), Some(-17));
}

#[test]
fn finals_number_on_from_regular_season() {
    let records = build_results(&read_fixture("bg3_sample.txt")).unwrap();
    let round_of = |id: u32| {
        let r = records.iter().find(|r| r.id == id).unwrap();
        (r.round_label.clone(), r.round_type, r.round)
    };

    assert_eq!(round_of(15398), ("R1".to_string(), RoundType::Regular, 1));
    // Qualifying and elimination finals share a weekend.
    assert_eq!(round_of(15600), ("QF".to_string(), RoundType::Finals, 2));
    assert_eq!(round_of(15601), ("EF".to_string(), RoundType::Finals, 2));
    assert_eq!(round_of(15604).2, 3);
    assert_eq!(round_of(15606).2, 4);
    assert_eq!(round_of(15607), ("GF".to_string(), RoundType::Finals, 5));
}

#[test]
fn season_filter() {
    let fetcher = MapFetcher::new().with_page("mem://bg3", read_fixture("bg3_sample.txt"));
    let records = get_match_results(&fetcher, "mem://bg3", Some(2018..=2018)).unwrap();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| r.season == 2018));
}

#[test]
fn broken_match_line_is_not_skipped() {
    let listing = "     1.  8-May-1897 R1   Fitzroy  6.13.49  Carlton\n";
    let err = build_results(listing).unwrap_err();
    assert!(err.is_malformed_row());
}

#[test]
fn headers_only_listing_is_empty() {
    let records = build_results("Game Date Rnd Home Away\n\n").unwrap();
    assert!(records.is_empty());
}

#[test]
fn unreachable_listing_is_a_fetch_error() {
    let fetcher = MapFetcher::new();
    let err = get_match_results(&fetcher, "mem://bg3", None).unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}

#[test]
fn oversized_score_in_listing_is_rejected() {
    let listing = "  1. 8-May-1897 R1 Fitzroy 11000.0.0 Carlton 2.4.16 Brunswick St\n";
    let err = build_results(listing).unwrap_err();
    assert!(err.is_malformed_row());
    assert!(matches!(
        err,
        Error::InvalidField {
            field: "Home.Goals",
            ..
        }
    ));
}

#[test]
fn match_page_ignores_other_broken_rows() {
    let wanted = final_record(3, at(2018, 3, 22, 19, 25), (17, 19), (9, 5));
    let mut broken = final_record(4, at(2018, 3, 23, 19, 50), (1, 1), (0, 0))
        .canonical_row()
        .into_fields();
    broken[6] = "999".to_string();
    let page = serde_json::to_string(&vec![
        broken,
        vec!["5".to_string(), "short".to_string()],
        wanted.canonical_row().into_fields(),
    ])
    .unwrap();
    let fetcher = MapFetcher::new().with_page("mem://match/3", page);

    assert_eq!(fetch_match(&fetcher, "mem://match/3", 3).unwrap(), wanted);
    assert!(fetch_match(&fetcher, "mem://match/3", 4).unwrap_err().is_malformed_row());
    assert!(matches!(
        fetch_match(&fetcher, "mem://match/3", 6),
        Err(Error::Fetch { .. })
    ));
}
