use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDateTime, Weekday};

use crate::error::{Error, Result};

/// Assigns a round number to each kickoff.
///
/// Weeks start on Sunday. A match played Sunday through Wednesday belongs to
/// the round that started in the previous week, so a Thursday-to-Monday round
/// stays together. Week indices are densely ranked, so the earliest round is
/// 1 and rounds are contiguous.
pub fn infer_rounds(kickoffs: &[NaiveDateTime]) -> Result<Vec<u32>> {
    if kickoffs.is_empty() {
        return Err(Error::InsufficientData);
    }

    let weeks: Vec<i32> = kickoffs.iter().map(|k| round_week(*k)).collect();
    let distinct: Vec<i32> = weeks
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut out = Vec::with_capacity(weeks.len());
    for week in weeks {
        // `distinct` holds every week, so the search always succeeds.
        let rank = distinct.binary_search(&week).unwrap_or_default();
        out.push(rank as u32 + 1);
    }
    Ok(out)
}

fn round_week(kickoff: NaiveDateTime) -> i32 {
    let week = sunday_week_index(kickoff);
    if spills_into_previous_round(kickoff.weekday()) {
        week - 1
    } else {
        week
    }
}

// Day 1 of the common era is a Monday, so day 0 is a Sunday and every
// multiple of seven starts a new Sunday week. Absolute, so it keeps counting
// across new year.
fn sunday_week_index(kickoff: NaiveDateTime) -> i32 {
    kickoff.date().num_days_from_ce().div_euclid(7)
}

fn spills_into_previous_round(day: Weekday) -> bool {
    matches!(
        day,
        Weekday::Sun | Weekday::Mon | Weekday::Tue | Weekday::Wed
    )
}
