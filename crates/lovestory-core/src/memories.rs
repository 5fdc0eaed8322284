use chrono::{Datelike, NaiveDate, Utc};

use crate::media::MediaRecord;

/// Today's UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Records from earlier years whose effective date falls on today's day and month.
///
/// Anything from the current year (or later) is not a memory yet.
pub fn filter_on_this_day(records: &[MediaRecord], today: NaiveDate) -> Vec<&MediaRecord> {
    records
        .iter()
        .filter(|m| {
            let Some(date) = m.effective_date() else {
                return false;
            };
            date.day() == today.day() && date.month() == today.month() && date.year() < today.year()
        })
        .collect()
}

/// Group memories by year, newest year first, keeping input order inside a year.
pub fn group_memories_by_year<'a>(memories: &[&'a MediaRecord]) -> Vec<(i32, Vec<&'a MediaRecord>)> {
    let mut groups: Vec<(i32, Vec<&'a MediaRecord>)> = Vec::new();
    for &m in memories {
        let Some(date) = m.effective_date() else {
            continue;
        };
        let year = date.year();
        match groups.iter_mut().find(|(y, _)| *y == year) {
            Some((_, list)) => list.push(m),
            None => groups.push((year, vec![m])),
        }
    }
    groups.sort_by(|a, b| b.0.cmp(&a.0));
    groups
}

/// Whole days from `start` to `today`. A missing start counts as zero; a
/// start in the future gives a negative count.
pub fn compute_days_together(start: Option<NaiveDate>, today: NaiveDate) -> i64 {
    match start {
        Some(start) => (today - start).num_days(),
        None => 0,
    }
}
