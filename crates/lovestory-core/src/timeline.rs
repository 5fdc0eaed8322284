use std::collections::BTreeMap;
use std::fmt;

use chrono::Datelike;
use serde::Serialize;

use crate::media::MediaRecord;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Bucket key. Ordering is chronological: year first, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1 = January
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month as usize).saturating_sub(1) % 12]
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Records grouped by the year and month of their effective date.
///
/// Borrowed from the input list and rebuilt on every call; iteration runs
/// from the most recent month to the oldest, and each bucket keeps input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline<'a> {
    buckets: BTreeMap<YearMonth, Vec<&'a MediaRecord>>,
}

/// One year of the album view: months in calendar order.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSection<'a> {
    pub year: i32,
    pub months: Vec<(YearMonth, Vec<&'a MediaRecord>)>,
}

impl<'a> Timeline<'a> {
    /// Buckets, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = (YearMonth, &[&'a MediaRecord])> + '_ {
        self.buckets.iter().rev().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Keys, most recent first.
    pub fn keys(&self) -> Vec<YearMonth> {
        self.buckets.keys().rev().copied().collect()
    }

    pub fn get(&self, key: YearMonth) -> Option<&[&'a MediaRecord]> {
        self.buckets.get(&key).map(Vec::as_slice)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of records across all buckets.
    pub fn total_records(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Year sections, newest year first, each with its months January to December.
    pub fn by_year(&self) -> Vec<YearSection<'a>> {
        let mut sections: Vec<YearSection<'a>> = Vec::new();
        for (key, records) in &self.buckets {
            match sections.last_mut() {
                Some(section) if section.year == key.year => {
                    section.months.push((*key, records.clone()));
                }
                _ => sections.push(YearSection {
                    year: key.year,
                    months: vec![(*key, records.clone())],
                }),
            }
        }
        sections.reverse();
        sections
    }
}

/// Group records by the (year, month) of their effective date.
///
/// Records without a usable date are skipped.
pub fn group_by_year_month(records: &[MediaRecord]) -> Timeline<'_> {
    let mut buckets: BTreeMap<YearMonth, Vec<&MediaRecord>> = BTreeMap::new();

    for record in records {
        let Some(date) = record.effective_date() else {
            continue;
        };
        buckets.entry(YearMonth::of(&date)).or_default().push(record);
    }

    Timeline { buckets }
}
