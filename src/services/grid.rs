//! Bucket grid: every (period × target) cell, zeroed before aggregation

use chrono::{Duration, Months, NaiveDate};
use std::collections::{BTreeSet, HashMap};

use super::term::{self, date_order, sprint_order};
use crate::types::{Bucket, BucketOrder, DateRange, Granularity};

/// `term-target` label of a bucket, used as the ordering tie-break
pub fn composite_key(term: &str, target: &str) -> String {
    format!("{}-{}", term, target)
}

/// A period of the grid: its term key and sort order
#[derive(Debug, Clone, PartialEq)]
pub struct Period {
    pub term: String,
    pub order: BucketOrder,
    /// First day of the period (date-based granularities only)
    pub start: Option<NaiveDate>,
}

/// Periods covering `range`, oldest first.
///
/// Walks back from `range.to` one step at a time while the cursor is not
/// before the start of the period containing `range.from`, so the first
/// period is included even when `from` falls mid-week or mid-month.
/// `from > to` yields no periods.
pub fn date_periods(range: &DateRange, granularity: &Granularity) -> Vec<Period> {
    if range.from > range.to || !granularity.is_date_based() {
        return Vec::new();
    }

    let floor = term::period_start(range.from, granularity);
    let mut periods = Vec::new();
    let mut cursor = Some(range.to);

    while let Some(date) = cursor.filter(|d| *d >= floor) {
        if let Some(key) = term::term_key(date, granularity) {
            periods.push(Period {
                order: date_order(&key),
                start: Some(term::period_start(date, granularity)),
                term: key,
            });
        }
        cursor = step_back(date, granularity);
    }

    periods.reverse();
    periods
}

fn step_back(date: NaiveDate, granularity: &Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Daily => date.checked_sub_signed(Duration::days(1)),
        Granularity::Weekly => date.checked_sub_signed(Duration::days(7)),
        Granularity::Monthly => date.checked_sub_months(Months::new(1)),
        Granularity::Sprint | Granularity::Custom(_) => None,
    }
}

/// Every sprint from the lowest to the highest observed number, gaps
/// included. No observed sprints → no periods.
pub fn sprint_periods(numbers: impl IntoIterator<Item = u32>) -> Vec<Period> {
    let numbers: Vec<u32> = numbers.into_iter().collect();
    let (Some(min), Some(max)) = (numbers.iter().min(), numbers.iter().max()) else {
        return Vec::new();
    };
    (*min..=*max)
        .map(|n| Period {
            term: term::sprint_key(n),
            order: sprint_order(n),
            start: None,
        })
        .collect()
}

/// One period per distinct observed value
pub fn custom_periods<I, S>(values: I) -> Vec<Period>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let distinct: BTreeSet<String> = values.into_iter().map(Into::into).collect();
    distinct
        .into_iter()
        .map(|value| Period {
            order: term::custom_order(&value),
            term: value,
            start: None,
        })
        .collect()
}

/// Buckets addressed by (term, target)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketGrid {
    /// term → target → bucket
    buckets: HashMap<String, HashMap<String, Bucket>>,
}

impl BucketGrid {
    /// Cartesian product of `periods` × `targets`, all zeroed
    pub fn new(periods: &[Period], targets: &[String]) -> Self {
        let mut buckets = HashMap::with_capacity(periods.len());
        if targets.is_empty() {
            return Self { buckets };
        }
        for period in periods {
            let row: &mut HashMap<String, Bucket> = buckets
                .entry(period.term.clone())
                .or_insert_with(|| HashMap::with_capacity(targets.len()));
            for target in targets {
                row.insert(
                    target.clone(),
                    Bucket::zeroed(&period.term, target, period.order.clone()),
                );
            }
        }
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, term: &str, target: &str) -> Option<&Bucket> {
        self.buckets.get(term)?.get(target)
    }

    pub fn get_mut(&mut self, term: &str, target: &str) -> Option<&mut Bucket> {
        self.buckets.get_mut(term)?.get_mut(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.values().flat_map(HashMap::values)
    }

    /// Flatten to a sequence ascending by `order`, ties broken by the
    /// lexical order of the composite key, then by term and target.
    pub fn into_ordered(self) -> Vec<Bucket> {
        let mut keyed: Vec<(String, Bucket)> = self
            .buckets
            .into_values()
            .flat_map(HashMap::into_values)
            .map(|b| (composite_key(&b.term, &b.target), b))
            .collect();
        keyed.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.term.cmp(&b.1.term))
                .then_with(|| a.1.target.cmp(&b.1.target))
        });
        // stable: equal orders keep the key order from the first pass
        keyed.sort_by(|a, b| a.1.order.cmp(&b.1.order));
        keyed.into_iter().map(|(_, bucket)| bucket).collect()
    }
}
