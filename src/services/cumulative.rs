//! Cumulative flow aggregation
//!
//! Instead of counting what happened inside a period, each period gets a
//! snapshot of every issue's state at the period's opening boundary.

use chrono::NaiveDate;

use super::aggregator::AggregationStats;
use super::grid::{self, BucketGrid};
use crate::types::{Issue, ReportRequest};

/// Resolved on or before the boundary
pub const DONE: &str = "DONE";
/// Created on or before the boundary, not resolved by it
pub const IN_PROGRESS: &str = "TODO / DOING";

/// Aggregator for cumulative flow reports
pub struct CumulativeAggregator;

impl CumulativeAggregator {
    /// The fixed target pair of a cumulative flow grid
    pub fn targets() -> Vec<String> {
        vec![DONE.to_string(), IN_PROGRESS.to_string()]
    }

    /// State of `issue` as of `boundary`, `None` when not yet created
    pub fn status_at(issue: &Issue, boundary: NaiveDate) -> Option<&'static str> {
        let created = issue.created()?;
        if created > boundary {
            return None;
        }
        match issue.resolved() {
            Some(resolved) if resolved <= boundary => Some(DONE),
            _ => Some(IN_PROGRESS),
        }
    }

    /// Build the grid for `request` and fill one snapshot per period.
    ///
    /// Periods are taken in ascending order; the snapshot for the span
    /// between a period's start and the next period's start is taken at
    /// the earlier of the two. Only `count` is used.
    pub fn run(request: &ReportRequest, issues: &[Issue]) -> (BucketGrid, AggregationStats) {
        let periods = grid::date_periods(&request.range, &request.granularity);
        let mut grid = BucketGrid::new(&periods, &Self::targets());
        let mut contributed = vec![false; issues.len()];

        for period in &periods {
            let Some(boundary) = period.start else {
                continue;
            };
            for (idx, issue) in issues.iter().enumerate() {
                let Some(status) = Self::status_at(issue, boundary) else {
                    continue;
                };
                if let Some(bucket) = grid.get_mut(&period.term, status) {
                    bucket.count = bucket.count.saturating_add(1);
                    contributed[idx] = true;
                }
            }
        }

        let matched = contributed.iter().filter(|c| **c).count();
        let stats = AggregationStats {
            matched,
            skipped: issues.len() - matched,
        };
        (grid, stats)
    }
}
