//! Aggregator service: folds issues into the bucket grid

use std::collections::BTreeSet;

use super::grid::{self, BucketGrid, Period};
use super::term;
use crate::types::{EnrichedIssue, Granularity, ReportRequest, TargetType, NO_EPIC, UNASSIGNED};

/// Outcome of one aggregation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationStats {
    /// Issues that landed in a bucket
    pub matched: usize,
    /// Issues with no term, no target or no bucket for their key
    pub skipped: usize,
}

/// Aggregator for count/sum reports
pub struct Aggregator;

impl Aggregator {
    /// Build the grid for `request` and fold `issues` into it
    pub fn run(
        request: &ReportRequest,
        issues: &[EnrichedIssue],
    ) -> (BucketGrid, AggregationStats) {
        let periods = Self::periods(request, issues);
        let targets = Self::targets(issues, &request.target);
        let mut grid = BucketGrid::new(&periods, &targets);
        let stats = Self::aggregate(&mut grid, request, issues);
        (grid, stats)
    }

    /// Period enumeration for the request's granularity
    pub fn periods(request: &ReportRequest, issues: &[EnrichedIssue]) -> Vec<Period> {
        match &request.granularity {
            Granularity::Sprint => grid::sprint_periods(
                issues
                    .iter()
                    .filter_map(|e| e.sprint.as_ref().map(|s| s.number)),
            ),
            Granularity::Custom(field) => grid::custom_periods(
                issues
                    .iter()
                    .filter_map(|e| e.issue.display_value(field)),
            ),
            date_based => grid::date_periods(&request.range, date_based),
        }
    }

    /// Distinct targets observed across `issues`, sorted
    pub fn targets(issues: &[EnrichedIssue], target: &TargetType) -> Vec<String> {
        let distinct: BTreeSet<String> = issues
            .iter()
            .filter_map(|e| Self::target_of(e, target))
            .collect();
        distinct.into_iter().collect()
    }

    /// Category of an issue. A missing assignee is `Unassigned` and a
    /// missing epic is `No epic`; a missing issue type or custom value
    /// leaves the issue without a target.
    pub fn target_of(enriched: &EnrichedIssue, target: &TargetType) -> Option<String> {
        let issue = enriched.issue;
        match target {
            TargetType::IssueType => issue.issue_type_name().map(String::from),
            TargetType::Assignee => Some(issue.assignee_name().unwrap_or(UNASSIGNED).to_string()),
            TargetType::Epic => Some(
                enriched
                    .epic
                    .clone()
                    .unwrap_or_else(|| NO_EPIC.to_string()),
            ),
            TargetType::Custom(field) => issue.display_value(field),
        }
    }

    /// Term of an issue for the request's granularity
    pub fn term_of(enriched: &EnrichedIssue, request: &ReportRequest) -> Option<String> {
        match &request.granularity {
            Granularity::Sprint => enriched.sprint.as_ref().map(|s| term::sprint_key(s.number)),
            Granularity::Custom(field) => enriched.issue.display_value(field),
            date_based => enriched
                .issue
                .date(&request.date_field)
                .and_then(|d| term::term_key(d, date_based)),
        }
    }

    /// Fold each issue into at most one bucket.
    ///
    /// Count is incremented whenever the bucket exists, even when the
    /// numeric field is missing; the sum only takes finite values.
    pub fn aggregate(
        grid: &mut BucketGrid,
        request: &ReportRequest,
        issues: &[EnrichedIssue],
    ) -> AggregationStats {
        let mut stats = AggregationStats::default();

        for enriched in issues {
            let value = request
                .number_field
                .as_deref()
                .and_then(|field| enriched.issue.number(field))
                .filter(|v| v.is_finite());

            let term = Self::term_of(enriched, request);
            let target = Self::target_of(enriched, &request.target);
            let bucket = match (&term, &target) {
                (Some(term), Some(target)) => grid.get_mut(term, target),
                _ => None,
            };

            match bucket {
                Some(bucket) => {
                    bucket.count = bucket.count.saturating_add(1);
                    if let Some(v) = value {
                        bucket.sum += v;
                    }
                    stats.matched += 1;
                }
                None => {
                    tracing::trace!(
                        issue = %enriched.issue.key,
                        term = ?term,
                        target = ?target,
                        "issue outside bucket grid"
                    );
                    stats.skipped += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sprint::enrich;
    use crate::types::{DateRange, Issue, SiteFields};
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    const POINTS: &str = "customfield_10016";
    const SPRINT: &str = "customfield_10020";
    const EPIC_LINK: &str = "customfield_10014";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_issue(key: &str, fields: Value) -> Issue {
        Issue {
            id: key.into(),
            key: key.into(),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    fn site(sprint: Option<&str>, epic_link: Option<&str>) -> SiteFields {
        SiteFields {
            sprint: sprint.map(String::from),
            epic_link: epic_link.map(String::from),
        }
    }

    fn bug(key: &str, created: &str, points: Option<f64>) -> Issue {
        make_issue(
            key,
            json!({
                "created": format!("{}T12:00:00.000+0000", created),
                "issuetype": {"name": "Bug"},
                POINTS: points,
            }),
        )
    }

    fn request(granularity: Granularity, from: &str, to: &str) -> ReportRequest {
        ReportRequest {
            project: "PRJ".into(),
            issue_types: vec![],
            number_field: Some(POINTS.into()),
            date_field: "created".into(),
            granularity,
            target: TargetType::IssueType,
            range: DateRange {
                from: date(from),
                to: date(to),
            },
            cumulative: false,
        }
    }

    // ========== run() tests ==========

    #[test]
    fn test_monthly_count_and_sum() {
        let issues = vec![
            bug("PRJ-1", "2024-01-15", Some(3.0)),
            bug("PRJ-2", "2024-01-20", Some(5.0)),
        ];
        let req = request(Granularity::Monthly, "2024-01-01", "2024-03-31");
        let (grid, stats) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));

        let jan = grid.get("2024-01", "Bug").unwrap();
        assert_eq!(jan.count, 2);
        assert!((jan.sum - 8.0).abs() < f64::EPSILON);
        assert_eq!(grid.get("2024-02", "Bug").unwrap().count, 0);
        assert_eq!(grid.len(), 3);
        assert_eq!(stats.matched, 2);
    }

    #[test]
    fn test_empty_issues_empty_grid() {
        let req = request(Granularity::Monthly, "2024-01-01", "2024-03-31");
        let (grid, stats) = Aggregator::run(&req, &[]);
        assert!(grid.is_empty());
        assert_eq!(stats, AggregationStats::default());
    }

    #[test]
    fn test_missing_numeric_value_still_counts() {
        let issues = vec![
            bug("PRJ-1", "2024-01-15", None),
            bug("PRJ-2", "2024-01-16", Some(2.5)),
        ];
        let req = request(Granularity::Monthly, "2024-01-01", "2024-01-31");
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        let b = grid.get("2024-01", "Bug").unwrap();
        assert_eq!(b.count, 2);
        assert!((b.sum - 2.5).abs() < f64::EPSILON);
        assert!(!b.sum.is_nan());
    }

    #[test]
    fn test_count_only_report() {
        let issues = vec![bug("PRJ-1", "2024-01-15", Some(3.0))];
        let mut req = request(Granularity::Monthly, "2024-01-01", "2024-01-31");
        req.number_field = None;
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        let b = grid.get("2024-01", "Bug").unwrap();
        assert_eq!(b.count, 1);
        assert_eq!(b.sum, 0.0);
    }

    #[test]
    fn test_out_of_range_issue_skipped() {
        let issues = vec![
            bug("PRJ-1", "2024-01-15", Some(1.0)),
            bug("PRJ-2", "2023-12-31", Some(1.0)),
        ];
        let req = request(Granularity::Daily, "2024-01-01", "2024-01-31");
        let (grid, stats) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        let total: u64 = grid.iter().map(|b| b.count).sum();
        assert_eq!(total, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_weekly_sunday_and_monday() {
        let issues = vec![
            bug("PRJ-1", "2024-03-03", Some(1.0)),
            bug("PRJ-2", "2024-03-04", Some(1.0)),
        ];
        let req = request(Granularity::Weekly, "2024-02-26", "2024-03-10");
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        assert_eq!(grid.get("2024-02-26", "Bug").unwrap().count, 1);
        assert_eq!(grid.get("2024-03-04", "Bug").unwrap().count, 1);
    }

    #[test]
    fn test_assignee_target_defaults_to_unassigned() {
        let issues = vec![
            make_issue(
                "PRJ-1",
                json!({"created": "2024-01-15", "issuetype": {"name": "Task"}, "assignee": null}),
            ),
            make_issue(
                "PRJ-2",
                json!({"created": "2024-01-15", "issuetype": {"name": "Task"},
                       "assignee": {"displayName": "Kim"}}),
            ),
        ];
        let mut req = request(Granularity::Monthly, "2024-01-01", "2024-01-31");
        req.target = TargetType::Assignee;
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        assert_eq!(grid.get("2024-01", UNASSIGNED).unwrap().count, 1);
        assert_eq!(grid.get("2024-01", "Kim").unwrap().count, 1);
    }

    #[test]
    fn test_sprint_grid_with_gap() {
        let issues = vec![
            make_issue(
                "PRJ-1",
                json!({"issuetype": {"name": "Story"}, POINTS: 2, SPRINT: [{"id": 1, "name": "Sprint 1"}]}),
            ),
            make_issue(
                "PRJ-2",
                json!({"issuetype": {"name": "Story"}, POINTS: 3,
                       SPRINT: [{"id": 1, "name": "Sprint 1"}, {"id": 3, "name": "Sprint 3"}]}),
            ),
        ];
        let req = request(Granularity::Sprint, "2024-01-01", "2024-01-31");
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &site(Some(SPRINT), None)));
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.get("Sprint 1", "Story").unwrap().count, 1);
        assert_eq!(grid.get("Sprint 2", "Story").unwrap().count, 0);
        let s3 = grid.get("Sprint 3", "Story").unwrap();
        assert_eq!(s3.count, 1);
        assert!((s3.sum - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_epic_target_from_parent_and_epic_link() {
        let issues = vec![
            make_issue(
                "PRJ-1",
                json!({"created": "2024-01-10", POINTS: 2,
                       "parent": {"key": "PRJ-100", "fields": {"issuetype": {"name": "Epic"}}}}),
            ),
            make_issue(
                "PRJ-2",
                json!({"created": "2024-01-11", POINTS: 3, EPIC_LINK: "PRJ-100"}),
            ),
            make_issue(
                "PRJ-3",
                json!({"created": "2024-01-12", POINTS: 4,
                       "parent": {"key": "PRJ-200", "fields": {"issuetype": {"name": "Epic"}}}}),
            ),
            make_issue(
                "PRJ-4",
                json!({"created": "2024-01-13", POINTS: 1,
                       "parent": {"key": "PRJ-3", "fields": {"issuetype": {"name": "Story"}}}}),
            ),
        ];
        let mut req = request(Granularity::Monthly, "2024-01-01", "2024-01-31");
        req.target = TargetType::Epic;
        let enriched = enrich(&issues, &site(None, Some(EPIC_LINK)));
        let (grid, stats) = Aggregator::run(&req, &enriched);

        assert_eq!(
            Aggregator::targets(&enriched, &req.target),
            vec![NO_EPIC, "PRJ-100", "PRJ-200"]
        );
        let first = grid.get("2024-01", "PRJ-100").unwrap();
        assert_eq!(first.count, 2);
        assert!((first.sum - 5.0).abs() < f64::EPSILON);
        assert_eq!(grid.get("2024-01", "PRJ-200").unwrap().count, 1);
        // a story parent is not an epic
        assert_eq!(grid.get("2024-01", NO_EPIC).unwrap().count, 1);
        assert_eq!(stats.matched, 4);
    }

    #[test]
    fn test_epic_target_without_link_field_uses_parent_only() {
        let issues = vec![make_issue(
            "PRJ-1",
            json!({"created": "2024-01-11", EPIC_LINK: "PRJ-100"}),
        )];
        let mut req = request(Granularity::Monthly, "2024-01-01", "2024-01-31");
        req.target = TargetType::Epic;
        let (grid, _) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        assert_eq!(grid.get("2024-01", NO_EPIC).unwrap().count, 1);
        assert!(grid.get("2024-01", "PRJ-100").is_none());
    }

    #[test]
    fn test_custom_field_grouping() {
        let issues = vec![
            make_issue(
                "PRJ-1",
                json!({"issuetype": {"name": "Bug"}, POINTS: 1, "priority": {"name": "High"}}),
            ),
            make_issue(
                "PRJ-2",
                json!({"issuetype": {"name": "Bug"}, POINTS: 4, "priority": {"name": "High"}}),
            ),
            make_issue("PRJ-3", json!({"issuetype": {"name": "Story"}, POINTS: 2})),
        ];
        let req = request(
            Granularity::Custom("priority".into()),
            "2024-01-01",
            "2024-01-31",
        );
        let (grid, stats) = Aggregator::run(&req, &enrich(&issues, &SiteFields::default()));
        // one value × two targets
        assert_eq!(grid.len(), 2);
        let high = grid.get("High", "Bug").unwrap();
        assert_eq!(high.count, 2);
        assert!((high.sum - 5.0).abs() < f64::EPSILON);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let issues = vec![
            bug("PRJ-1", "2024-01-15", Some(3.0)),
            bug("PRJ-2", "2024-02-20", Some(5.0)),
        ];
        let before = issues.clone();
        let req = request(Granularity::Weekly, "2024-01-01", "2024-03-31");
        let enriched = enrich(&issues, &SiteFields::default());
        let (first, _) = Aggregator::run(&req, &enriched);
        let (second, _) = Aggregator::run(&req, &enriched);
        assert_eq!(first, second);
        assert_eq!(issues, before);
    }

    #[test]
    fn test_targets_sorted_distinct() {
        let issues = vec![
            make_issue("PRJ-1", json!({"issuetype": {"name": "Story"}})),
            make_issue("PRJ-2", json!({"issuetype": {"name": "Bug"}})),
            make_issue("PRJ-3", json!({"issuetype": {"name": "Story"}})),
        ];
        let targets = Aggregator::targets(&enrich(&issues, &SiteFields::default()), &TargetType::IssueType);
        assert_eq!(targets, vec!["Bug", "Story"]);
    }
}
