//! Report request and bucket types

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{IssueSumError, Result};

/// Sortable surrogate placing a term in chronological or logical sequence.
///
/// Needed because `"Sprint 10"` sorts before `"Sprint 9"` as a string.
/// Numbers compare numerically and sort before texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketOrder {
    Number(f64),
    Text(String),
}

impl BucketOrder {
    /// Numeric order when `raw` parses as a finite number, text otherwise
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl Ord for BucketOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for BucketOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for BucketOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BucketOrder {}

/// One (period, category) aggregation cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bucket {
    pub term: String,
    pub target: String,
    pub order: BucketOrder,
    pub count: u64,
    pub sum: f64,
}

impl Bucket {
    pub fn zeroed(term: &str, target: &str, order: BucketOrder) -> Self {
        Self {
            term: term.to_string(),
            target: target.to_string(),
            order,
            count: 0,
            sum: 0.0,
        }
    }
}

/// Periodization mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Sprint,
    /// Group by the distinct values of a field (field id)
    Custom(String),
}

impl Granularity {
    pub fn is_date_based(&self) -> bool {
        matches!(self, Self::Daily | Self::Weekly | Self::Monthly)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Day",
            Self::Weekly => "Week",
            Self::Monthly => "Month",
            Self::Sprint => "Sprint",
            Self::Custom(_) => "Value",
        }
    }
}

/// Category dimension the buckets are split by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    IssueType,
    Assignee,
    /// Split by parent epic key
    Epic,
    /// Split by the values of a field (field id)
    Custom(String),
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Relative or explicit date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermPreset {
    PastYear,
    PastMonth,
    Past3Months,
    Past6Months,
    Range { from: NaiveDate, to: NaiveDate },
}

impl TermPreset {
    /// Resolve against `today`. Month arithmetic clamps to month end
    /// (Mar 31 minus one month is Feb 29 in a leap year).
    pub fn resolve(self, today: NaiveDate) -> DateRange {
        let months_back = |n: u32| DateRange {
            from: today.checked_sub_months(Months::new(n)).unwrap_or(today),
            to: today,
        };
        match self {
            Self::PastYear => months_back(12),
            Self::PastMonth => months_back(1),
            Self::Past3Months => months_back(3),
            Self::Past6Months => months_back(6),
            Self::Range { from, to } => DateRange { from, to },
        }
    }
}

/// Everything needed to run one report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub project: String,
    /// Empty means all issue types
    pub issue_types: Vec<String>,
    /// Field summed per bucket; `None` gives a count-only report
    pub number_field: Option<String>,
    /// Date field the range filter and date-based terms apply to
    pub date_field: String,
    pub granularity: Granularity,
    pub target: TargetType,
    pub range: DateRange,
    /// Cumulative flow (DONE vs TODO / DOING snapshots)
    pub cumulative: bool,
}

impl ReportRequest {
    /// Reject requests the query builder must never see
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(IssueSumError::Config("project is required".into()));
        }
        if self.cumulative {
            if !self.granularity.is_date_based() {
                return Err(IssueSumError::Config(
                    "cumulative reports need a daily, weekly or monthly granularity".into(),
                ));
            }
        } else if self.date_field.trim().is_empty() {
            return Err(IssueSumError::Config("date field is required".into()));
        }
        Ok(())
    }

    /// One-line description used in logs and report headers
    pub fn summary(&self) -> String {
        let target = match &self.target {
            TargetType::IssueType => "issuetype",
            TargetType::Assignee => "assignee",
            TargetType::Epic => "epic",
            TargetType::Custom(field) => field.as_str(),
        };
        let mode = if self.cumulative { " cumulative" } else { "" };
        format!(
            "{} {} {} {}..{}{}",
            self.project,
            target,
            self.granularity.label(),
            self.range.from,
            self.range.to,
            mode
        )
    }
}

/// Ordered output of one report run
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Report {
    /// One-line description of the request, e.g. `PRJ issuetype Month 2024-01-01..2024-03-31`
    pub summary: String,
    pub issue_count: usize,
    pub buckets: Vec<Bucket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request() -> ReportRequest {
        ReportRequest {
            project: "PRJ".into(),
            issue_types: vec![],
            number_field: Some("customfield_10016".into()),
            date_field: "created".into(),
            granularity: Granularity::Monthly,
            target: TargetType::IssueType,
            range: DateRange {
                from: date("2024-01-01"),
                to: date("2024-03-31"),
            },
            cumulative: false,
        }
    }

    // ========== BucketOrder tests ==========

    #[test]
    fn test_order_numeric_not_lexical() {
        assert!(BucketOrder::Number(9.0) < BucketOrder::Number(10.0));
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(BucketOrder::parse("42"), BucketOrder::Number(42.0));
        assert_eq!(BucketOrder::parse("High"), BucketOrder::Text("High".into()));
        assert_eq!(BucketOrder::parse("NaN"), BucketOrder::Text("NaN".into()));
    }

    #[test]
    fn test_order_numbers_before_text() {
        assert!(BucketOrder::Number(1e9) < BucketOrder::Text("A".into()));
    }

    #[test]
    fn test_order_serializes_untagged() {
        let json = serde_json::to_string(&BucketOrder::Number(202403.0)).unwrap();
        assert_eq!(json, "202403.0");
        let json = serde_json::to_string(&BucketOrder::Text("Low".into())).unwrap();
        assert_eq!(json, "\"Low\"");
    }

    // ========== TermPreset tests ==========

    #[test]
    fn test_preset_past_year() {
        let range = TermPreset::PastYear.resolve(date("2024-03-15"));
        assert_eq!(range.from, date("2023-03-15"));
        assert_eq!(range.to, date("2024-03-15"));
    }

    #[test]
    fn test_preset_past_month_crosses_year() {
        let range = TermPreset::PastMonth.resolve(date("2024-01-10"));
        assert_eq!(range.from, date("2023-12-10"));
    }

    #[test]
    fn test_preset_clamps_month_end() {
        let range = TermPreset::Past3Months.resolve(date("2024-05-31"));
        assert_eq!(range.from, date("2024-02-29"));
    }

    #[test]
    fn test_preset_explicit_range() {
        let range = TermPreset::Range {
            from: date("2024-01-01"),
            to: date("2024-01-31"),
        }
        .resolve(date("2030-01-01"));
        assert_eq!(range.from, date("2024-01-01"));
        assert_eq!(range.to, date("2024-01-31"));
    }

    // ========== validate tests ==========

    #[test]
    fn test_validate_ok() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_project() {
        let mut req = request();
        req.project = " ".into();
        assert!(matches!(req.validate(), Err(IssueSumError::Config(_))));
    }

    #[test]
    fn test_validate_missing_date_field() {
        let mut req = request();
        req.date_field = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_cumulative_without_date_field() {
        let mut req = request();
        req.date_field = String::new();
        req.cumulative = true;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            request().summary(),
            "PRJ issuetype Month 2024-01-01..2024-03-31"
        );
        let mut req = request();
        req.cumulative = true;
        req.granularity = Granularity::Daily;
        assert!(req.summary().ends_with(" cumulative"));
    }

    #[test]
    fn test_validate_cumulative_sprint_rejected() {
        let mut req = request();
        req.cumulative = true;
        req.granularity = Granularity::Sprint;
        assert!(req.validate().is_err());
    }
}
