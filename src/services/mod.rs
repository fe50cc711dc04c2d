//! Services for querying, fetching and aggregating Jira issues

pub mod aggregator;
pub mod config;
pub mod cumulative;
pub mod fetcher;
pub mod grid;
pub mod jira;
pub mod query;
pub mod report;
pub mod sprint;
pub mod term;

pub use aggregator::{AggregationStats, Aggregator};
pub use config::{Settings, SettingsLayer};
pub use cumulative::CumulativeAggregator;
pub use fetcher::{fetch_all, IssueSource, PAGE_SIZE};
pub use grid::BucketGrid;
pub use jira::JiraClient;
pub use query::{build_query, cumulative_query, SearchQuery};
pub use report::ReportService;
