//! Report service: query, fetch, aggregate and order in one call

use std::cell::RefCell;

use tokio_util::sync::CancellationToken;

use super::aggregator::{AggregationStats, Aggregator};
use super::cumulative::CumulativeAggregator;
use super::fetcher::{fetch_all, IssueSource};
use super::grid::BucketGrid;
use super::query::{build_query, cumulative_query};
use super::sprint::{enrich, find_epic_link_field, find_sprint_field};
use crate::types::{
    FieldMeta, Granularity, IssueSumError, Report, ReportRequest, Result, SiteFields, TargetType,
};

/// Runs report requests against an issue source
pub struct ReportService<S: IssueSource> {
    source: S,
    /// Field metadata, fetched on the first report that needs it
    fields: RefCell<Option<Vec<FieldMeta>>>,
}

impl<S: IssueSource> ReportService<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            fields: RefCell::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run one report end to end
    pub fn run(&self, request: &ReportRequest, cancel: &CancellationToken) -> Result<Report> {
        request.validate()?;

        let (grid, stats, issue_count) = if request.cumulative {
            let query = cumulative_query(request);
            let issues = fetch_all(&self.source, &query, cancel)?;
            let (grid, stats) = CumulativeAggregator::run(request, &issues);
            (grid, stats, issues.len())
        } else {
            let site = self.site_fields(request)?;
            let query = build_query(request, &site);
            let issues = fetch_all(&self.source, &query, cancel)?;
            let enriched = enrich(&issues, &site);
            let (grid, stats) = Aggregator::run(request, &enriched);
            (grid, stats, issues.len())
        };

        Ok(self.finish(request, grid, stats, issue_count))
    }

    fn finish(
        &self,
        request: &ReportRequest,
        grid: BucketGrid,
        stats: AggregationStats,
        issue_count: usize,
    ) -> Report {
        let summary = request.summary();
        tracing::info!(
            report = %summary,
            issues = issue_count,
            buckets = grid.len(),
            matched = stats.matched,
            skipped = stats.skipped,
            "report complete"
        );
        Report {
            summary,
            issue_count,
            buckets: grid.into_ordered(),
        }
    }

    /// Site-specific fields `request` reads.
    ///
    /// A sprint report fails without a sprint field. An epic report works
    /// without the legacy epic link field, using `parent` alone.
    fn site_fields(&self, request: &ReportRequest) -> Result<SiteFields> {
        let needs_sprint = matches!(request.granularity, Granularity::Sprint);
        let needs_epic = matches!(request.target, TargetType::Epic);
        if !needs_sprint && !needs_epic {
            return Ok(SiteFields::default());
        }

        self.with_fields(|fields| -> Result<SiteFields> {
            let sprint = if needs_sprint {
                let field = find_sprint_field(fields)
                    .ok_or_else(|| IssueSumError::Config("no sprint field on this site".into()))?;
                Some(field.id.clone())
            } else {
                None
            };
            let epic_link = if needs_epic {
                find_epic_link_field(fields).map(|f| f.id.clone())
            } else {
                None
            };
            tracing::debug!(sprint = ?sprint, epic_link = ?epic_link, "resolved site fields");
            Ok(SiteFields { sprint, epic_link })
        })?
    }

    /// Field metadata, fetched once per service
    fn with_fields<T>(&self, f: impl FnOnce(&[FieldMeta]) -> T) -> Result<T> {
        if let Some(fields) = self.fields.borrow().as_deref() {
            return Ok(f(fields));
        }
        let fields = self.source.fields()?;
        let out = f(&fields);
        *self.fields.borrow_mut() = Some(fields);
        Ok(out)
    }
}
