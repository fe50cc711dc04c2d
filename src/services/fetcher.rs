//! Paginated fetcher over the Jira search endpoint

use tokio_util::sync::CancellationToken;

use super::query::SearchQuery;
use crate::types::{FieldMeta, Issue, IssueSumError, Result, SearchPage, SearchRequest};

/// Issues requested per search page
pub const PAGE_SIZE: u64 = 100;

/// Source of issue search results and field metadata
pub trait IssueSource {
    /// Run one search page. Undecodable bodies are `IssueSumError::Parse`.
    fn search(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// All fields known to the site
    fn fields(&self) -> Result<Vec<FieldMeta>>;
}

/// Fetch every issue matching `query`, page by page.
///
/// Pages are requested at offsets 0, 100, 200, … while `offset + PAGE_SIZE`
/// is below the total reported by the latest page. A page that cannot be
/// decoded counts as empty; any other failure aborts the whole fetch.
/// `cancel` is checked before each page.
pub fn fetch_all<S: IssueSource + ?Sized>(
    source: &S,
    query: &SearchQuery,
    cancel: &CancellationToken,
) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();
    let mut offset: u64 = 0;
    let mut total: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(IssueSumError::Cancelled);
        }

        let request = SearchRequest {
            jql: query.jql.clone(),
            fields: query.fields.clone(),
            start_at: offset,
            max_results: PAGE_SIZE,
        };

        match source.search(&request) {
            Ok(page) => {
                tracing::debug!(
                    start_at = offset,
                    received = page.issues.len(),
                    total = page.total,
                    "search page"
                );
                total = page.total;
                issues.extend(page.issues);
            }
            Err(IssueSumError::Parse(msg)) => {
                tracing::warn!(start_at = offset, "unreadable search page skipped: {}", msg);
            }
            Err(e) => return Err(e),
        }

        if offset.saturating_add(PAGE_SIZE) >= total {
            break;
        }
        offset += PAGE_SIZE;
    }

    Ok(issues)
}
