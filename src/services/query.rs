//! JQL query builder
//!
//! Translates a [`ReportRequest`] into the JQL string and field list sent to
//! the search endpoint. Requests are validated upstream; nothing here fails.

use chrono::NaiveDate;

use crate::services::term;
use crate::types::{Granularity, ReportRequest, SiteFields, TargetType};

/// Field id prefix Jira uses for custom fields
const CUSTOM_FIELD_PREFIX: &str = "customfield_";

/// JQL plus the fields to return for each issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub jql: String,
    pub fields: Vec<String>,
}

/// JQL clause name for a field id.
///
/// `customfield_10016` → `cf[10016]`; system fields pass through unchanged.
pub fn clause_name(field_id: &str) -> String {
    match field_id.strip_prefix(CUSTOM_FIELD_PREFIX) {
        Some(number) => format!("cf[{}]", number),
        None => field_id.to_string(),
    }
}

/// Query for a count/sum report.
///
/// The upper bound is sent as `< to + 1 day` so the whole of `to` is
/// included whatever time of day the stored value carries.
pub fn build_query(request: &ReportRequest, site: &SiteFields) -> SearchQuery {
    let date_clause = clause_name(&request.date_field);
    let mut clauses = base_clauses(request);
    clauses.push(format!(
        "{} >= {}",
        date_clause,
        quote(&format_date(request.range.from))
    ));
    clauses.push(format!(
        "{} < {}",
        date_clause,
        quote(&format_date(day_after(request.range.to)))
    ));

    let jql = format!(
        "{} ORDER BY {} DESC",
        clauses.join(" AND "),
        date_clause
    );

    let mut fields = Vec::new();
    push_unique(&mut fields, &request.date_field);
    push_unique(&mut fields, "issuetype");
    push_unique(&mut fields, "assignee");
    if let Some(number_field) = &request.number_field {
        push_unique(&mut fields, number_field);
    }
    if let Some(sprint_field) = &site.sprint {
        push_unique(&mut fields, sprint_field);
    }
    if let Granularity::Custom(field) = &request.granularity {
        push_unique(&mut fields, field);
    }
    match &request.target {
        TargetType::Custom(field) => push_unique(&mut fields, field),
        TargetType::Epic => {
            push_unique(&mut fields, "parent");
            if let Some(epic_link) = &site.epic_link {
                push_unique(&mut fields, epic_link);
            }
        }
        _ => {}
    }

    SearchQuery { jql, fields }
}

/// Query for a cumulative flow report.
///
/// Snapshots need every issue still open at some point of the range, so
/// this selects issues created before the range end that were not already
/// resolved before the start of the first period. A mid-period `from` is
/// widened to its period start because the first snapshot is taken there.
pub fn cumulative_query(request: &ReportRequest) -> SearchQuery {
    let mut clauses = base_clauses(request);
    clauses.push(format!(
        "created < {}",
        quote(&format_date(day_after(request.range.to)))
    ));
    let first_snapshot = term::period_start(request.range.from, &request.granularity);
    clauses.push(format!(
        "(resolutiondate >= {} OR resolutiondate is EMPTY)",
        quote(&format_date(first_snapshot))
    ));

    SearchQuery {
        jql: format!("{} ORDER BY created DESC", clauses.join(" AND ")),
        fields: vec![
            "created".to_string(),
            "resolutiondate".to_string(),
            "issuetype".to_string(),
        ],
    }
}

/// Project and issue-type constraints shared by both query kinds
fn base_clauses(request: &ReportRequest) -> Vec<String> {
    let mut clauses = vec![format!("project = {}", quote(&request.project))];

    let issue_types: Vec<String> = request
        .issue_types
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("issuetype = {}", quote(t)))
        .collect();
    match issue_types.len() {
        0 => {}
        1 => clauses.extend(issue_types),
        _ => clauses.push(format!("({})", issue_types.join(" OR "))),
    }

    clauses
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn day_after(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn push_unique(fields: &mut Vec<String>, field: &str) {
    if !field.is_empty() && !fields.iter().any(|f| f == field) {
        fields.push(field.to_string());
    }
}
