//! Sprint and epic derivation
//!
//! An issue may belong to several sprints. The sprint a report files it under
//! is the membership with the highest trailing number in its name. When two
//! memberships share that number the first one listed wins.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::types::{EnrichedIssue, FieldMeta, Issue, SiteFields, Sprint};

/// Display name Jira Software gives its sprint field
pub const SPRINT_FIELD_NAME: &str = "Sprint";

/// Display name of the legacy epic-link field
pub const EPIC_LINK_FIELD_NAME: &str = "Epic Link";

fn trailing_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)\s*$").expect("valid regex"))
}

fn legacy_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bname=([^,\]]*)").expect("valid regex"))
}

fn legacy_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bid=(\d+)").expect("valid regex"))
}

/// Trailing integer of a sprint name ("Sprint 14" → 14)
pub fn sprint_number(name: &str) -> Option<u32> {
    trailing_number_re()
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// All numbered sprint memberships in a sprint field value
pub fn sprint_memberships(value: &Value) -> Vec<Sprint> {
    match value {
        Value::Array(items) => items.iter().filter_map(parse_membership).collect(),
        other => parse_membership(other).into_iter().collect(),
    }
}

/// Accepts the REST object form and the legacy
/// `com.atlassian.greenhopper.service.sprint.Sprint@..[id=7,..,name=Sprint 3,..]`
/// string form.
fn parse_membership(value: &Value) -> Option<Sprint> {
    let (id, name) = match value {
        Value::Object(map) => (
            map.get("id").and_then(Value::as_u64),
            map.get("name")?.as_str()?.to_string(),
        ),
        Value::String(raw) => {
            let name = legacy_name_re().captures(raw)?.get(1)?.as_str().to_string();
            let id = legacy_id_re()
                .captures(raw)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok());
            (id, name)
        }
        _ => return None,
    };
    let number = sprint_number(&name)?;
    Some(Sprint { id, name, number })
}

/// Sprint an issue is reported under, if any
pub fn derive_sprint(issue: &Issue, sprint_field: &str) -> Option<Sprint> {
    let memberships = issue
        .field(sprint_field)
        .map(sprint_memberships)
        .unwrap_or_default();

    let mut latest: Option<Sprint> = None;
    for sprint in memberships {
        match &latest {
            Some(l) if sprint.number <= l.number => {}
            _ => latest = Some(sprint),
        }
    }
    latest
}

/// Attach derived values to each issue without touching the issues.
pub fn enrich<'a>(issues: &'a [Issue], site: &SiteFields) -> Vec<EnrichedIssue<'a>> {
    issues
        .iter()
        .map(|issue| EnrichedIssue {
            issue,
            sprint: site
                .sprint
                .as_deref()
                .and_then(|field| derive_sprint(issue, field)),
            epic: issue.epic_key(site.epic_link.as_deref()),
        })
        .collect()
}

/// Locate the sprint field: by display name first, then by field type.
pub fn find_sprint_field(fields: &[FieldMeta]) -> Option<&FieldMeta> {
    fields
        .iter()
        .find(|f| f.name == SPRINT_FIELD_NAME)
        .or_else(|| fields.iter().find(|f| f.is_sprint()))
}

/// Locate the legacy epic-link field, if the site still has one
pub fn find_epic_link_field(fields: &[FieldMeta]) -> Option<&FieldMeta> {
    fields
        .iter()
        .find(|f| f.is_epic_link())
        .or_else(|| fields.iter().find(|f| f.name == EPIC_LINK_FIELD_NAME))
}
