//! Issue records as returned by the Jira search endpoint

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Target used when an issue has no assignee
pub const UNASSIGNED: &str = "Unassigned";

/// Target used when an issue belongs to no epic
pub const NO_EPIC: &str = "No epic";

/// Jira datetime layout, e.g. `2024-01-15T10:00:00.000+0900`
const JIRA_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Object keys tried, in order, when turning a structured value into a label
const LABEL_KEYS: [&str; 4] = ["value", "displayName", "name", "key"];

/// One issue from a search page.
///
/// `fields` keeps the raw field-id → JSON mapping. Values are read through
/// the typed accessors below; the record itself is never modified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Issue {
    /// Raw value of a field (JSON `null` counts as absent)
    pub fn field(&self, field_id: &str) -> Option<&Value> {
        self.fields.get(field_id).filter(|v| !v.is_null())
    }

    /// Numeric field value
    pub fn number(&self, field_id: &str) -> Option<f64> {
        self.field(field_id).and_then(Value::as_f64)
    }

    /// Calendar date of a date or datetime field
    pub fn date(&self, field_id: &str) -> Option<NaiveDate> {
        self.field(field_id)
            .and_then(Value::as_str)
            .and_then(parse_jira_date)
    }

    /// Stringified value used as a grouping label
    pub fn display_value(&self, field_id: &str) -> Option<String> {
        self.field(field_id).and_then(display_value_of)
    }

    pub fn issue_type_name(&self) -> Option<&str> {
        self.field("issuetype")
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
    }

    pub fn assignee_name(&self) -> Option<&str> {
        self.field("assignee")
            .and_then(|v| v.get("displayName"))
            .and_then(Value::as_str)
    }

    pub fn created(&self) -> Option<NaiveDate> {
        self.date("created")
    }

    pub fn resolved(&self) -> Option<NaiveDate> {
        self.date("resolutiondate")
    }

    /// Key of the parent issue when that parent is an epic
    pub fn parent_epic_key(&self) -> Option<&str> {
        let parent = self.field("parent")?;
        let parent_type = parent.get("fields")?.get("issuetype")?;
        let is_epic = parent_type
            .get("name")
            .and_then(Value::as_str)
            .is_some_and(|name| name.eq_ignore_ascii_case("epic"))
            || parent_type.get("hierarchyLevel").and_then(Value::as_i64) == Some(1);
        if !is_epic {
            return None;
        }
        parent.get("key").and_then(Value::as_str)
    }

    /// Epic an issue belongs to: its epic parent, else the value of the
    /// legacy epic-link field
    pub fn epic_key(&self, epic_link_field: Option<&str>) -> Option<String> {
        self.parent_epic_key()
            .map(String::from)
            .or_else(|| epic_link_field.and_then(|field| self.display_value(field)))
    }
}

/// Parse a Jira date or datetime string into the calendar date it names.
///
/// Datetimes keep their own UTC offset, so the date is the one the Jira
/// user saw, not the UTC date.
pub fn parse_jira_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_str(raw, JIRA_DATETIME_FORMAT) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Turn a field value into a label.
///
/// Numbers use the shortest float form (`3`, `2.5`), option/user/named
/// objects their label key, arrays the joined labels of their items.
pub fn display_value_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => n.as_f64().map(|f| f.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let labels: Vec<String> = items.iter().filter_map(display_value_of).collect();
            if labels.is_empty() {
                None
            } else {
                Some(labels.join(", "))
            }
        }
        Value::Object(map) => LABEL_KEYS
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(String::from),
    }
}

/// Sprint membership resolved from a sprint field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Option<u64>,
    pub name: String,
    /// Trailing integer of the sprint name ("Sprint 14" → 14)
    pub number: u32,
}

/// An issue together with values derived from it for one report run
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedIssue<'a> {
    pub issue: &'a Issue,
    pub sprint: Option<Sprint>,
    pub epic: Option<String>,
}
