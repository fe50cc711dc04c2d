//! Wire types for the Jira REST API endpoints issuesum talks to

use serde::{Deserialize, Serialize};

use super::Issue;

/// Body of `POST /rest/api/3/search`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub jql: String,
    pub fields: Vec<String>,
    pub start_at: u64,
    pub max_results: u64,
}

/// One page of search results
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub max_results: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// Field metadata from `GET /rest/api/3/field`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub schema: Option<FieldSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: String,
    /// Plugin key for custom fields, e.g. `com.pyxis.greenhopper.jira:gh-sprint`
    #[serde(default)]
    pub custom: Option<String>,
}

/// Declared value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Date,
    Option,
}

impl FieldMeta {
    pub fn schema_type(&self) -> Option<&str> {
        self.schema.as_ref().map(|s| s.kind.as_str())
    }

    pub fn is_kind(&self, kind: FieldKind) -> bool {
        match (kind, self.schema_type()) {
            (FieldKind::Number, Some(t)) => t == "number",
            (FieldKind::Date, Some(t)) => t == "datetime" || t == "date",
            (FieldKind::Option, Some(t)) => t == "option",
            (_, None) => false,
        }
    }

    pub fn is_sprint(&self) -> bool {
        self.schema
            .as_ref()
            .and_then(|s| s.custom.as_deref())
            .is_some_and(|c| c.ends_with(":gh-sprint"))
    }

    pub fn is_epic_link(&self) -> bool {
        self.schema
            .as_ref()
            .and_then(|s| s.custom.as_deref())
            .is_some_and(|c| c.ends_with(":gh-epic-link"))
    }
}

/// Site-specific ids of the custom fields derived values are read from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteFields {
    pub sprint: Option<String>,
    pub epic_link: Option<String>,
}

/// Entry of `GET /rest/api/3/project/recent`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectSummary {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// Entry of `GET /rest/api/3/issuetype/project`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueTypeSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}
