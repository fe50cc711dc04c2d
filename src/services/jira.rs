//! Jira Cloud REST client
//!
//! Blocking client for the handful of endpoints issuesum needs. Every call
//! authenticates with HTTP basic auth (account e-mail + API token).

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::config::Settings;
use super::fetcher::IssueSource;
use crate::types::{
    FieldKind, FieldMeta, IssueSumError, IssueTypeSummary, ProjectSummary, Result, SearchPage,
    SearchRequest,
};

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

const SEARCH_PATH: &str = "/rest/api/3/search";
const FIELD_PATH: &str = "/rest/api/3/field";
const RECENT_PROJECTS_PATH: &str = "/rest/api/3/project/recent";
const PROJECT_ISSUE_TYPES_PATH: &str = "/rest/api/3/issuetype/project";

/// Jira REST API client
pub struct JiraClient {
    base_url: String,
    email: String,
    api_token: String,
    http: Client,
}

impl JiraClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| IssueSumError::Http(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            email: settings.email.clone(),
            api_token: settings.api_token.clone(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.email, Some(&self.api_token))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(builder)
            .send()
            .map_err(|e| IssueSumError::Http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IssueSumError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self.send(self.http.get(self.url(path)).query(query))?;
        decode(response)
    }

    /// Projects the user viewed recently
    pub fn recent_projects(&self) -> Result<Vec<ProjectSummary>> {
        self.get_json(RECENT_PROJECTS_PATH, &[])
    }

    /// Issue types available in a project
    pub fn project_issue_types(&self, project_id: &str) -> Result<Vec<IssueTypeSummary>> {
        self.get_json(PROJECT_ISSUE_TYPES_PATH, &[("projectId", project_id)])
    }

    /// Fields of one declared kind (number, date/datetime, option)
    pub fn fields_of_kind(&self, kind: FieldKind) -> Result<Vec<FieldMeta>> {
        Ok(self
            .fields()?
            .into_iter()
            .filter(|f| f.is_kind(kind))
            .collect())
    }
}

impl IssueSource for JiraClient {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let response = self.send(self.http.post(self.url(SEARCH_PATH)).json(request))?;
        decode(response)
    }

    fn fields(&self) -> Result<Vec<FieldMeta>> {
        self.get_json(FIELD_PATH, &[])
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .map_err(|e| IssueSumError::Http(format!("failed to read body: {}", e)))?;
    serde_json::from_str(&body).map_err(|e| IssueSumError::Parse(format!("JSON parse error: {}", e)))
}
