//! Linear GraphQL API client
//!
//! Lists teams (to turn configured team keys into ids) and finds in-progress
//! issues that nobody has touched for a while.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Upper bound on issues fetched per team
pub const STALLED_PAGE_SIZE: usize = 50;

const TEAMS_QUERY: &str = "query Teams { teams(first: 100) { nodes { id key name } } }";

const STALLED_QUERY: &str = "query StalledIssues($filter: IssueFilter, $first: Int) { \
    issues(filter: $filter, first: $first) { \
        nodes { identifier title updatedAt } \
    } \
}";

/// Errors that can occur when talking to Linear
#[derive(Debug, Error)]
pub enum LinearError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The API answered with GraphQL errors
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Neither data nor errors in the response
    #[error("Response contained no data")]
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub key: String,
    pub name: String,
}

impl Team {
    /// Matches a configured team against its key or name, ignoring case
    pub fn matches(&self, wanted: &str) -> bool {
        let wanted = wanted.trim();
        self.key.eq_ignore_ascii_case(wanted) || self.name.eq_ignore_ascii_case(wanted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalledIssue {
    /// e.g. `ENG-123`
    pub identifier: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Stalled issues for one query, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StalledIssues {
    pub issues: Vec<StalledIssue>,
    /// The page was full, so there may be more
    pub truncated: bool,
}

/// Client for the Linear GraphQL endpoint
#[derive(Debug, Clone)]
pub struct LinearClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl LinearClient {
    pub fn new(client: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    async fn query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, LinearError> {
        let response = self
            .client
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        // GraphQL errors usually arrive with a 4xx status, so parse before judging it
        let status = response.status();
        let text = response.text().await?;
        let body: GraphQlResponse<T> = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(e.into()),
            Err(_) => return Err(LinearError::GraphQl(format!("HTTP {}", status.as_u16()))),
        };

        if let Some(errors) = body.errors.filter(|errors| !errors.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(LinearError::GraphQl(messages.join("; ")));
        }
        body.data.ok_or(LinearError::MissingData)
    }

    /// Every team visible to the API key
    pub async fn teams(&self) -> Result<Vec<Team>, LinearError> {
        let data: TeamsData = self.query(TEAMS_QUERY, json!({})).await?;
        Ok(data.teams.nodes)
    }

    /// Started issues not updated for `stalled_after_days`, optionally for one team
    pub async fn stalled_issues(
        &self,
        team_id: Option<&str>,
        stalled_after_days: u32,
    ) -> Result<StalledIssues, LinearError> {
        let mut filter = json!({
            "state": { "type": { "eq": "started" } },
            "updatedAt": { "lt": format!("-P{}D", stalled_after_days) },
        });
        if let Some(team_id) = team_id {
            filter["team"] = json!({ "id": { "eq": team_id } });
        }

        let data: IssuesData = self
            .query(STALLED_QUERY, json!({ "filter": filter, "first": STALLED_PAGE_SIZE }))
            .await?;

        let truncated = data.issues.nodes.len() >= STALLED_PAGE_SIZE;
        let mut issues: Vec<StalledIssue> =
            data.issues.nodes.into_iter().map(StalledIssue::from).collect();
        issues.sort_by_key(|issue| issue.updated_at);

        Ok(StalledIssues { issues, truncated })
    }
}

impl From<ApiIssue> for StalledIssue {
    fn from(issue: ApiIssue) -> Self {
        Self {
            identifier: issue.identifier,
            title: issue.title,
            updated_at: issue.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TeamsData {
    teams: Nodes<Team>,
}

#[derive(Debug, Deserialize)]
struct IssuesData {
    issues: Nodes<ApiIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiIssue {
    identifier: String,
    title: String,
    updated_at: DateTime<Utc>,
}
