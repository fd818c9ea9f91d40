//! GitHub REST API client
//!
//! Only two endpoints are needed: `/user` to find out who the token belongs
//! to, and `/search/issues` for the PR and issue lists.

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to GitHub
#[derive(Debug, Error)]
pub enum GithubError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Non-success status, with GitHub's message when it sent one
    #[error("GitHub returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// One page of a search, plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub items: Vec<IssueSummary>,
}

/// A pull request or issue as listed on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    /// `owner/repo`
    pub repository: String,
    pub draft: bool,
}

/// Client for the GitHub REST API, authenticated with a token
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    api_url: String,
    token: String,
}

impl GithubClient {
    pub fn new(client: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn get(&self, endpoint: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.api_url, endpoint))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Login of the account the token belongs to
    pub async fn viewer_login(&self) -> Result<String, GithubError> {
        let response = check_status(self.get("/user").send().await?).await?;
        let text = response.text().await?;
        let user: ApiUser = serde_json::from_str(&text)?;
        Ok(user.login)
    }

    /// Run an issue search, most recently updated first
    pub async fn search_issues(
        &self,
        query: &str,
        per_page: usize,
    ) -> Result<SearchResults, GithubError> {
        let per_page = per_page.clamp(1, 100).to_string();
        let request = self.get("/search/issues").query(&[
            ("q", query),
            ("sort", "updated"),
            ("order", "desc"),
            ("per_page", per_page.as_str()),
        ]);
        let response = check_status(request.send().await?).await?;
        let text = response.text().await?;
        let api_response: ApiSearchResponse = serde_json::from_str(&text)?;

        Ok(SearchResults {
            total_count: api_response.total_count,
            items: api_response.items.into_iter().map(IssueSummary::from).collect(),
        })
    }
}

async fn check_status(response: Response) -> Result<Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| e.message)
        .unwrap_or(body);
    Err(GithubError::Status {
        status: status.as_u16(),
        message,
    })
}

/// `https://api.github.com/repos/owner/repo` -> `owner/repo`
fn repository_from_url(url: &str) -> String {
    let mut segments = url.trim_end_matches('/').rsplit('/');
    match (segments.next(), segments.next()) {
        (Some(repo), Some(owner)) => format!("{}/{}", owner, repo),
        _ => url.to_string(),
    }
}

impl From<ApiIssue> for IssueSummary {
    fn from(issue: ApiIssue) -> Self {
        Self {
            number: issue.number,
            title: issue.title,
            repository: repository_from_url(&issue.repository_url),
            draft: issue.draft.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    total_count: u64,
    items: Vec<ApiIssue>,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    number: u64,
    title: String,
    repository_url: String,
    #[serde(default)]
    draft: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SEARCH_RESPONSE: &str = r#"{
        "total_count": 7,
        "incomplete_results": false,
        "items": [
            {
                "number": 42,
                "title": "Fix flaky login test",
                "html_url": "https://github.com/acme/web/pull/42",
                "repository_url": "https://api.github.com/repos/acme/web",
                "updated_at": "2024-07-15T14:00:00Z",
                "draft": true,
                "state": "open"
            },
            {
                "number": 7,
                "title": "Crash on empty input",
                "html_url": "https://github.com/acme/cli/issues/7",
                "repository_url": "https://api.github.com/repos/acme/cli",
                "updated_at": "2024-07-14T09:30:00Z",
                "state": "open"
            }
        ]
    }"#;

    #[test]
    fn test_repository_from_url() {
        assert_eq!(
            repository_from_url("https://api.github.com/repos/acme/web"),
            "acme/web"
        );
        assert_eq!(repository_from_url("acme"), "acme");
    }

    #[tokio::test]
    async fn test_viewer_login_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"login": "octocat", "id": 1}"#))
            .mount(&server)
            .await;

        let client = GithubClient::new(Client::new(), server.uri(), "secret");

        assert_eq!(client.viewer_login().await.unwrap(), "octocat");
    }

    #[tokio::test]
    async fn test_search_issues_parses_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(query_param("q", "is:pr is:open author:octocat"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_RESPONSE))
            .mount(&server)
            .await;

        let client = GithubClient::new(Client::new(), server.uri(), "secret");
        let results = client
            .search_issues("is:pr is:open author:octocat", 5)
            .await
            .unwrap();

        assert_eq!(results.total_count, 7);
        assert_eq!(results.items.len(), 2);
        assert_eq!(results.items[0].repository, "acme/web");
        assert!(results.items[0].draft);
        assert!(!results.items[1].draft);
    }

    #[tokio::test]
    async fn test_error_status_carries_github_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"message": "Bad credentials"}"#),
            )
            .mount(&server)
            .await;

        let client = GithubClient::new(Client::new(), server.uri(), "wrong");
        let err = client.viewer_login().await.unwrap_err();

        match err {
            GithubError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
