//! GitHub pull requests and issues that need attention

use async_trait::async_trait;
use reqwest::Client;

use super::{failed_line, not_configured, truncate, Module, ModuleError};
use crate::cache::{credential_tag, CacheManager};
use crate::color::{Colorizer, Tone};
use crate::config::{non_empty, Config};
use crate::data::{GithubClient, SearchResults};

const TITLE_WIDTH: usize = 60;

/// One search shown as its own section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    ReviewRequested,
    PullRequests,
    AssignedIssues,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::ReviewRequested,
        Section::PullRequests,
        Section::AssignedIssues,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Section::ReviewRequested => "Review requested",
            Section::PullRequests => "Your open PRs",
            Section::AssignedIssues => "Assigned issues",
        }
    }

    /// Part of the cache key
    fn slug(self) -> &'static str {
        match self {
            Section::ReviewRequested => "review_requested",
            Section::PullRequests => "pull_requests",
            Section::AssignedIssues => "assigned_issues",
        }
    }

    pub fn query(self, login: &str) -> String {
        match self {
            Section::ReviewRequested => {
                format!("is:pr is:open review-requested:{} archived:false", login)
            }
            Section::PullRequests => format!("is:pr is:open author:{} archived:false", login),
            Section::AssignedIssues => {
                format!("is:issue is:open assignee:{} archived:false", login)
            }
        }
    }

    fn enabled(self, config: &Config) -> bool {
        match self {
            Section::ReviewRequested => config.github.show_review_requests,
            Section::PullRequests => config.github.show_pull_requests,
            Section::AssignedIssues => config.github.show_assigned_issues,
        }
    }
}

/// Authenticated client plus the login it acts as
struct Account {
    client: GithubClient,
    login: String,
}

pub struct GithubModule {
    http: Client,
    cache: CacheManager,
    account: Option<Account>,
}

impl GithubModule {
    pub fn new(http: Client, cache: CacheManager) -> Self {
        Self {
            http,
            cache,
            account: None,
        }
    }

    async fn render_section(
        &self,
        account: &Account,
        section: Section,
        config: &Config,
        colors: &Colorizer,
    ) -> String {
        let max_items = config.display.max_items;
        let key = format!(
            "github_{}_{}_{}",
            account.login.to_lowercase(),
            section.slug(),
            max_items
        );
        let fetched = self
            .cache
            .request_with_cache(&key, config.cache.github(), || async {
                account
                    .client
                    .search_issues(&section.query(&account.login), max_items)
                    .await
            })
            .await;

        match fetched {
            Ok(results) => render_results(section, &results, max_items, colors),
            Err(e) => {
                tracing::warn!(section = section.label(), error = %e, "failed to fetch GitHub search");
                failed_line(colors, section.label())
            }
        }
    }
}

#[async_trait]
impl Module for GithubModule {
    fn name(&self) -> &str {
        "github"
    }

    async fn setup(&mut self, config: &Config) -> Result<(), ModuleError> {
        self.account = None;
        let Some(token) = non_empty(&config.github.token) else {
            tracing::warn!("no GitHub token configured, github module disabled");
            return Ok(());
        };
        let client = GithubClient::new(self.http.clone(), &config.github.api_url, token);

        let login = match non_empty(&config.github.username) {
            Some(login) => login.to_string(),
            None => {
                let key = format!("github_viewer_{}", credential_tag(token));
                let resolved = self
                    .cache
                    .request_with_cache(&key, config.cache.github_user(), || async {
                        client.viewer_login().await
                    })
                    .await;
                match resolved {
                    Ok(login) => login,
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to resolve GitHub user, github module disabled");
                        return Ok(());
                    }
                }
            }
        };

        tracing::debug!(login = %login, "GitHub account resolved");
        self.account = Some(Account { client, login });
        Ok(())
    }

    async fn display(&self, config: &Config) -> Result<String, ModuleError> {
        let colors = Colorizer::from_config(config.display.colors);
        let Some(account) = &self.account else {
            return Ok(not_configured(&colors, "GitHub", "set github.token or GITHUB_TOKEN"));
        };

        let mut lines = vec![format!(
            "{} {}",
            colors.paint(Tone::Title, "GitHub"),
            colors.paint(Tone::Muted, format!("(@{})", account.login))
        )];
        for section in Section::ALL.into_iter().filter(|s| s.enabled(config)) {
            lines.push(self.render_section(account, section, config, &colors).await);
        }
        Ok(lines.join("\n"))
    }
}

fn render_results(
    section: Section,
    results: &SearchResults,
    max_items: usize,
    colors: &Colorizer,
) -> String {
    let count_tone = if results.total_count == 0 {
        Tone::Good
    } else {
        Tone::Accent
    };
    let mut lines = vec![format!(
        "  {}: {}",
        section.label(),
        colors.paint(count_tone, results.total_count.to_string())
    )];

    for item in results.items.iter().take(max_items) {
        let draft = if item.draft { " [draft]" } else { "" };
        lines.push(format!(
            "    • {} {}{}",
            colors.paint(Tone::Muted, format!("{}#{}", item.repository, item.number)),
            truncate(&item.title, TITLE_WIDTH),
            draft
        ));
    }

    let hidden = results.total_count.saturating_sub(results.items.len().min(max_items) as u64);
    if hidden > 0 && !results.items.is_empty() {
        lines.push(colors.paint(Tone::Muted, format!("    … and {} more", hidden)));
    }
    lines.join("\n")
}
