//! In-progress Linear issues that have gone quiet

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use super::{failed_line, not_configured, truncate, Module, ModuleError};
use crate::cache::{credential_tag, CacheManager};
use crate::color::{Colorizer, Tone};
use crate::config::{non_empty, Config};
use crate::data::{LinearClient, StalledIssues, Team};

const TITLE_WIDTH: usize = 60;

/// One section of the fragment: a team, or every team at once
#[derive(Debug, Clone, PartialEq, Eq)]
struct Scope {
    label: String,
    team_id: Option<String>,
}

enum StalledState {
    Unconfigured,
    /// The team list could not be loaded
    TeamsUnavailable,
    Ready {
        client: LinearClient,
        /// Keeps cache entries of different workspaces apart
        account: String,
        scopes: Vec<Scope>,
    },
}

pub struct StalledModule {
    http: Client,
    cache: CacheManager,
    state: StalledState,
}

impl StalledModule {
    pub fn new(http: Client, cache: CacheManager) -> Self {
        Self {
            http,
            cache,
            state: StalledState::Unconfigured,
        }
    }
}

/// Maps configured team names onto teams, keeping configured order
///
/// An empty list selects every team. Names that match nothing are logged
/// and skipped; the same team named twice appears once.
fn resolve_scopes(wanted: &[String], teams: &[Team]) -> Vec<Scope> {
    if wanted.is_empty() {
        return vec![Scope {
            label: "All teams".to_string(),
            team_id: None,
        }];
    }

    let mut scopes: Vec<Scope> = Vec::new();
    for name in wanted {
        match teams.iter().find(|team| team.matches(name)) {
            Some(team) => {
                if !scopes.iter().any(|s| s.team_id.as_deref() == Some(team.id.as_str())) {
                    scopes.push(Scope {
                        label: team.key.clone(),
                        team_id: Some(team.id.clone()),
                    });
                }
            }
            None => tracing::warn!(team = %name, "no Linear team matches, skipping"),
        }
    }
    scopes
}

#[async_trait]
impl Module for StalledModule {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn setup(&mut self, config: &Config) -> Result<(), ModuleError> {
        let Some(api_key) = non_empty(&config.linear.api_key) else {
            tracing::warn!("no Linear API key configured, stalled module disabled");
            self.state = StalledState::Unconfigured;
            return Ok(());
        };
        let client = LinearClient::new(self.http.clone(), &config.linear.api_url, api_key);
        let account = credential_tag(api_key);

        if config.linear.teams.is_empty() {
            self.state = StalledState::Ready {
                client,
                account,
                scopes: resolve_scopes(&[], &[]),
            };
            return Ok(());
        }

        let key = format!("linear_{}_teams", account);
        let teams = self
            .cache
            .request_with_cache(&key, config.cache.linear_teams(), || async {
                client.teams().await
            })
            .await;

        self.state = match teams {
            Ok(teams) => StalledState::Ready {
                scopes: resolve_scopes(&config.linear.teams, &teams),
                client,
                account,
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load Linear teams");
                StalledState::TeamsUnavailable
            }
        };
        Ok(())
    }

    async fn display(&self, config: &Config) -> Result<String, ModuleError> {
        let colors = Colorizer::from_config(config.display.colors);
        let title = colors.paint(Tone::Title, "Stalled issues");

        let (client, account, scopes) = match &self.state {
            StalledState::Unconfigured => {
                return Ok(not_configured(
                    &colors,
                    "Stalled issues",
                    "set linear.api_key or LINEAR_API_KEY",
                ));
            }
            StalledState::TeamsUnavailable => {
                return Ok(format!("{}\n{}", title, failed_line(&colors, "Teams")));
            }
            StalledState::Ready {
                client,
                account,
                scopes,
            } => (client, account, scopes),
        };

        let days = config.linear.stalled_after_days;
        let mut lines = vec![format!(
            "{} {}",
            title,
            colors.paint(Tone::Muted, format!("(no update in {}+ days)", days))
        )];
        if scopes.is_empty() {
            lines.push(colors.paint(Tone::Warn, "  No configured Linear team was found"));
            return Ok(lines.join("\n"));
        }

        let now = Utc::now();
        for scope in scopes {
            let key = format!(
                "linear_{}_{}_stalled_{}",
                account,
                scope.team_id.as_deref().unwrap_or("all"),
                days
            );
            let fetched = self
                .cache
                .request_with_cache(&key, config.cache.linear(), || async {
                    client.stalled_issues(scope.team_id.as_deref(), days).await
                })
                .await;

            lines.push(match fetched {
                Ok(stalled) => render_scope(&scope.label, &stalled, config.display.max_items, now, &colors),
                Err(e) => {
                    tracing::warn!(team = %scope.label, error = %e, "failed to fetch stalled issues");
                    failed_line(&colors, &scope.label)
                }
            });
        }
        Ok(lines.join("\n"))
    }
}

fn render_scope(
    label: &str,
    stalled: &StalledIssues,
    max_items: usize,
    now: DateTime<Utc>,
    colors: &Colorizer,
) -> String {
    let count = if stalled.truncated {
        format!("{}+", stalled.issues.len())
    } else {
        stalled.issues.len().to_string()
    };
    let tone = if stalled.issues.is_empty() {
        Tone::Good
    } else {
        Tone::Warn
    };

    let mut lines = vec![format!("  {}: {}", label, colors.paint(tone, count))];
    for issue in stalled.issues.iter().take(max_items) {
        let idle_days = now.signed_duration_since(issue.updated_at).num_days().max(0);
        lines.push(format!(
            "    • {} {} {}",
            colors.paint(Tone::Muted, &issue.identifier),
            truncate(&issue.title, TITLE_WIDTH),
            colors.paint(Tone::Muted, format!("({}d)", idle_days))
        ));
    }
    lines.join("\n")
}
