//! Dashboard modules
//!
//! Every data source implements [`Module`]: `setup` once per process to
//! resolve identities and locations, then `display` to render a fragment.
//! Missing credentials are a normal state, not an error: the module says it
//! is not configured instead of failing.

pub mod github;
pub mod greeting;
pub mod stalled;
pub mod system;
pub mod weather;

pub use github::GithubModule;
pub use greeting::GreetingModule;
pub use stalled::StalledModule;
pub use system::SystemModule;
pub use weather::WeatherModule;

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheManager;
use crate::color::{Colorizer, Tone};
use crate::config::Config;
use crate::data::{GithubError, LinearError, WeatherError};

/// Errors a module can surface to the orchestrator
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error(transparent)]
    Linear(#[from] LinearError),

    /// The module exceeded `performance.max_execution_ms`
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

/// A data source with a setup → display → cleanup lifecycle
#[async_trait]
pub trait Module: Send + Sync {
    /// Name used in `enabled_modules`
    fn name(&self) -> &str;

    /// Resolve whatever the module needs before it can display
    async fn setup(&mut self, config: &Config) -> Result<(), ModuleError>;

    /// Render this module's fragment; an empty string contributes nothing
    async fn display(&self, config: &Config) -> Result<String, ModuleError>;

    async fn cleanup(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }
}

/// All built-in modules, sharing one HTTP client and cache
pub fn builtin_modules(http: Client, cache: CacheManager) -> Vec<Box<dyn Module>> {
    vec![
        Box::new(GreetingModule::new()),
        Box::new(SystemModule::new()),
        Box::new(WeatherModule::new(http.clone(), cache.clone())),
        Box::new(GithubModule::new(http.clone(), cache.clone())),
        Box::new(StalledModule::new(http, cache)),
    ]
}

/// `  Label: failed to fetch`, used when one section's request fails
pub(crate) fn failed_line(colors: &Colorizer, label: &str) -> String {
    format!("  {}: {}", label, colors.paint(Tone::Bad, "failed to fetch"))
}

/// `Title: not configured (hint)`
pub(crate) fn not_configured(colors: &Colorizer, title: &str, hint: &str) -> String {
    format!(
        "{}: {} {}",
        colors.paint(Tone::Title, title),
        colors.paint(Tone::Warn, "not configured"),
        colors.paint(Tone::Muted, format!("({})", hint)),
    )
}

/// Shortens `text` to `max` characters, ending in an ellipsis
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}
