//! Time-of-day greeting and today's date

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Timelike};

use super::{Module, ModuleError};
use crate::color::{Colorizer, Tone};
use crate::config::{non_empty, Config};

pub struct GreetingModule;

impl GreetingModule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GreetingModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for GreetingModule {
    fn name(&self) -> &str {
        "greeting"
    }

    async fn setup(&mut self, _config: &Config) -> Result<(), ModuleError> {
        Ok(())
    }

    async fn display(&self, config: &Config) -> Result<String, ModuleError> {
        let name = non_empty(&config.user.name)
            .map(str::to_string)
            .or_else(|| std::env::var("USER").ok().filter(|u| !u.is_empty()))
            .unwrap_or_else(|| "there".to_string());
        let colors = Colorizer::from_config(config.display.colors);

        Ok(compose(
            &name,
            non_empty(&config.user.greeting),
            &Local::now(),
            &colors,
        ))
    }
}

/// Salutation for the hour of the day (0-23)
pub fn salutation(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        17..=21 => "Good evening",
        _ => "Hello",
    }
}

/// Builds the greeting fragment for a moment in time
pub fn compose<Tz: TimeZone>(
    name: &str,
    custom: Option<&str>,
    now: &DateTime<Tz>,
    colors: &Colorizer,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let headline = match custom {
        Some(custom) => custom.replace("{name}", name),
        None => format!("{}, {}!", salutation(now.hour()), name),
    };

    let mut lines = vec![colors.paint(Tone::Title, headline)];
    lines.push(colors.paint(
        Tone::Muted,
        format!("It's {}.", now.format("%A, %B %-d, %H:%M")),
    ));
    if !(5..22).contains(&now.hour()) && custom.is_none() {
        lines.push(colors.paint(Tone::Muted, "Burning the midnight oil?"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 7, 15, hour, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_salutation_by_hour() {
        assert_eq!(salutation(5), "Good morning");
        assert_eq!(salutation(11), "Good morning");
        assert_eq!(salutation(12), "Good afternoon");
        assert_eq!(salutation(17), "Good evening");
        assert_eq!(salutation(21), "Good evening");
        assert_eq!(salutation(22), "Hello");
        assert_eq!(salutation(3), "Hello");
    }

    #[test]
    fn test_compose_morning() {
        let text = compose("Sam", None, &at(9), &Colorizer::plain());
        assert_eq!(text, "Good morning, Sam!\nIt's Monday, July 15, 09:05.");
    }

    #[test]
    fn test_compose_late_night_adds_note() {
        let text = compose("Sam", None, &at(2), &Colorizer::plain());
        assert!(text.starts_with("Hello, Sam!"));
        assert!(text.ends_with("Burning the midnight oil?"));
    }

    #[test]
    fn test_compose_custom_headline() {
        let text = compose("Sam", Some("Welcome back, {name}"), &at(2), &Colorizer::plain());
        assert_eq!(text.lines().next(), Some("Welcome back, Sam"));
        assert_eq!(text.lines().count(), 2);
    }
}
