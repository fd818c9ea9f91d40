//! Remote data sources and the values they produce
//!
//! Each submodule is a thin async client for one external API. Everything a
//! client returns is serializable so modules can keep it in the cache.

pub mod github;
pub mod linear;
pub mod weather;

pub use github::{GithubClient, GithubError, IssueSummary, SearchResults};
pub use linear::{LinearClient, LinearError, StalledIssue, StalledIssues, Team};
pub use weather::{WeatherClient, WeatherError};

use serde::{Deserialize, Serialize};

use crate::config::Units;

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// State or province
    pub region: Option<String>,
    pub country: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    /// "Vancouver, British Columbia", falling back to the country
    pub fn display_name(&self) -> String {
        let area = [self.region.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .find(|area| *area != self.name);
        match area {
            Some(area) => format!("{}, {}", self.name, area),
            None => self.name.clone(),
        }
    }
}

/// Current weather conditions with today's range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Current temperature in the configured unit
    pub temperature: f64,
    pub feels_like: f64,
    pub condition: WeatherCondition,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h or mph
    pub wind: f64,
    /// Today's maximum
    pub high: f64,
    /// Today's minimum
    pub low: f64,
    pub units: Units,
}

impl Weather {
    pub fn temperature_suffix(&self) -> &'static str {
        match self.units {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self.units {
            Units::Metric => "km/h",
            Units::Imperial => "mph",
        }
    }
}

/// Types of weather conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
    Showers,
    Thunderstorm,
    Snow,
    Fog,
}

impl WeatherCondition {
    pub fn description(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::PartlyCloudy => "Partly cloudy",
            WeatherCondition::Cloudy => "Cloudy",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Showers => "Showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Fog => "Fog",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "☀️",
            WeatherCondition::PartlyCloudy => "⛅",
            WeatherCondition::Cloudy => "☁️",
            WeatherCondition::Rain | WeatherCondition::Showers => "🌧️",
            WeatherCondition::Thunderstorm => "⛈️",
            WeatherCondition::Snow => "❄️",
            WeatherCondition::Fog => "🌫️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(region: Option<&str>, country: Option<&str>) -> Location {
        Location {
            name: "Vancouver".to_string(),
            region: region.map(String::from),
            country: country.map(String::from),
            latitude: 49.25,
            longitude: -123.12,
        }
    }

    #[test]
    fn test_display_name_prefers_region() {
        assert_eq!(
            location(Some("British Columbia"), Some("Canada")).display_name(),
            "Vancouver, British Columbia"
        );
        assert_eq!(location(None, Some("Canada")).display_name(), "Vancouver, Canada");
        assert_eq!(location(None, None).display_name(), "Vancouver");
    }

    #[test]
    fn test_weather_survives_cache_serialization() {
        let weather = Weather {
            temperature: 71.2,
            feels_like: 70.0,
            condition: WeatherCondition::Fog,
            humidity: 90,
            wind: 4.0,
            high: 75.0,
            low: 60.5,
            units: Units::Imperial,
        };

        let json = serde_json::to_string(&weather).unwrap();
        let back: Weather = serde_json::from_str(&json).unwrap();

        assert_eq!(back, weather);
        assert_eq!(back.temperature_suffix(), "°F");
    }
}
