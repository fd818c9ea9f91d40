//! Open-Meteo weather API client
//!
//! This module resolves place names through the Open-Meteo geocoding API and
//! fetches current conditions plus today's high/low from the forecast API.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::{Location, Weather, WeatherCondition};
use crate::config::Units;

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),
}

/// Client for the Open-Meteo geocoding and forecast APIs
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    geocoding_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(
        client: Client,
        geocoding_url: impl Into<String>,
        forecast_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            geocoding_url: geocoding_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    /// Resolve a place name to its best match
    ///
    /// Returns `Ok(None)` when the API knows no such place.
    pub async fn geocode(&self, name: &str) -> Result<Option<Location>, WeatherError> {
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("name", name), ("count", "1"), ("language", "en"), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let api_response: GeocodingResponse = serde_json::from_str(&text)?;

        Ok(api_response.results.into_iter().next().map(|place| Location {
            name: place.name,
            region: place.admin1,
            country: place.country,
            latitude: place.latitude,
            longitude: place.longitude,
        }))
    }

    /// Fetch current conditions and today's range for the given coordinates
    pub async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<Weather, WeatherError> {
        let (temperature_unit, wind_speed_unit) = match units {
            Units::Metric => ("celsius", "kmh"),
            Units::Imperial => ("fahrenheit", "mph"),
        };
        let lat = lat.to_string();
        let lon = lon.to_string();

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", lat.as_str()),
                ("longitude", lon.as_str()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m",
                ),
                ("daily", "temperature_2m_max,temperature_2m_min"),
                ("temperature_unit", temperature_unit),
                ("wind_speed_unit", wind_speed_unit),
                ("forecast_days", "1"),
                ("timezone", "auto"),
            ])
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        let api_response: ForecastResponse = serde_json::from_str(&text)?;

        parse_forecast(api_response, units)
    }
}

/// Parse the Open-Meteo forecast response into a Weather struct
fn parse_forecast(response: ForecastResponse, units: Units) -> Result<Weather, WeatherError> {
    let current = response.current;
    let daily = response.daily;

    let high = daily
        .temperature_2m_max
        .first()
        .copied()
        .ok_or_else(|| WeatherError::MissingField("temperature_2m_max".to_string()))?;
    let low = daily
        .temperature_2m_min
        .first()
        .copied()
        .ok_or_else(|| WeatherError::MissingField("temperature_2m_min".to_string()))?;

    Ok(Weather {
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        condition: weather_code_to_condition(current.weather_code),
        humidity: current.relative_humidity_2m.round().clamp(0.0, 100.0) as u8,
        wind: current.wind_speed_10m,
        high,
        low,
        units,
    })
}

/// Map WMO weather code to WeatherCondition enum
///
/// Weather codes from WMO (World Meteorological Organization):
/// - 0: Clear sky
/// - 1-3: Partly cloudy
/// - 45, 48: Fog
/// - 51-55: Drizzle
/// - 56-57: Freezing drizzle
/// - 61-65: Rain
/// - 66-67: Freezing rain
/// - 71-77: Snow
/// - 80-82: Rain showers
/// - 85-86: Snow showers
/// - 95-99: Thunderstorm
pub fn weather_code_to_condition(code: u8) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1..=3 => WeatherCondition::PartlyCloudy,
        45 | 48 => WeatherCondition::Fog,
        51..=55 | 61..=65 => WeatherCondition::Rain,
        56..=57 | 66..=67 | 80..=82 => WeatherCondition::Showers,
        71..=77 | 85..=86 => WeatherCondition::Snow,
        95..=99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Cloudy,
    }
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    /// Absent entirely when nothing matched
    #[serde(default)]
    results: Vec<GeocodingResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    admin1: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Open-Meteo forecast response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
    daily: DailyWeather,
}

/// Current weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: u8,
    wind_speed_10m: f64,
}

/// Daily weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct DailyWeather {
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}
