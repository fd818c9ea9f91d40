//! Current weather for the configured location

use async_trait::async_trait;
use reqwest::Client;

use super::{failed_line, not_configured, Module, ModuleError};
use crate::cache::CacheManager;
use crate::color::{Colorizer, Tone};
use crate::config::{non_empty, Config};
use crate::data::{Location, Weather, WeatherClient};

#[derive(Debug, Clone, PartialEq)]
enum WeatherState {
    /// No location in the config
    Unconfigured,
    /// Geocoding found nothing (or failed) for this name
    Unresolved(String),
    Resolved(Location),
}

pub struct WeatherModule {
    http: Client,
    cache: CacheManager,
    state: WeatherState,
}

impl WeatherModule {
    pub fn new(http: Client, cache: CacheManager) -> Self {
        Self {
            http,
            cache,
            state: WeatherState::Unconfigured,
        }
    }

    fn client(&self, config: &Config) -> WeatherClient {
        WeatherClient::new(
            self.http.clone(),
            &config.weather.geocoding_url,
            &config.weather.forecast_url,
        )
    }
}

#[async_trait]
impl Module for WeatherModule {
    fn name(&self) -> &str {
        "weather"
    }

    async fn setup(&mut self, config: &Config) -> Result<(), ModuleError> {
        let Some(place) = non_empty(&config.weather.location) else {
            tracing::warn!("weather.location is not set, weather module disabled");
            self.state = WeatherState::Unconfigured;
            return Ok(());
        };

        let client = self.client(config);
        let key = format!("weather_geocode_{}", place.to_lowercase());
        let resolved = self
            .cache
            .request_with_cache(&key, config.cache.geocode(), || async {
                client.geocode(place).await
            })
            .await;

        self.state = match resolved {
            Ok(Some(location)) => {
                tracing::debug!(place, lat = location.latitude, lon = location.longitude, "resolved location");
                WeatherState::Resolved(location)
            }
            Ok(None) => {
                tracing::warn!(place, "geocoding found no matching location");
                WeatherState::Unresolved(place.to_string())
            }
            Err(e) => {
                tracing::warn!(place, error = %e, "failed to geocode location");
                WeatherState::Unresolved(place.to_string())
            }
        };
        Ok(())
    }

    async fn display(&self, config: &Config) -> Result<String, ModuleError> {
        let colors = Colorizer::from_config(config.display.colors);

        let location = match &self.state {
            WeatherState::Unconfigured => {
                return Ok(not_configured(&colors, "Weather", "set weather.location"));
            }
            WeatherState::Unresolved(place) => {
                return Ok(format!(
                    "{}: {}",
                    colors.paint(Tone::Title, "Weather"),
                    colors.paint(Tone::Warn, format!("could not find location \"{}\"", place)),
                ));
            }
            WeatherState::Resolved(location) => location,
        };

        let units = config.weather.units;
        let key = format!(
            "weather_current_{:.2}_{:.2}_{}",
            location.latitude,
            location.longitude,
            units.as_str()
        );
        let client = self.client(config);
        let fetched = self
            .cache
            .request_with_cache(&key, config.cache.weather(), || async {
                client
                    .fetch_weather(location.latitude, location.longitude, units)
                    .await
            })
            .await;

        let heading = format!(
            "{} {}",
            colors.paint(Tone::Title, "Weather in"),
            colors.paint(Tone::Accent, location.display_name())
        );
        let body = match fetched {
            Ok(weather) => render_conditions(&weather, &colors),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch weather");
                failed_line(&colors, "Conditions")
            }
        };
        Ok(format!("{}\n{}", heading, body))
    }
}

fn render_conditions(weather: &Weather, colors: &Colorizer) -> String {
    let deg = weather.temperature_suffix();
    format!(
        "  {} {}, {}{} (feels like {:.0}{})\n  {}",
        weather.condition.icon(),
        weather.condition.description(),
        colors.paint(Tone::Accent, format!("{:.0}", weather.temperature)),
        deg,
        weather.feels_like,
        deg,
        colors.paint(
            Tone::Muted,
            format!(
                "High {:.0}{} / Low {:.0}{} · Humidity {}% · Wind {:.0} {}",
                weather.high,
                deg,
                weather.low,
                deg,
                weather.humidity,
                weather.wind,
                weather.wind_suffix()
            )
        ),
    )
}
