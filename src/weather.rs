//! Weather provider client
//!
//! Talks to an OpenWeatherMap-shaped API: one geocoding call at startup to
//! resolve the configured location string, then a current-weather call and a
//! 3-hourly forecast call per run. Every call is attempted exactly once.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;

use crate::InkframeError;
use crate::models::{Forecast, IconRef, Location};

const BASE_URL: &str = "https://api.openweathermap.org";

/// Unit system for temperatures and wind speeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    /// Value of the provider's `units` query parameter
    #[must_use]
    pub fn query(self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    /// Degree unit shown on the page
    #[must_use]
    pub fn degrees(self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    /// Wind speed unit shown on the page
    #[must_use]
    pub fn speed(self) -> &'static str {
        match self {
            Units::Metric => "kmh",
            Units::Imperial => "mph",
        }
    }
}

/// Client for the weather provider
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    api_key: String,
    units: Units,
    icon_dir: PathBuf,
    fixture_dir: Option<PathBuf>,
}

impl WeatherClient {
    #[must_use]
    pub fn new(
        api_key: String,
        units: Units,
        icon_dir: PathBuf,
        fixture_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_key,
            units,
            icon_dir,
            fixture_dir,
        }
    }

    /// Resolve a human-entered location string to coordinates.
    ///
    /// Fails unless the provider returns exactly one match; the same input
    /// always resolves to the same coordinates. In fixture mode no call is
    /// made and a zero-coordinate placeholder is returned.
    pub async fn resolve_location(&self, query: &str) -> Result<Location> {
        if self.fixture_dir.is_some() {
            return Ok(Location::new(0.0, 0.0, query.to_string()));
        }

        let url = format!(
            "{}/geo/1.0/direct?q={}&limit=2&appid={}",
            BASE_URL,
            urlencoding::encode(query),
            self.api_key
        );

        let response = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send geocoding request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                InkframeError::geocode(format!("Geocoding request failed with {status}")).into(),
            );
        }

        let results: Vec<openweather::GeoEntry> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        openweather::location_from_geo(results, query)
    }

    /// Current weather snapshot for a resolved location
    pub async fn current_forecast(&self, location: &Location) -> Result<Forecast> {
        let data: openweather::CurrentResponse = if let Some(dir) = &self.fixture_dir {
            read_fixture(&dir.join("current.json")).await?
        } else {
            let url = format!(
                "{}/data/2.5/weather?lat={}&lon={}&appid={}&units={}",
                BASE_URL,
                location.latitude,
                location.longitude,
                self.api_key,
                self.units.query()
            );
            self.fetch_json(&url, "current weather").await?
        };

        let icon = self.resolve_icon(data.primary_icon());
        Ok(data.into_forecast(self.units, icon))
    }

    /// The next `count` 3-hourly forecast slots for a resolved location.
    ///
    /// Fails with a data error when the payload's embedded status code is
    /// not success, regardless of the HTTP transport status.
    pub async fn three_hour_forecast(
        &self,
        location: &Location,
        count: u32,
    ) -> Result<Vec<Forecast>> {
        let data: openweather::ForecastResponse = if let Some(dir) = &self.fixture_dir {
            read_fixture(&dir.join("forecast.json")).await?
        } else {
            let url = format!(
                "{}/data/2.5/forecast?cnt={}&lat={}&lon={}&appid={}&units={}",
                BASE_URL,
                count,
                location.latitude,
                location.longitude,
                self.api_key,
                self.units.query()
            );
            self.fetch_json(&url, "3-hourly forecast").await?
        };

        openweather::ensure_payload_success(&data.cod)?;

        let forecasts = data
            .list
            .into_iter()
            .map(|entry| {
                let icon = self.resolve_icon(entry.primary_icon());
                entry.into_forecast(self.units, icon)
            })
            .collect();
        Ok(forecasts)
    }

    /// Prefer a locally cached icon asset, fall back to the hosted one
    fn resolve_icon(&self, icon_id: &str) -> IconRef {
        let local = self.icon_dir.join(format!("{icon_id}.png"));
        if local.exists() {
            let absolute = std::path::absolute(&local).unwrap_or(local);
            IconRef::Local(absolute)
        } else {
            IconRef::Remote(format!(
                "https://openweathermap.org/img/wn/{icon_id}@4x.png"
            ))
        }
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send {what} request"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InkframeError::weather_api(format!(
                "{what} request failed with {status}"
            ))
            .into());
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse {what} response"))
    }
}

async fn read_fixture<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read weather fixture {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse weather fixture {}", path.display()))
}

/// Provider response structures and conversion into internal models
mod openweather {
    use anyhow::Result;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;

    use super::Units;
    use crate::InkframeError;
    use crate::models::{Forecast, IconRef, Location, Temperature, Wind};

    #[derive(Debug, Deserialize)]
    pub struct GeoEntry {
        pub name: String,
        pub lat: f64,
        pub lon: f64,
        pub country: Option<String>,
    }

    /// Apply the exactly-one-match rule to a geocoding response
    pub fn location_from_geo(results: Vec<GeoEntry>, query: &str) -> Result<Location> {
        match results.len() {
            1 => {
                let entry = results.into_iter().next().expect("checked length");
                let mut location = Location::new(entry.lat, entry.lon, entry.name);
                location.country = entry.country;
                Ok(location)
            }
            0 => Err(InkframeError::geocode(format!("No geocoding match for '{query}'")).into()),
            n => Err(InkframeError::geocode(format!(
                "Ambiguous geocoding result for '{query}': {n} matches"
            ))
            .into()),
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct MainData {
        pub temp: f64,
        pub feels_like: f64,
        pub temp_min: f64,
        pub temp_max: f64,
        pub humidity: u8,
        pub pressure: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct WindData {
        pub speed: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct CloudsData {
        pub all: u8,
    }

    #[derive(Debug, Deserialize)]
    pub struct ConditionData {
        pub icon: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct SysData {
        pub sunrise: i64,
        pub sunset: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub dt: i64,
        pub main: MainData,
        pub wind: WindData,
        pub clouds: CloudsData,
        pub weather: Vec<ConditionData>,
        pub sys: SysData,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastEntry {
        pub dt: i64,
        pub main: MainData,
        pub wind: WindData,
        pub clouds: CloudsData,
        pub weather: Vec<ConditionData>,
        /// Precipitation probability, 0.0-1.0
        #[serde(default)]
        pub pop: f64,
    }

    /// 3-hourly forecast payload; `cod` is the provider's embedded status
    /// code, a string on this endpoint
    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub cod: String,
        pub list: Vec<ForecastEntry>,
    }

    /// The forecast endpoint embeds its own status code in the payload;
    /// anything but 200 is a data error even on a 200 transport response
    pub fn ensure_payload_success(cod: &str) -> Result<()> {
        if cod.parse::<u32>().unwrap_or(0) == 200 {
            Ok(())
        } else {
            Err(InkframeError::weather_api(format!(
                "Non-success status in forecast payload: {cod}"
            ))
            .into())
        }
    }

    fn timestamp(unix: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(unix, 0).unwrap_or_else(Utc::now)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn round(value: f64) -> i32 {
        value.round() as i32
    }

    impl CurrentResponse {
        pub fn primary_icon(&self) -> &str {
            self.weather.first().map_or("01d", |w| w.icon.as_str())
        }

        pub fn into_forecast(self, units: Units, icon: IconRef) -> Forecast {
            Forecast {
                timestamp: timestamp(self.dt),
                temperature: Temperature {
                    real: round(self.main.temp),
                    feels_like: round(self.main.feels_like),
                    high: round(self.main.temp_max),
                    low: round(self.main.temp_min),
                    unit: units.degrees().to_string(),
                },
                wind: Wind {
                    speed: round(self.wind.speed),
                    unit: units.speed().to_string(),
                },
                humidity_percent: self.main.humidity,
                pressure_hpa: round(self.main.pressure).max(0) as u32,
                clouds_percent: self.clouds.all,
                precipitation_percent: None,
                sunrise: Some(timestamp(self.sys.sunrise)),
                sunset: Some(timestamp(self.sys.sunset)),
                icon,
            }
        }
    }

    impl ForecastEntry {
        pub fn primary_icon(&self) -> &str {
            self.weather.first().map_or("01d", |w| w.icon.as_str())
        }

        pub fn into_forecast(self, units: Units, icon: IconRef) -> Forecast {
            Forecast {
                timestamp: timestamp(self.dt),
                temperature: Temperature {
                    real: round(self.main.temp),
                    feels_like: round(self.main.feels_like),
                    high: round(self.main.temp_max),
                    low: round(self.main.temp_min),
                    unit: units.degrees().to_string(),
                },
                wind: Wind {
                    speed: round(self.wind.speed),
                    unit: units.speed().to_string(),
                },
                humidity_percent: self.main.humidity,
                pressure_hpa: round(self.main.pressure).max(0) as u32,
                clouds_percent: self.clouds.all,
                precipitation_percent: Some(round(self.pop * 100.0).clamp(0, 100) as u8),
                sunrise: None,
                sunset: None,
                icon,
            }
        }
    }
}
