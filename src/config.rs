//! Configuration management for the inkframe application
//!
//! Loads the JSON configuration file, applies defaults for optional keys,
//! and validates all settings before the run starts. Missing required keys
//! and out-of-range values are fatal at startup.

use crate::InkframeError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Page layout produced by the template builder.
///
/// One parameterized builder covers both display styles; the layout is a
/// configuration choice, not a separate program.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Month banner, 5-week calendar grid and hourly forecast strip
    #[default]
    Homepage,
    /// Date/temperature banner, static map pane and hourly forecast table
    Calendar,
}

impl Layout {
    /// Page (and output file) base name for this layout
    #[must_use]
    pub fn page_name(self) -> &'static str {
        match self {
            Layout::Homepage => "homepage",
            Layout::Calendar => "calendar",
        }
    }
}

/// When a request on the image route counts as a successful serve.
///
/// Earlier device firmwares identified themselves via `User-Agent`; later
/// ones did not, so both behaviors are recognized configuration choices.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ServePolicy {
    /// Every request on the image route marks the image as served
    #[default]
    Any,
    /// Only requests whose `User-Agent` contains `clientUserAgent`
    UserAgent,
}

/// Delivery server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Whether to serve the rendered image at all; when false the process
    /// exits 0 right after rendering
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Wall-clock delivery budget in seconds
    #[serde(default = "default_alive_seconds")]
    pub alive_seconds: u64,
    /// Shut down once this many requests have been counted as served
    #[serde(default = "default_max_serves")]
    pub max_serves: u32,
    /// What counts as a serve (see [`ServePolicy`])
    #[serde(default)]
    pub serve_policy: ServePolicy,
    /// Substring matched against `User-Agent` under the `userAgent` policy
    #[serde(default = "default_client_user_agent")]
    pub client_user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable: default_true(),
            port: default_port(),
            alive_seconds: default_alive_seconds(),
            max_serves: default_max_serves(),
            serve_policy: ServePolicy::default(),
            client_user_agent: default_client_user_agent(),
        }
    }
}

/// Client-log listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttConfig {
    /// Whether to relay remote client logs at all
    #[serde(default)]
    pub enable: bool,
    /// Broker host
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    /// Topic the display client publishes its log lines on
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            enable: false,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
        }
    }
}

/// Root configuration structure for the inkframe application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InkframeConfig {
    /// IANA timezone all date arithmetic is performed in
    pub display_timezone: String,
    /// First day of the calendar week: 0 = Monday … 6 = Sunday
    #[serde(default)]
    pub week_start_day: u8,
    /// Target display width in pixels
    pub image_width: u32,
    /// Target display height in pixels
    pub image_height: u32,
    /// Rotation applied to the BMP derivative: 0, 90, 180 or 270
    #[serde(default)]
    pub rotate_angle: u32,
    /// Human-entered location, geocoded once at startup
    pub location: String,
    /// Metric (°C, kmh) vs imperial (°F, mph) units
    #[serde(default = "default_true")]
    pub metric_units: bool,
    /// Weather provider API key
    pub weather_api_key: String,
    /// Static-map provider API key
    pub maps_api_key: String,
    /// Static-map style id
    pub map_id: String,
    /// When false, a cache-busting timestamp is appended to the map URL
    #[serde(default = "default_true")]
    pub map_cache: bool,
    /// Page layout to render
    #[serde(default)]
    pub layout: Layout,
    /// Directory receiving the generated html/png/bmp files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Directory of locally cached weather icons, keyed by provider icon id
    #[serde(default = "default_icon_dir")]
    pub icon_dir: PathBuf,
    /// Directory of canned weather JSON responses; set for offline template
    /// work, unset for normal operation
    #[serde(default)]
    pub debug_fixtures: Option<PathBuf>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

fn default_alive_seconds() -> u64 {
    300
}

fn default_max_serves() -> u32 {
    1
}

fn default_client_user_agent() -> String {
    "esp32".to_string()
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "inkframe/client/log".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_icon_dir() -> PathBuf {
    PathBuf::from("assets/icons")
}

impl InkframeConfig {
    /// Load configuration from the given path, falling back to the
    /// `INKFRAME_CONFIG` environment variable and then `config.json`
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let path = path
            .or_else(|| std::env::var("INKFRAME_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("config.json"));
        Self::load_from_path(&path)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: InkframeConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_keys()?;
        self.validate_ranges()?;
        Ok(())
    }

    /// Parse the configured display timezone
    pub fn timezone(&self) -> Result<Tz> {
        self.display_timezone.parse::<Tz>().map_err(|_| {
            InkframeError::config(format!(
                "Unknown display timezone: {}",
                self.display_timezone
            ))
            .into()
        })
    }

    fn validate_keys(&self) -> Result<()> {
        if self.location.trim().is_empty() {
            return Err(InkframeError::config("location must not be empty").into());
        }
        if self.weather_api_key.trim().is_empty() {
            return Err(InkframeError::config("weatherApiKey must not be empty").into());
        }
        if self.maps_api_key.trim().is_empty() {
            return Err(InkframeError::config("mapsApiKey must not be empty").into());
        }
        if self.map_id.trim().is_empty() {
            return Err(InkframeError::config("mapId must not be empty").into());
        }
        self.timezone().map(|_| ())
    }

    fn validate_ranges(&self) -> Result<()> {
        if self.week_start_day > 6 {
            return Err(InkframeError::config(format!(
                "weekStartDay must be 0 (Monday) through 6 (Sunday), got {}",
                self.week_start_day
            ))
            .into());
        }
        if !matches!(self.rotate_angle, 0 | 90 | 180 | 270) {
            return Err(InkframeError::config(format!(
                "rotateAngle must be one of 0, 90, 180, 270, got {}",
                self.rotate_angle
            ))
            .into());
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(InkframeError::config("imageWidth and imageHeight must be non-zero").into());
        }
        if self.server.max_serves == 0 {
            return Err(InkframeError::config("server.maxServes must be at least 1").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_json() -> &'static str {
        r#"{
            "displayTimezone": "Europe/Dublin",
            "imageWidth": 800,
            "imageHeight": 480,
            "location": "Dublin",
            "weatherApiKey": "w-key",
            "mapsApiKey": "m-key",
            "mapId": "style-1"
        }"#
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config: InkframeConfig = serde_json::from_str(minimal_json()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.week_start_day, 0);
        assert_eq!(config.rotate_angle, 0);
        assert!(config.metric_units);
        assert!(config.map_cache);
        assert_eq!(config.layout, Layout::Homepage);
        assert!(config.server.enable);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_serves, 1);
        assert_eq!(config.server.serve_policy, ServePolicy::Any);
        assert!(!config.mqtt.enable);
        assert_eq!(config.mqtt.port, 1883);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "displayTimezone": "Europe/Dublin",
            "weekStartDay": 6,
            "imageWidth": 480,
            "imageHeight": 800,
            "rotateAngle": 90,
            "location": "Dublin",
            "metricUnits": false,
            "weatherApiKey": "w-key",
            "mapsApiKey": "m-key",
            "mapId": "style-1",
            "mapCache": false,
            "layout": "calendar",
            "server": {
                "enable": true,
                "port": 9000,
                "aliveSeconds": 120,
                "maxServes": 3,
                "servePolicy": "userAgent",
                "clientUserAgent": "esp32-homepage"
            },
            "mqtt": {
                "enable": true,
                "host": "broker.local",
                "port": 1884,
                "topic": "display/log"
            }
        }"#;
        let config: InkframeConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();

        assert_eq!(config.layout, Layout::Calendar);
        assert_eq!(config.layout.page_name(), "calendar");
        assert_eq!(config.server.serve_policy, ServePolicy::UserAgent);
        assert_eq!(config.server.client_user_agent, "esp32-homepage");
        assert_eq!(config.mqtt.topic, "display/log");
    }

    #[test]
    fn test_missing_required_key_fails() {
        let json = r#"{
            "displayTimezone": "Europe/Dublin",
            "imageWidth": 800,
            "imageHeight": 480,
            "location": "Dublin"
        }"#;
        assert!(serde_json::from_str::<InkframeConfig>(json).is_err());
    }

    #[test]
    fn test_bad_week_start_day_rejected() {
        let mut config: InkframeConfig = serde_json::from_str(minimal_json()).unwrap();
        config.week_start_day = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_rotate_angle_rejected() {
        let mut config: InkframeConfig = serde_json::from_str(minimal_json()).unwrap();
        config.rotate_angle = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let mut config: InkframeConfig = serde_json::from_str(minimal_json()).unwrap();
        config.display_timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_serves_rejected() {
        let mut config: InkframeConfig = serde_json::from_str(minimal_json()).unwrap();
        config.server.max_serves = 0;
        assert!(config.validate().is_err());
    }
}
