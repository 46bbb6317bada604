//! Weather forecast model embedded into the rendered page

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature readings with their display unit
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Temperature {
    /// Measured temperature, rounded to whole degrees
    pub real: i32,
    /// Apparent temperature
    pub feels_like: i32,
    /// Daily high
    pub high: i32,
    /// Daily low
    pub low: i32,
    /// Display unit ("°C" or "°F")
    pub unit: String,
}

impl Temperature {
    /// Format as e.g. "21°C"
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{}", self.real, self.unit)
    }
}

/// Wind reading with its display unit
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Wind {
    /// Wind speed, rounded
    pub speed: i32,
    /// Display unit ("kmh" or "mph")
    pub unit: String,
}

/// Reference to a weather condition icon. Locally cached assets are
/// preferred; the provider's hosted icon is the fallback.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum IconRef {
    /// Absolute path to a cached icon file
    Local(PathBuf),
    /// Provider-hosted icon URL
    Remote(String),
}

impl IconRef {
    /// Value usable as an HTML `src` attribute. Local paths become
    /// `file://` URLs because the page itself is loaded from `file://`.
    #[must_use]
    pub fn src(&self) -> String {
        match self {
            IconRef::Local(path) => format!("file://{}", path.display()),
            IconRef::Remote(url) => url.clone(),
        }
    }
}

/// A structured weather snapshot for a point in time. Both the "current"
/// observation and each entry of the 3-hourly forecast sequence use this
/// shape; fields the provider only reports on one endpoint are optional.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Forecast {
    /// Timestamp of the observation/forecast slot (UTC)
    pub timestamp: DateTime<Utc>,
    pub temperature: Temperature,
    pub wind: Wind,
    /// Relative humidity, 0-100
    pub humidity_percent: u8,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: u32,
    /// Cloud cover, 0-100
    pub clouds_percent: u8,
    /// Precipitation probability, 0-100 (forecast endpoint only)
    pub precipitation_percent: Option<u8>,
    /// Sunrise (current-weather endpoint only)
    pub sunrise: Option<DateTime<Utc>>,
    /// Sunset (current-weather endpoint only)
    pub sunset: Option<DateTime<Utc>>,
    /// Condition icon
    pub icon: IconRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_display() {
        let temp = Temperature {
            real: 21,
            feels_like: 19,
            high: 23,
            low: 12,
            unit: "°C".to_string(),
        };
        assert_eq!(temp.display(), "21°C");
    }

    #[test]
    fn test_icon_src() {
        let local = IconRef::Local(PathBuf::from("/var/lib/inkframe/icons/10d.png"));
        assert_eq!(local.src(), "file:///var/lib/inkframe/icons/10d.png");

        let remote = IconRef::Remote("https://openweathermap.org/img/wn/10d@4x.png".to_string());
        assert_eq!(remote.src(), "https://openweathermap.org/img/wn/10d@4x.png");
    }
}
