//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// A geocoded location. Immutable once resolved; the whole run uses the
/// coordinates produced by the single startup geocoding call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, region, etc.)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(latitude: f64, longitude: f64, name: String, country: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: Some(country),
        }
    }

    /// Format location as a "lat,lon" center string for map URLs
    #[must_use]
    pub fn center_string(&self) -> String {
        format!("{:.4},{:.4}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_string() {
        let location = Location::new(53.3498, -6.2603, "Dublin".to_string());
        assert_eq!(location.center_string(), "53.3498,-6.2603");
    }

    #[test]
    fn test_with_country() {
        let location =
            Location::with_country(53.3498, -6.2603, "Dublin".to_string(), "IE".to_string());
        assert_eq!(location.country.as_deref(), Some("IE"));
    }
}
