//! Error types and handling for the `inkframe` application

use thiserror::Error;

/// Main error type for the `inkframe` application
#[derive(Error, Debug)]
pub enum InkframeError {
    /// Configuration-related errors (missing keys, bad ranges)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Geocoding produced zero or more than one match
    #[error("Geocoding error: {message}")]
    Geocode { message: String },

    /// Weather API returned a malformed or non-success payload
    #[error("Weather API error: {message}")]
    WeatherApi { message: String },

    /// Rendering errors (no usable browser, screenshot missing)
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl InkframeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new geocoding error
    pub fn geocode<S: Into<String>>(message: S) -> Self {
        Self::Geocode {
            message: message.into(),
        }
    }

    /// Create a new weather API error
    pub fn weather_api<S: Into<String>>(message: S) -> Self {
        Self::WeatherApi {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = InkframeError::config("missing API key");
        assert!(matches!(config_err, InkframeError::Config { .. }));

        let geocode_err = InkframeError::geocode("no match");
        assert!(matches!(geocode_err, InkframeError::Geocode { .. }));

        let api_err = InkframeError::weather_api("cod 401");
        assert!(matches!(api_err, InkframeError::WeatherApi { .. }));

        let render_err = InkframeError::render("no browser binary");
        assert!(matches!(render_err, InkframeError::Render { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = InkframeError::weather_api("cod 401");
        assert!(err.to_string().contains("Weather API error"));
        assert!(err.to_string().contains("cod 401"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let ink_err: InkframeError = io_err.into();
        assert!(matches!(ink_err, InkframeError::Io { .. }));
    }
}
