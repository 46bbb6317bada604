//! Data models for the inkframe application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Forecast: Weather snapshots embedded into the rendered page

pub mod forecast;
pub mod location;

// Re-export all public types for convenient access
pub use forecast::{Forecast, IconRef, Temperature, Wind};
pub use location::Location;
