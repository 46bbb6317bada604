//! `inkframe` - daily smart-homepage image generation for e-ink displays
//!
//! This library provides the building blocks of the daily update run:
//! weather and static-map clients, the page template builder, the
//! headless-browser render pipeline, and the time-bounded delivery server
//! the display client fetches the finished image from.

pub mod calendar;
pub mod config;
pub mod error;
pub mod logrelay;
pub mod models;
pub mod page;
pub mod render;
pub mod server;
pub mod staticmap;
pub mod weather;

// Re-export core types for public API
pub use config::{InkframeConfig, Layout, ServePolicy};
pub use error::InkframeError;
pub use logrelay::LogRelay;
pub use models::{Forecast, Location};
pub use page::{PageBuilder, PageData};
pub use render::{RenderedPage, Renderer};
pub use server::{DeliveryServer, ServeState};
pub use staticmap::StaticMapClient;
pub use weather::{Units, WeatherClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
