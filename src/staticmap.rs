//! Static map image URL construction
//!
//! Pure string construction; no request is made here. The URL is embedded
//! in the page and fetched by the browser during rendering.

use chrono::Utc;

use crate::models::Location;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/staticmap";

/// Default map zoom level
pub const DEFAULT_ZOOM: u8 = 10;

/// Requested map tile size in CSS pixels; rendered at 2x scale
const MAP_WIDTH: u32 = 600;
const MAP_HEIGHT: u32 = 600;
const SCALE: u32 = 2;

/// Builds pre-rendered map image URLs for a keyed static-map API
#[derive(Debug, Clone)]
pub struct StaticMapClient {
    api_key: String,
    map_id: String,
    cache: bool,
}

impl StaticMapClient {
    #[must_use]
    pub fn new(api_key: String, map_id: String, cache: bool) -> Self {
        Self {
            api_key,
            map_id,
            cache,
        }
    }

    /// Fully-formed image URL centered on `location`.
    ///
    /// With caching disabled a `time=<unix>` parameter is appended so the
    /// browser fetches a fresh tile on every run.
    #[must_use]
    pub fn image_url(&self, location: &Location, zoom: u8) -> String {
        let no_cache_param = if self.cache {
            String::new()
        } else {
            format!("&time={}", Utc::now().timestamp())
        };

        format!(
            "{}?center={}&zoom={}&size={}x{}&key={}&map_id={}&scale={}&sensor=false{}",
            BASE_URL,
            urlencoding::encode(&location.center_string()),
            zoom,
            MAP_WIDTH,
            MAP_HEIGHT,
            self.api_key,
            self.map_id,
            SCALE,
            no_cache_param,
        )
    }
}
