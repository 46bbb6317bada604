use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

use inkframe::page::{FORECAST_SLOTS, PageBuilder, PageData};
use inkframe::server::{self, DeliveryServer, ServeState};
use inkframe::{
    InkframeConfig, LogRelay, Renderer, StaticMapClient, Units, VERSION, WeatherClient, staticmap,
};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            tracing::error!("Daily update failed: {e:#}");
            std::process::exit(1);
        }
    }
}

/// One daily update run. Returns whether the process should exit 0:
/// delivery succeeded, or the delivery server is disabled entirely.
async fn run() -> Result<bool> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = InkframeConfig::load(config_path)?;
    let tz = config.timezone()?;

    let now = Utc::now().with_timezone(&tz);
    tracing::info!(version = VERSION, %now, "Starting daily homepage update");

    let units = if config.metric_units {
        Units::Metric
    } else {
        Units::Imperial
    };
    let weather = WeatherClient::new(
        config.weather_api_key.clone(),
        units,
        config.icon_dir.clone(),
        config.debug_fixtures.clone(),
    );

    let location = weather.resolve_location(&config.location).await?;
    tracing::info!(
        name = %location.name,
        latitude = location.latitude,
        longitude = location.longitude,
        "Location resolved"
    );

    let current = weather.current_forecast(&location).await?;
    let hourly = weather.three_hour_forecast(&location, FORECAST_SLOTS).await?;

    let maps = StaticMapClient::new(
        config.maps_api_key.clone(),
        config.map_id.clone(),
        config.map_cache,
    );
    let map_url = maps.image_url(&location, staticmap::DEFAULT_ZOOM);

    let builder = PageBuilder::new(config.layout, config.output_dir.clone());
    let data = PageData {
        now,
        week_start_day: config.week_start_day,
        current: &current,
        hourly: &hourly,
        map_url: &map_url,
    };
    let html_path = builder.write(&data).await?;

    let renderer = Renderer::discover(
        config.image_width,
        config.image_height,
        config.rotate_angle,
        config.output_dir.clone(),
    )?;
    renderer.render(&html_path, builder.page_name()).await?;
    tracing::info!("Completed daily homepage update");

    if !config.server.enable {
        tracing::info!("Delivery server disabled, exiting");
        return Ok(true);
    }

    let relay = config.mqtt.enable.then(|| LogRelay::start(&config.mqtt));

    let serve_state = ServeState::new(
        config.server.serve_policy,
        config.server.client_user_agent.clone(),
    );
    let app = server::router(
        serve_state.clone(),
        builder.page_name(),
        config.output_dir.clone(),
    );
    let delivery = DeliveryServer::start(config.server.port, app).await?;

    tracing::info!(
        seconds = config.server.alive_seconds,
        max_serves = config.server.max_serves,
        "Waiting to serve display client before shutdown"
    );
    let delivered = server::await_delivery(
        &serve_state,
        Duration::from_secs(config.server.alive_seconds),
        config.server.max_serves,
    )
    .await;

    // let an in-flight transfer drain before the socket closes
    tokio::time::sleep(server::GRACE_PERIOD).await;
    delivery.shutdown().await;
    if let Some(relay) = relay {
        relay.stop().await;
    }

    if delivered {
        tracing::info!("Served display client, shutting down");
    }
    Ok(delivered)
}
