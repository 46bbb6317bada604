//! Page template builder
//!
//! One parameterized builder produces both display styles from the same
//! pre-fetched inputs. All data is resolved by the caller; nothing here
//! touches the network. The document is self-contained apart from the icon
//! and map image references the browser fetches while rendering.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;

use crate::calendar::{self, MonthWindow};
use crate::config::Layout;
use crate::models::Forecast;

/// Number of 3-hourly forecast slots shown on either layout
pub const FORECAST_SLOTS: u32 = 5;

/// Everything a layout needs, resolved by the orchestrator
#[derive(Debug)]
pub struct PageData<'a> {
    /// "Now" in the display timezone
    pub now: DateTime<Tz>,
    /// First day of the calendar week, 0 = Monday … 6 = Sunday
    pub week_start_day: u8,
    /// Current weather snapshot
    pub current: &'a Forecast,
    /// Near-term 3-hourly forecasts, provider order
    pub hourly: &'a [Forecast],
    /// Static map image URL (used by the calendar layout)
    pub map_url: &'a str,
}

/// Builds the HTML document for the configured layout
#[derive(Debug, Clone)]
pub struct PageBuilder {
    layout: Layout,
    output_dir: PathBuf,
}

impl PageBuilder {
    #[must_use]
    pub fn new(layout: Layout, output_dir: PathBuf) -> Self {
        Self { layout, output_dir }
    }

    /// Base name of the generated files (`<name>.html`, `<name>.png`, …)
    #[must_use]
    pub fn page_name(&self) -> &'static str {
        self.layout.page_name()
    }

    /// Path the HTML document is written to
    #[must_use]
    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.html", self.page_name()))
    }

    /// Assemble the full document for this builder's layout
    #[must_use]
    pub fn build(&self, data: &PageData) -> String {
        let body = match self.layout {
            Layout::Homepage => homepage_body(data),
            Layout::Calendar => calendar_body(data),
        };

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n\
             <meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{}</title>\n<style>\n{}</style>\n</head>\n\
             <body>\n{}</body>\n</html>\n",
            self.page_name(),
            STYLES,
            body
        )
    }

    /// Build the document and write it to `<output_dir>/<name>.html`,
    /// silently overwriting last run's file
    pub async fn write(&self, data: &PageData<'_>) -> Result<PathBuf> {
        let path = self.html_path();
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    self.output_dir.display()
                )
            })?;

        let html = self.build(data);
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("Failed to write page to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Page written");
        Ok(path)
    }
}

const STYLES: &str = "\
body { margin: 0; font-family: 'Helvetica Neue', Arial, sans-serif; background: #fff; color: #000; }\n\
.banner { display: flex; align-items: center; justify-content: space-between; padding: 12px 24px; }\n\
.numcircle { width: 72px; height: 72px; border-radius: 50%; border: 3px solid #000;\n\
  display: flex; align-items: center; justify-content: center; font-size: 34px; margin: 0; }\n\
.month { font-size: 30px; text-transform: uppercase; letter-spacing: 2px; margin: 0; }\n\
.icon img { width: 72px; height: 72px; }\n\
#map-container { text-align: center; }\n\
#map-container img { width: 600px; height: 600px; }\n\
table.forecasts { width: 100%; border-collapse: collapse; text-align: center; }\n\
table.forecasts td { padding: 4px; }\n\
.fc-icon img { width: 48px; height: 48px; }\n\
.fc-stat { font-size: 18px; }\n\
table.grid { width: 100%; border-collapse: collapse; table-layout: fixed; text-align: center; }\n\
table.grid th { text-transform: uppercase; font-size: 16px; padding: 6px 0; border-bottom: 2px solid #000; }\n\
table.grid td { height: 56px; font-size: 20px; border: 1px solid #ccc; vertical-align: top; }\n\
td.other-month { color: #999; }\n\
td.today { font-weight: bold; border: 3px solid #000; }\n";

/// Hour label such as "3pm"; lowercase to match the display typography
fn hour_label(forecast: &Forecast, tz: Tz) -> String {
    let local = forecast.timestamp.with_timezone(&tz);
    let hour12 = local.hour12();
    let meridiem = if hour12.0 { "pm" } else { "am" };
    format!("{}{}", hour12.1, meridiem)
}

/// Hourly strip shared by both layouts: hour row, icon row, temperature
/// row and precipitation row
fn forecast_table(data: &PageData) -> String {
    let tz = data.now.timezone();
    let mut hours = String::new();
    let mut icons = String::new();
    let mut temps = String::new();
    let mut precip = String::new();

    for forecast in data.hourly {
        hours.push_str(&format!("<td class=\"hour\">{}</td>", hour_label(forecast, tz)));
        icons.push_str(&format!(
            "<td><div class=\"fc-icon\"><img src=\"{}\"></div></td>",
            forecast.icon.src()
        ));
        temps.push_str(&format!(
            "<td><div class=\"fc-stat\">{}</div></td>",
            forecast.temperature.display()
        ));
        precip.push_str(&format!(
            "<td><div class=\"fc-stat\">{}%</div></td>",
            forecast.precipitation_percent.unwrap_or(0)
        ));
    }

    format!(
        "<table class=\"forecasts\">\n\
         <thead><tr>{hours}</tr></thead>\n\
         <tbody>\n<tr>{icons}</tr>\n<tr>{temps}</tr>\n<tr>{precip}</tr>\n</tbody>\n\
         </table>\n"
    )
}

/// 5-week grid with the current month emphasized and today highlighted
fn calendar_grid(data: &PageData, window: &MonthWindow) -> String {
    let today = data.now.date_naive();
    let mut out = String::from("<table class=\"grid\">\n<thead><tr>");
    for header in calendar::day_headers(data.week_start_day) {
        out.push_str(&format!("<th>{header}</th>"));
    }
    out.push_str("</tr></thead>\n<tbody>\n");

    for week in window.weeks() {
        out.push_str("<tr>");
        for day in week {
            let mut classes = Vec::new();
            if day.month() != today.month() {
                classes.push("other-month");
            }
            if day == today {
                classes.push("today");
            }
            if classes.is_empty() {
                out.push_str(&format!("<td>{}</td>", day.day()));
            } else {
                out.push_str(&format!("<td class=\"{}\">{}</td>", classes.join(" "), day.day()));
            }
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</tbody>\n</table>\n");
    out
}

fn homepage_body(data: &PageData) -> String {
    let window = calendar::month_window(data.now.date_naive(), data.week_start_day);

    format!(
        "<div class=\"banner\">\n\
         <h3 id=\"date\" class=\"numcircle\">{day}</h3>\n\
         <h3 id=\"month\" class=\"month\">{month}</h3>\n\
         <h4 id=\"temp\" class=\"numcircle\">{temp}</h4>\n\
         <div id=\"icon-container\" class=\"icon\"><img src=\"{icon}\"></div>\n\
         </div>\n\
         {grid}\
         <div id=\"bottom-banner\">\n{forecasts}</div>\n",
        day = data.now.day(),
        month = data.now.format("%B"),
        temp = data.current.temperature.display(),
        icon = data.current.icon.src(),
        grid = calendar_grid(data, &window),
        forecasts = forecast_table(data),
    )
}

fn calendar_body(data: &PageData) -> String {
    format!(
        "<div class=\"banner\">\n\
         <h3 id=\"date\" class=\"numcircle\">{day}</h3>\n\
         <h3 id=\"month\" class=\"month\">{month}</h3>\n\
         <h4 id=\"temp\" class=\"numcircle\">{temp}</h4>\n\
         <div id=\"icon-container\" class=\"icon\"><img src=\"{icon}\"></div>\n\
         </div>\n\
         <div id=\"map-container\"><img id=\"map\" src=\"{map}\"></div>\n\
         <div id=\"bottom-banner\">\n{forecasts}</div>\n",
        day = data.now.day(),
        month = data.now.format("%B"),
        temp = data.current.temperature.display(),
        icon = data.current.icon.src(),
        map = data.map_url,
        forecasts = forecast_table(data),
    )
}
