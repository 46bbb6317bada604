//! Page rendering pipeline
//!
//! Drives a headless Chrome/Chromium in CLI screenshot mode, sized so the
//! visible content area matches the target display exactly, then derives a
//! palette-reduced BMP for memory-constrained e-ink clients. A missing
//! browser binary is fatal; rendering is attempted exactly once per run.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use tokio::process::Command;

use crate::InkframeError;

/// Browser binaries probed on `PATH`, in preference order
const BROWSER_CANDIDATES: &[&str] = &["google-chrome", "chromium", "chromium-browser", "chrome"];

/// Extra window height requested from the browser; the screenshot is
/// cropped back to the exact target size afterwards
const VIEWPORT_MARGIN: u32 = 100;

/// Virtual time granted to the page before the screenshot, letting
/// asynchronous content (icons, map tile) settle
const SETTLE_BUDGET_MS: u32 = 2000;

/// Paths of the raster artifacts produced by one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub png: PathBuf,
    pub bmp: PathBuf,
}

/// Headless-browser screenshot renderer
#[derive(Debug, Clone)]
pub struct Renderer {
    browser: PathBuf,
    width: u32,
    height: u32,
    rotate_angle: u32,
    output_dir: PathBuf,
}

impl Renderer {
    /// Locate a browser binary and build a renderer.
    ///
    /// `CHROME_PATH` overrides discovery; otherwise the usual binary names
    /// are probed on `PATH`. No browser is a fatal error.
    pub fn discover(
        width: u32,
        height: u32,
        rotate_angle: u32,
        output_dir: PathBuf,
    ) -> Result<Self> {
        let browser = if let Ok(path) = env::var("CHROME_PATH") {
            PathBuf::from(path)
        } else {
            let path_var = env::var_os("PATH").unwrap_or_default();
            let dirs: Vec<PathBuf> = env::split_paths(&path_var).collect();
            find_browser(&dirs, BROWSER_CANDIDATES).ok_or_else(|| {
                InkframeError::render(
                    "No headless browser found (tried google-chrome, chromium, \
                     chromium-browser, chrome; set CHROME_PATH to override)",
                )
            })?
        };

        tracing::debug!(browser = %browser.display(), "Using browser binary");
        Ok(Self {
            browser,
            width,
            height,
            rotate_angle,
            output_dir,
        })
    }

    /// Screenshot the page and derive the display-ready artifacts.
    ///
    /// Produces `<name>.png` (full color, exact display size) and
    /// `<name>.bmp` (16-level grayscale, rotated for portrait displays).
    pub async fn render(&self, html_path: &Path, page_name: &str) -> Result<RenderedPage> {
        let png_path = self.output_dir.join(format!("{page_name}.png"));
        let bmp_path = self.output_dir.join(format!("{page_name}.bmp"));

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory {}",
                    self.output_dir.display()
                )
            })?;

        let html_absolute = std::path::absolute(html_path)
            .with_context(|| format!("Failed to resolve page path {}", html_path.display()))?;
        let html_url = format!("file://{}", html_absolute.display());

        self.screenshot(&html_url, &png_path).await?;

        let screenshot = image::open(&png_path)
            .with_context(|| format!("Failed to open screenshot {}", png_path.display()))?;
        let cropped = crop_to(screenshot, self.width, self.height);
        cropped
            .save(&png_path)
            .with_context(|| format!("Failed to save {}", png_path.display()))?;

        let bmp = to_eink_bitmap(&cropped, self.rotate_angle);
        bmp.save(&bmp_path)
            .with_context(|| format!("Failed to save {}", bmp_path.display()))?;

        tracing::info!(
            png = %png_path.display(),
            bmp = %bmp_path.display(),
            "Screenshot captured and converted"
        );
        Ok(RenderedPage {
            png: png_path,
            bmp: bmp_path,
        })
    }

    async fn screenshot(&self, html_url: &str, png_path: &Path) -> Result<()> {
        let output = Command::new(&self.browser)
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--disable-extensions")
            .arg("--hide-scrollbars")
            .arg("--force-device-scale-factor=1")
            .arg("--default-background-color=ffffffff")
            .arg(format!("--virtual-time-budget={SETTLE_BUDGET_MS}"))
            .arg(format!(
                "--window-size={},{}",
                self.width,
                self.height + VIEWPORT_MARGIN
            ))
            .arg(format!("--screenshot={}", png_path.display()))
            .arg(html_url)
            .output()
            .await
            .map_err(|e| {
                InkframeError::render(format!(
                    "Failed to start browser {}: {e}",
                    self.browser.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "Browser exited abnormally: {}", stderr.trim());
        }

        if !png_path.exists() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InkframeError::render(format!(
                "Browser produced no screenshot: {}",
                stderr.trim()
            ))
            .into());
        }
        Ok(())
    }
}

/// First candidate binary found in the given directories
fn find_browser(dirs: &[PathBuf], candidates: &[&str]) -> Option<PathBuf> {
    for candidate in candidates {
        for dir in dirs {
            let path = dir.join(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
    }
    None
}

/// Crop the oversized screenshot back to the exact display size. The
/// browser window includes the compensation margin; content never exceeds
/// the requested area.
fn crop_to(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let w = width.min(img.width());
    let h = height.min(img.height());
    img.crop_imm(0, 0, w, h)
}

/// Grayscale, quantized to 16 levels, rotated for the display orientation.
/// The BMP encoder stores 8-bit grayscale palletized, which is what the
/// e-ink client's decoder expects.
fn to_eink_bitmap(img: &DynamicImage, rotate_angle: u32) -> GrayImage {
    let rotated = match rotate_angle {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => img.clone(),
    };

    let mut gray = rotated.to_luma8();
    for pixel in gray.pixels_mut() {
        pixel.0[0] = quantize_16(pixel.0[0]);
    }
    gray
}

/// Snap an 8-bit sample to the nearest of 16 evenly spaced gray levels
fn quantize_16(value: u8) -> u8 {
    (value / 17) * 17
}
