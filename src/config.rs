//! Configuration loaded from `~/.config/tsplit/config.toml`.
//!
//! ```toml
//! default_font_size = 12.0
//! default_font_unit = "pt"
//! page_scale = 0.72
//!
//! [notice]
//! message = "The text was split"
//! dismiss_after_ms = 1500
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::split::{StyleDefaults, DEFAULT_FONT_SIZE_PT};
use crate::units::Unit;

/// Factor from host page pixels to envelope points.
pub const DEFAULT_PAGE_SCALE: f64 = 0.72;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font size assumed when a text shape names none.
    pub default_font_size: f64,
    /// Unit of `default_font_size`.
    pub default_font_unit: String,
    /// Page pixels to envelope points.
    pub page_scale: f64,
    pub notice: NoticeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_font_size: DEFAULT_FONT_SIZE_PT,
            default_font_unit: "pt".to_string(),
            page_scale: DEFAULT_PAGE_SCALE,
            notice: NoticeConfig::default(),
        }
    }
}

impl Config {
    /// Check the values the splitter relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the default font size or page scale is not a
    /// finite positive number, or the default font unit is unknown.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.default_font_size.is_finite() && self.default_font_size > 0.0,
            "default_font_size must be a positive number, got {}",
            self.default_font_size
        );
        self.default_font_unit
            .parse::<Unit>()
            .context("default_font_unit is not a known unit")?;
        ensure!(
            self.page_scale.is_finite() && self.page_scale > 0.0,
            "page_scale must be a positive number, got {}",
            self.page_scale
        );
        Ok(())
    }

    #[must_use]
    pub fn style_defaults(&self) -> StyleDefaults {
        StyleDefaults {
            font_size: self.default_font_size,
            font_unit: self.default_font_unit.clone(),
        }
    }
}

/// The transient notice shown after a successful split.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    pub message: String,
    /// Auto-close delay in milliseconds.
    pub dismiss_after_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            message: "The text was split".to_string(),
            dismiss_after_ms: 1500,
        }
    }
}

impl NoticeConfig {
    #[must_use]
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

/// Load configuration from `path`, or from the default location when `None`.
///
/// Returns defaults if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let config: Config =
        toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    Ok(config)
}

/// Return the path to the config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tsplit")
        .join("config.toml")
}
