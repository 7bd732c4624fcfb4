//! Lightbox configuration module.
//!
//! Handles loading, validating, and layering `lightbox.toml`. Stock defaults
//! match the behavior pages expect out of the box; a config file only needs
//! the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [modal]
//! anchor_retries = 3            # Attempts to find the modal markup before giving up
//! anchor_retry_delay_ms = 100   # Delay between attempts
//!
//! [preload]
//! eager_count = 2               # Images preloaded before the first paint
//! render_count = 5              # Images preloaded once the modal has rendered
//! neighborhood = 5              # Window size preloaded around a navigation target
//! neighborhood_lead = 2         # How many of those sit before the target
//! batch_size = 3                # Background sweep batch size
//! batch_delay_ms = 200          # Pause between background batches
//! sweep_start_delay_ms = 1000   # Wait after opening before the sweep starts
//!
//! [swipe]
//! threshold_px = 50.0           # Horizontal travel that counts as a swipe (strict)
//!
//! [lazy]
//! transition = true             # Fade images in once loaded
//! placeholder_width = 400       # Generated placeholder size when none is given
//! placeholder_height = 300
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Lightbox configuration loaded from `lightbox.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LightboxConfig {
    /// Modal attachment settings.
    pub modal: ModalConfig,
    /// Preload tier sizes and sweep pacing.
    pub preload: PreloadConfig,
    /// Touch gesture settings.
    pub swipe: SwipeConfig,
    /// Lazy loader defaults.
    pub lazy: LazyConfig,
}

impl LightboxConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.preload;
        if p.eager_count == 0 {
            return Err(ConfigError::Validation(
                "preload.eager_count must be at least 1".into(),
            ));
        }
        if p.batch_size == 0 {
            return Err(ConfigError::Validation(
                "preload.batch_size must be at least 1".into(),
            ));
        }
        if p.neighborhood == 0 {
            return Err(ConfigError::Validation(
                "preload.neighborhood must be at least 1".into(),
            ));
        }
        if p.neighborhood_lead >= p.neighborhood {
            return Err(ConfigError::Validation(
                "preload.neighborhood_lead must be smaller than preload.neighborhood".into(),
            ));
        }
        if !self.swipe.threshold_px.is_finite() || self.swipe.threshold_px < 0.0 {
            return Err(ConfigError::Validation(
                "swipe.threshold_px must be a non-negative number".into(),
            ));
        }
        if self.lazy.placeholder_width == 0 || self.lazy.placeholder_height == 0 {
            return Err(ConfigError::Validation(
                "lazy.placeholder_width and lazy.placeholder_height must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Modal attachment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModalConfig {
    /// How many times to look for the modal markup after the first miss.
    pub anchor_retries: u32,
    pub anchor_retry_delay_ms: u64,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            anchor_retries: 3,
            anchor_retry_delay_ms: 100,
        }
    }
}

impl ModalConfig {
    pub fn anchor_retry_delay(&self) -> Duration {
        Duration::from_millis(self.anchor_retry_delay_ms)
    }
}

/// Preload tier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreloadConfig {
    /// Images `[0, eager_count)` are preloaded as the modal opens.
    pub eager_count: usize,
    /// Images `[0, render_count)` are preloaded once content has rendered.
    pub render_count: usize,
    /// Window size preloaded around each navigation target.
    pub neighborhood: usize,
    /// How many window slots precede the target.
    pub neighborhood_lead: usize,
    /// Background sweep batch size.
    pub batch_size: usize,
    pub batch_delay_ms: u64,
    pub sweep_start_delay_ms: u64,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            eager_count: 2,
            render_count: 5,
            neighborhood: 5,
            neighborhood_lead: 2,
            batch_size: 3,
            batch_delay_ms: 200,
            sweep_start_delay_ms: 1000,
        }
    }
}

impl PreloadConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn sweep_start_delay(&self) -> Duration {
        Duration::from_millis(self.sweep_start_delay_ms)
    }
}

/// Touch gesture settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwipeConfig {
    /// Minimum horizontal travel, exclusive. Travel of exactly this much is a tap.
    pub threshold_px: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self { threshold_px: 50.0 }
    }
}

/// Lazy loader defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LazyConfig {
    /// Fade images in once loaded.
    pub transition: bool,
    pub placeholder_width: u32,
    pub placeholder_height: u32,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            transition: true,
            placeholder_width: 400,
            placeholder_height: 300,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(LightboxConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<LightboxConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: LightboxConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `lightbox.toml` from `path`, layered over the stock defaults.
///
/// A missing file yields the defaults. A file with invalid TOML, unknown keys,
/// or out-of-range values is an error.
pub fn load_config(path: &Path) -> Result<LightboxConfig, ConfigError> {
    if !path.exists() {
        return Ok(LightboxConfig::default());
    }
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// A documented `lightbox.toml` with every option at its default.
pub fn stock_config_toml() -> &'static str {
    r##"# folio-lightbox configuration
# Every key is optional; delete what you do not want to change.

[modal]
# Attempts to find the modal markup after the first miss. Once exhausted the
# gallery disables itself and every call becomes a logged no-op.
anchor_retries = 3
anchor_retry_delay_ms = 100

[preload]
# Images preloaded before the first paint (current + next).
eager_count = 2
# Images preloaded once the modal content has rendered.
render_count = 5
# Window preloaded around every navigation target, and how many slots of
# that window come before the target.
neighborhood = 5
neighborhood_lead = 2
# Background sweep: remaining images are fetched a batch at a time.
batch_size = 3
batch_delay_ms = 200
sweep_start_delay_ms = 1000

[swipe]
# Horizontal travel in CSS pixels. Exactly this much is still a tap.
threshold_px = 50.0

[lazy]
# Fade images in once they finish loading.
transition = true
# Size of the generated placeholder when an image gives no dimensions.
placeholder_width = 400
placeholder_height = 300
"##
}
