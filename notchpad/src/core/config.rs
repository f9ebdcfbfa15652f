use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::display::DisplayCutout;
use super::geometry::Size;

/// Modifier key that lets hovering open the panel even when hover-to-open is off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    #[default]
    Option,
    Command,
    Control,
    Shift,
}

/// Application configuration settings, read from
/// `~/.config/notchpad/config.json`. Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub opened_width: f64,
    pub opened_height: f64,
    /// Subtracted from the cutout size while closed.
    pub closed_margin: f64,
    /// Added to the cutout size while popping.
    pub pop_margin: f64,
    pub closed_radius: f64,
    pub popping_radius: f64,
    pub opened_radius: f64,
    pub spacing: f64,
    /// Hit-test tolerance around the opened panel on displays with a real cutout.
    pub cutout_inset: f64,
    /// How far around the cutout a drag is still considered aimed at it.
    pub detector_margin: f64,
    /// Room left around the panel for its shadow.
    pub shadow_padding: f64,
    pub open_on_hover: bool,
    pub modifier_key: ModifierKey,
    pub pop_duration_ms: u64,
    pub settle_delay_ms: u64,
    pub heartbeat_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opened_width: 600.0,
            opened_height: 160.0,
            closed_margin: 4.0,
            pop_margin: 8.0,
            closed_radius: 8.0,
            popping_radius: 10.0,
            opened_radius: 32.0,
            spacing: 16.0,
            cutout_inset: -4.0,
            detector_margin: 32.0,
            shadow_padding: 20.0,
            open_on_hover: true,
            modifier_key: ModifierKey::Option,
            pop_duration_ms: 400,
            settle_delay_ms: 100,
            heartbeat_interval_ms: 500,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("notchpad").join("config.json"))
    }

    /// Loads the user configuration, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            tracing::warn!("Could not determine home directory, using default config");
            return Self::new();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config from {:?}: {:#}", path, e);
                Self::new()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn opened_size(&self) -> Size {
        Size::new(self.opened_width, self.opened_height)
    }

    /// Synthetic cutouts are fully interactive, so they get no tolerance.
    pub fn inset_for(&self, cutout: &DisplayCutout) -> f64 {
        if cutout.has_cutout {
            self.cutout_inset
        } else {
            0.0
        }
    }

    pub fn pop_duration(&self) -> Duration {
        Duration::from_millis(self.pop_duration_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }
}
