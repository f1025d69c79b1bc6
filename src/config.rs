//! Configuration management for s4-midify
//!
//! Handles loading and validating the YAML configuration file. Every field has a
//! default, so running without a config file works with the embedded mapping tables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::mixer::CARD_NAME;

/// Jog sensitivity bounds, in milliseconds of debounce
pub const MIN_JOG_SENSITIVITY_MS: u64 = 1;
pub const MAX_JOG_SENSITIVITY_MS: u64 = 100;
pub const DEFAULT_JOG_SENSITIVITY_MS: u64 = 5;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub mappings: MappingsConfig,
    #[serde(default)]
    pub alsa: AlsaConfig,
    /// Jog wheel debounce window (1-100 ms). Larger is less sensitive.
    #[serde(default = "default_jog_sensitivity")]
    pub jog_sensitivity_ms: u64,
}

/// Controller input device
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Substring of the evdev device name
    #[serde(default = "default_device_name")]
    pub name_pattern: String,
    /// Explicit evdev path, skips detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Name of the virtual ports created when no patterns are given
    #[serde(default = "default_port_name")]
    pub port_name: String,
    /// Connect to an existing output port instead (case-insensitive substring)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_port: Option<String>,
    /// Connect to an existing input port instead (case-insensitive substring)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
}

/// Mapping table files; unset entries use the embedded tables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MappingsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixer_effect: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<PathBuf>,
}

/// ALSA card used for LED writes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlsaConfig {
    /// Card number or id; detected from `aplay -l` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<String>,
    #[serde(default = "default_card_name")]
    pub card_name: String,
}

impl AppConfig {
    /// Load configuration from file with validation.
    ///
    /// A missing file is not an error: defaults are used.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !fs::try_exists(path).await.unwrap_or(false) {
            info!("No config file at {}, using defaults", path.display());
            let mut config = Self::default();
            config.validate();
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_yaml(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))
    }

    /// Parse and validate YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let mut config: AppConfig = serde_yaml::from_str(contents)?;
        config.validate();
        Ok(config)
    }

    /// Replace the jog sensitivity, e.g. from the command line
    pub fn set_jog_sensitivity(&mut self, ms: u64) {
        self.jog_sensitivity_ms = ms;
        self.validate();
    }

    /// Bring out-of-range values back to their defaults
    pub fn validate(&mut self) {
        if !(MIN_JOG_SENSITIVITY_MS..=MAX_JOG_SENSITIVITY_MS).contains(&self.jog_sensitivity_ms) {
            warn!(
                "Jog sensitivity must be between {} and {}. Using default value ({}).",
                MIN_JOG_SENSITIVITY_MS, MAX_JOG_SENSITIVITY_MS, DEFAULT_JOG_SENSITIVITY_MS
            );
            self.jog_sensitivity_ms = DEFAULT_JOG_SENSITIVITY_MS;
        }
    }

    /// Jog wheel debounce window
    pub fn jog_debounce(&self) -> Duration {
        Duration::from_millis(self.jog_sensitivity_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            midi: MidiConfig::default(),
            mappings: MappingsConfig::default(),
            alsa: AlsaConfig::default(),
            jog_sensitivity_ms: default_jog_sensitivity(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name_pattern: default_device_name(),
            path: None,
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            client_name: default_client_name(),
            port_name: default_port_name(),
            output_port: None,
            input_port: None,
        }
    }
}

impl Default for AlsaConfig {
    fn default() -> Self {
        Self {
            card: None,
            card_name: default_card_name(),
        }
    }
}

// Default value functions
fn default_jog_sensitivity() -> u64 { DEFAULT_JOG_SENSITIVITY_MS }
fn default_device_name() -> String { "Traktor Kontrol S4".to_string() }
fn default_client_name() -> String { "s4-midify".to_string() }
fn default_port_name() -> String { "traktor-s4-mk1-midify".to_string() }
fn default_card_name() -> String { CARD_NAME.to_string() }
