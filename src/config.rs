/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the report builder configuration: update service
    endpoint, tracked devices, input/output paths and the
    failure policy.

  Security / Safety Notes:
    Read-only access to an operator-owned TOML file; no
    secrets are expected or stored.

  Dependencies:
    serde + toml for parsing, dirs for the default location.

  Operational Scope:
    Consumed once at start-up by the entry point.

  Revision History:
    2025-11-12 COD  Authored report configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Built-in defaults reproduce the canonical report
    - Validation before any network access
============================================================*/

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{OtaError, Result};

const DEFAULT_API_BASE: &str = "https://api.dariaos.com/ota/api/v1";

/// One tracked device: API codename, display name and the release label the
/// chain walk starts from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceConfig {
    pub codename: String,
    pub name: String,
    pub release: String,
}

impl DeviceConfig {
    pub fn new(codename: &str, name: &str, release: &str) -> Self {
        Self {
            codename: codename.to_string(),
            name: name.to_string(),
            release: release.to_string(),
        }
    }
}

/// Update service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub channel: String,
    pub suffix: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub max_chain_depth: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            channel: "RELEASE".to_string(),
            suffix: "SOMETHING".to_string(),
            timeout: 30,
            max_chain_depth: 64,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub api: ApiConfig,
    pub fail_fast: bool,
    pub unlisted_path: PathBuf,
    pub unlisted_optional: bool,
    pub output_path: PathBuf,
    pub log_dir: PathBuf,
    pub devices: Vec<DeviceConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            fail_fast: true,
            unlisted_path: PathBuf::from("scripts/unlisted_updates.json"),
            unlisted_optional: false,
            output_path: PathBuf::from("docs/official-rom.md"),
            log_dir: PathBuf::from("logs"),
            devices: default_devices(),
        }
    }
}

/// The three Daria Bond handsets tracked by default, in report order.
pub fn default_devices() -> Vec<DeviceConfig> {
    vec![
        DeviceConfig::new("zahedan", "Daria Bond I", "V0.00.0.0.BOND"),
        DeviceConfig::new("hormoz", "Daria Bond II", "V0.00.0.0.BOND2"),
        DeviceConfig::new("qoqnoos", "Daria Bond II Lite", "V0.00.0.0.BOND2L"),
    ]
}

impl ReportConfig {
    /// Load configuration from an explicit path, the user config directory,
    /// or fall back to built-in defaults.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(OtaError::Config(format!(
                        "Config file {} does not exist",
                        explicit.display()
                    )));
                }
                Self::load(explicit)?
            }
            None => match Self::default_path() {
                Some(candidate) if candidate.exists() => Self::load(&candidate)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/synota/config.toml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("synota").join("config.toml"))
    }

    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            OtaError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|err| OtaError::Config(format!("{}: {err}", path.display())))
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(OtaError::Config("At least one device is required".into()));
        }
        if self.api.max_chain_depth == 0 {
            return Err(OtaError::Config("api.max_chain_depth must be >= 1".into()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(OtaError::Config("api.base_url must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.codename.trim().is_empty()
                || device.name.trim().is_empty()
                || device.release.trim().is_empty()
            {
                return Err(OtaError::Config(format!(
                    "Device entry `{}` has empty fields",
                    device.codename
                )));
            }
            if !seen.insert(device.codename.as_str()) {
                return Err(OtaError::Config(format!(
                    "Duplicate device codename `{}`",
                    device.codename
                )));
            }
        }
        Ok(())
    }
}
