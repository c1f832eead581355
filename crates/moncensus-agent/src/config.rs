//! Configuration loading

use anyhow::{Context, Result};
use moncensus_core::{HardwareId, VendorTable, DISPLAY_CLASS};
use moncensus_sources::DEFAULT_ENUM_ROOT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "vendor")]
    pub vendors: Vec<VendorConfig>,
    #[serde(default, rename = "host")]
    pub hosts: Vec<HostConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Registry key holding the device enumeration
    #[serde(default = "default_enum_root")]
    pub enum_root: String,
    /// Device class key walked for configured monitors
    #[serde(default = "default_display_class")]
    pub display_class: String,
    /// Identities never reported, e.g. `DISPLAY\ABC1234`
    #[serde(default)]
    pub denylist: Vec<String>,
    /// Latest accepted manufacture year (defaults to the current year)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            enum_root: default_enum_root(),
            display_class: default_display_class(),
            denylist: Vec::new(),
            reference_year: None,
        }
    }
}

impl CollectionConfig {
    pub fn denylist(&self) -> Vec<HardwareId> {
        self.denylist
            .iter()
            .filter(|id| !id.is_empty())
            .map(|id| HardwareId::from(id.as_str()))
            .collect()
    }
}

fn default_enum_root() -> String {
    DEFAULT_ENUM_ROOT.to_string()
}

fn default_display_class() -> String {
    DISPLAY_CLASS.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Delimited attribute rows
    #[default]
    Row,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (stdout when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Separator between monitors in a row value
    #[serde(default = "default_record_separator")]
    pub record_separator: String,
    /// Separator between fields of one monitor
    #[serde(default = "default_field_separator")]
    pub field_separator: String,
    /// Attribute group named in the row envelope
    #[serde(default = "default_attribute_group")]
    pub attribute_group: String,
    /// Attribute name of the row value
    #[serde(default = "default_attribute")]
    pub attribute: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            path: None,
            record_separator: default_record_separator(),
            field_separator: default_field_separator(),
            attribute_group: default_attribute_group(),
            attribute: default_attribute(),
        }
    }
}

fn default_record_separator() -> String {
    "<BDNA,1>".to_string()
}

fn default_field_separator() -> String {
    "<BDNA,2>".to_string()
}

fn default_attribute_group() -> String {
    "systemData".to_string()
}

fn default_attribute() -> String {
    "operatingSystem.monitors".to_string()
}

/// Additional manufacturer code to name mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub code: String,
    pub name: String,
}

/// Captures taken from one host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub name: String,
    /// `Win32_DesktopMonitor` JSON capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displays: Option<PathBuf>,
    /// Registry export of the enumeration tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<PathBuf>,
    /// Inventory element the rows are reported against
    #[serde(default)]
    pub element_id: String,
    #[serde(default)]
    pub collector_id: String,
}

impl HostConfig {
    /// Resolve relative capture paths against `base`
    pub fn resolved(mut self, base: &Path) -> Self {
        self.displays = self.displays.map(|p| base.join(p));
        self.registry = self.registry.map(|p| base.join(p));
        self
    }
}

impl Config {
    pub fn vendor_table(&self) -> VendorTable {
        VendorTable::new().with_names(
            self.vendors
                .iter()
                .map(|v| (v.code.as_str(), v.name.as_str())),
        )
    }

    /// Hosts to collect, restricted to `only` when it is non-empty
    pub fn selected_hosts(&self, only: &[String]) -> Vec<HostConfig> {
        self.hosts
            .iter()
            .filter(|h| only.is_empty() || only.iter().any(|name| name.eq_ignore_ascii_case(&h.name)))
            .cloned()
            .collect()
    }
}

/// Load configuration from file, or defaults when it does not exist
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!(path = %path.display(), hosts = config.hosts.len(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Write a default configuration with one example host
pub fn save_default_config(path: &Path) -> Result<()> {
    let config = Config {
        vendors: vec![VendorConfig {
            code: "GSM".to_string(),
            name: "LG Electronics".to_string(),
        }],
        hosts: vec![HostConfig {
            name: "localhost".to_string(),
            displays: Some(PathBuf::from("captures/localhost/displays.json")),
            registry: Some(PathBuf::from("captures/localhost/enum.reg")),
            element_id: "1".to_string(),
            collector_id: "1".to_string(),
        }],
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config)?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
