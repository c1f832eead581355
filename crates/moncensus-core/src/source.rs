//! Collaborator boundary for raw monitor data
//!
//! The core never touches the registry or the management API itself. A
//! [`RawSourceProvider`] hands it live display rows, configuration-store
//! candidates and raw values; every call is blocking.

use thiserror::Error;

use crate::hwid::HardwareId;

/// Child key of a device instance that holds its hardware parameters
pub const DEVICE_PARAMETERS: &str = "Device Parameters";

/// Registry value holding a device's friendly description
pub const DEVICE_DESCRIPTION_VALUE: &str = "DeviceDesc";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),
    #[error("Value {value} not found under {key}")]
    ValueNotFound { key: String, value: String },
    #[error("Value {value} under {key} has an unexpected type")]
    WrongType { key: String, value: String },
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// A monitor reported by the live device-enumeration channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveDisplay {
    /// Enumeration-local id, e.g. `DesktopMonitor1`
    pub device_id: Option<String>,
    /// Display caption
    pub model_caption: Option<String>,
    /// Manufacturer as reported by the driver
    pub manufacturer_hint: Option<String>,
    pub monitor_type: Option<String>,
    pub pixels_per_x_inch: Option<u32>,
    pub pixels_per_y_inch: Option<u32>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub availability_code: Option<i64>,
    pub power_capability_code: Option<i64>,
    /// Full hardware id; physical monitors always carry one
    pub pnp_device_id: Option<HardwareId>,
}

/// Supplier of candidate identifiers and raw bytes for one host
pub trait RawSourceProvider {
    /// Monitors currently enumerated by the device subsystem, in order
    fn list_live_displays(&self) -> Result<Vec<LiveDisplay>, SourceError>;

    /// Device instances stored under `base_path`: every vendor key, then
    /// every instance key below it, as `base\vendor\instance`.
    ///
    /// Fails only when `base_path` itself cannot be listed.
    fn list_config_candidates(&self, base_path: &str) -> Result<Vec<HardwareId>, SourceError> {
        let base = HardwareId::from(base_path);
        let mut candidates = Vec::new();
        for vendor in self.child_names(base_path)? {
            let vendor_id = base.join(&vendor);
            for instance in self.child_names(vendor_id.as_str()).unwrap_or_default() {
                candidates.push(vendor_id.join(&instance));
            }
        }
        Ok(candidates)
    }

    /// Names of the child keys of `path`
    fn child_names(&self, path: &str) -> Result<Vec<String>, SourceError>;

    /// Binary value `name` under `path`; `Ok(None)` when the value is absent
    fn read_binary_value(&self, path: &str, name: &str) -> Result<Option<Vec<u8>>, SourceError>;

    /// String value `name` under `path`; `Ok(None)` when the value is absent
    fn read_string_value(&self, path: &str, name: &str) -> Result<Option<String>, SourceError>;
}

/// Path of the key holding a device's EDID
pub fn device_parameters_path(hardware_id: &HardwareId) -> String {
    hardware_id.join(DEVICE_PARAMETERS).0
}

/// In-memory provider, keyed by exact path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub live: Vec<LiveDisplay>,
    /// Child names per key path, in listing order
    pub children: Vec<(String, Vec<String>)>,
    pub binary_values: Vec<(String, String, Vec<u8>)>,
    pub string_values: Vec<(String, String, String)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_live(mut self, display: LiveDisplay) -> Self {
        self.live.push(display);
        self
    }

    pub fn with_children(mut self, path: &str, names: &[&str]) -> Self {
        let names = names.iter().map(|n| n.to_string()).collect();
        self.children.push((path.to_string(), names));
        self
    }

    pub fn with_binary(mut self, path: &str, name: &str, bytes: Vec<u8>) -> Self {
        self.binary_values.push((path.to_string(), name.to_string(), bytes));
        self
    }

    pub fn with_string(mut self, path: &str, name: &str, value: &str) -> Self {
        self.string_values
            .push((path.to_string(), name.to_string(), value.to_string()));
        self
    }

    /// Register a device instance with its EDID under `Device Parameters`
    pub fn with_edid(self, hardware_id: &str, edid: Vec<u8>) -> Self {
        let id = HardwareId::from(hardware_id);
        self.with_children(hardware_id, &[DEVICE_PARAMETERS])
            .with_binary(&device_parameters_path(&id), crate::edid::EDID_VALUE_NAME, edid)
    }
}

impl RawSourceProvider for MemorySource {
    fn list_live_displays(&self) -> Result<Vec<LiveDisplay>, SourceError> {
        Ok(self.live.clone())
    }

    fn child_names(&self, path: &str) -> Result<Vec<String>, SourceError> {
        self.children
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, names)| names.clone())
            .ok_or_else(|| SourceError::KeyNotFound(path.to_string()))
    }

    fn read_binary_value(&self, path: &str, name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self
            .binary_values
            .iter()
            .find(|(p, n, _)| p == path && n == name)
            .map(|(_, _, bytes)| bytes.clone()))
    }

    fn read_string_value(&self, path: &str, name: &str) -> Result<Option<String>, SourceError> {
        Ok(self
            .string_values
            .iter()
            .find(|(p, n, _)| p == path && n == name)
            .map(|(_, _, value)| value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_two_level_walk() {
        let source = MemorySource::new()
            .with_children("DISPLAY", &["DEL4065", "SAM0B54"])
            .with_children(r"DISPLAY\DEL4065", &["5&1a2b3c&0&UID4352"])
            .with_children(r"DISPLAY\SAM0B54", &["4&aa&0", "4&aa&1"]);

        let ids: Vec<String> = source
            .list_config_candidates("DISPLAY")
            .unwrap()
            .into_iter()
            .map(|id| id.0)
            .collect();
        assert_eq!(
            ids,
            vec![
                r"DISPLAY\DEL4065\5&1a2b3c&0&UID4352",
                r"DISPLAY\SAM0B54\4&aa&0",
                r"DISPLAY\SAM0B54\4&aa&1",
            ]
        );
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let source = MemorySource::new();
        assert!(matches!(
            source.child_names("DISPLAY"),
            Err(SourceError::KeyNotFound(_))
        ));
        assert_eq!(source.read_binary_value("DISPLAY", "EDID").unwrap(), None);
    }

    #[test]
    fn test_device_parameters_path() {
        let id = HardwareId::from(r"DISPLAY\DEL4065\1");
        assert_eq!(device_parameters_path(&id), r"DISPLAY\DEL4065\1\Device Parameters");
    }
}
