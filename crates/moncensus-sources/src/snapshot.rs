//! Host snapshot: an offline [`RawSourceProvider`] for one machine
//!
//! Combines a live display capture and a registry export taken from the
//! same host. Registry paths handed to the provider are relative to the
//! device enumeration root inside the export.

use std::path::Path;
use thiserror::Error;
use tracing::debug;

use moncensus_core::{LiveDisplay, RawSourceProvider, SourceError};

use crate::live::parse_live_displays;
use crate::regfile::{RegFileError, RegistryHive};

/// Device enumeration root of a standard export
pub const DEFAULT_ENUM_ROOT: &str = r"HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum";

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid display snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid registry export: {0}")]
    Registry(#[from] RegFileError),
}

/// Captured monitor data for one host
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    enum_root: String,
    live: Vec<LiveDisplay>,
    hive: Option<RegistryHive>,
}

impl HostSnapshot {
    pub fn new(enum_root: impl Into<String>) -> Self {
        Self {
            enum_root: enum_root.into(),
            live: Vec::new(),
            hive: None,
        }
    }

    pub fn with_live(mut self, live: Vec<LiveDisplay>) -> Self {
        self.live = live;
        self
    }

    pub fn with_hive(mut self, hive: RegistryHive) -> Self {
        self.hive = Some(hive);
        self
    }

    /// Load whichever captures are configured
    pub fn load(
        enum_root: &str,
        displays: Option<&Path>,
        registry: Option<&Path>,
    ) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::new(enum_root);
        if let Some(path) = displays {
            let json = std::fs::read_to_string(path)?;
            snapshot.live = parse_live_displays(&json)?;
            debug!(path = %path.display(), displays = snapshot.live.len(), "Display snapshot loaded");
        }
        if let Some(path) = registry {
            snapshot.hive = Some(RegistryHive::load(path)?);
        }
        Ok(snapshot)
    }

    fn hive(&self) -> Result<&RegistryHive, SourceError> {
        self.hive
            .as_ref()
            .ok_or_else(|| SourceError::Unavailable("no registry export loaded".to_string()))
    }

    fn resolve(&self, path: &str) -> String {
        let root = self.enum_root.trim_end_matches('\\');
        let path = path.trim_start_matches('\\');
        match (root.is_empty(), path.is_empty()) {
            (true, _) => path.to_string(),
            (false, true) => root.to_string(),
            (false, false) => format!(r"{}\{}", root, path),
        }
    }
}

impl RawSourceProvider for HostSnapshot {
    fn list_live_displays(&self) -> Result<Vec<LiveDisplay>, SourceError> {
        Ok(self.live.clone())
    }

    fn child_names(&self, path: &str) -> Result<Vec<String>, SourceError> {
        self.hive()?
            .subkey_names(&self.resolve(path))
            .map(<[String]>::to_vec)
            .ok_or_else(|| SourceError::KeyNotFound(path.to_string()))
    }

    fn read_binary_value(&self, path: &str, name: &str) -> Result<Option<Vec<u8>>, SourceError> {
        match self.hive()?.value(&self.resolve(path), name) {
            None => Ok(None),
            Some(value) => value
                .as_bytes()
                .map(|bytes| Some(bytes.to_vec()))
                .ok_or_else(|| SourceError::WrongType {
                    key: path.to_string(),
                    value: name.to_string(),
                }),
        }
    }

    fn read_string_value(&self, path: &str, name: &str) -> Result<Option<String>, SourceError> {
        match self.hive()?.value(&self.resolve(path), name) {
            None => Ok(None),
            Some(value) => value.as_text().map(Some).ok_or_else(|| SourceError::WrongType {
                key: path.to_string(),
                value: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moncensus_core::HardwareId;

    const EXPORT: &str = r#"Windows Registry Editor Version 5.00

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\DEL4065\1]
"DeviceDesc"="Dell U2410"
"ConfigFlags"=dword:00000000

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\DEL4065\1\Device Parameters]
"EDID"=hex:00,ff,ff,ff,ff,ff,ff,00

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\SAM0B54\2]
"#;

    fn snapshot() -> HostSnapshot {
        HostSnapshot::new(DEFAULT_ENUM_ROOT).with_hive(RegistryHive::parse(EXPORT).unwrap())
    }

    #[test]
    fn test_registry_reads_are_relative_to_root() {
        let s = snapshot();
        assert_eq!(s.child_names("DISPLAY").unwrap(), vec!["DEL4065", "SAM0B54"]);
        assert_eq!(
            s.read_binary_value(r"DISPLAY\DEL4065\1\Device Parameters", "EDID")
                .unwrap()
                .map(|b| b.len()),
            Some(8)
        );
        assert_eq!(
            s.read_string_value(r"DISPLAY\DEL4065\1", "DeviceDesc").unwrap().as_deref(),
            Some("Dell U2410")
        );
        assert_eq!(s.read_string_value(r"DISPLAY\DEL4065\1", "Mfg").unwrap(), None);
        assert!(matches!(
            s.read_string_value(r"DISPLAY\DEL4065\1", "ConfigFlags"),
            Err(SourceError::WrongType { .. })
        ));
        assert!(matches!(
            s.child_names(r"DISPLAY\NONE"),
            Err(SourceError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_config_candidates() {
        let ids: Vec<HardwareId> = snapshot().list_config_candidates("DISPLAY").unwrap();
        assert_eq!(
            ids,
            vec![
                HardwareId::from(r"DISPLAY\DEL4065\1"),
                HardwareId::from(r"DISPLAY\SAM0B54\2"),
            ]
        );
    }

    #[test]
    fn test_without_registry_export() {
        let s = HostSnapshot::new(DEFAULT_ENUM_ROOT);
        assert!(s.list_live_displays().unwrap().is_empty());
        assert!(matches!(
            s.list_config_candidates("DISPLAY"),
            Err(SourceError::Unavailable(_))
        ));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let displays = dir.path().join("displays.json");
        let registry = dir.path().join("enum.reg");
        std::fs::write(
            &displays,
            r#"[{"Caption":"Dell","PNPDeviceID":"DISPLAY\\DEL4065\\1","Availability":3}]"#,
        )
        .unwrap();
        std::fs::write(&registry, EXPORT).unwrap();

        let s = HostSnapshot::load(DEFAULT_ENUM_ROOT, Some(&displays), Some(&registry)).unwrap();
        let live = s.list_live_displays().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].availability_code, Some(3));
        assert_eq!(s.child_names("DISPLAY").unwrap().len(), 2);

        std::fs::write(&displays, "[{").unwrap();
        assert!(matches!(
            HostSnapshot::load(DEFAULT_ENUM_ROOT, Some(&displays), None),
            Err(SnapshotError::Json(_))
        ));
        assert!(matches!(
            HostSnapshot::load(DEFAULT_ENUM_ROOT, Some(&dir.path().join("none.json")), None),
            Err(SnapshotError::Io(_))
        ));
    }
}
