//! Per-host collection runs
//!
//! Every host gets its own snapshot and catalog. Runs are independent and
//! execute concurrently on the blocking pool.

use chrono::{DateTime, Utc};
use moncensus_core::{collect_monitors, CatalogOptions, EdidDecoder, MonitorRecord};
use moncensus_sources::{HostSnapshot, SnapshotError};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::{Config, HostConfig};

/// Result of one host run
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: String,
    #[serde(skip)]
    pub element_id: String,
    #[serde(skip)]
    pub collector_id: String,
    pub run_id: Uuid,
    pub collected_at: DateTime<Utc>,
    pub monitors: Vec<MonitorRecord>,
}

/// Settings shared by every host run
#[derive(Debug, Clone)]
pub struct CollectSettings {
    pub enum_root: String,
    pub catalog: CatalogOptions,
    pub decoder: EdidDecoder,
}

impl CollectSettings {
    pub fn from_config(config: &Config) -> Self {
        let mut decoder = EdidDecoder::new().with_vendors(config.vendor_table());
        if let Some(year) = config.collection.reference_year {
            decoder = decoder.with_reference_year(year);
        }
        Self {
            enum_root: config.collection.enum_root.clone(),
            catalog: CatalogOptions {
                display_class: config.collection.display_class.clone(),
                denylist: config.collection.denylist(),
            },
            decoder,
        }
    }
}

/// Collect one host: load its captures and build its catalog
pub fn collect_host(host: &HostConfig, settings: &CollectSettings) -> Result<HostReport, SnapshotError> {
    let run_id = Uuid::new_v4();
    let span = info_span!("collect", host = %host.name, %run_id);
    let _enter = span.enter();

    let snapshot = HostSnapshot::load(
        &settings.enum_root,
        host.displays.as_deref(),
        host.registry.as_deref(),
    )?;

    let monitors = collect_monitors(&snapshot, &settings.decoder, &settings.catalog);
    info!(monitors = monitors.len(), "Host collected");

    Ok(HostReport {
        host: host.name.clone(),
        element_id: host.element_id.clone(),
        collector_id: host.collector_id.clone(),
        run_id,
        collected_at: Utc::now(),
        monitors,
    })
}

/// Collect all hosts concurrently; reports keep the order of `hosts`.
///
/// Hosts whose captures cannot be loaded are logged and skipped.
pub async fn collect_hosts(hosts: Vec<HostConfig>, settings: Arc<CollectSettings>) -> Vec<HostReport> {
    let mut runs = JoinSet::new();
    for (index, host) in hosts.into_iter().enumerate() {
        let settings = Arc::clone(&settings);
        runs.spawn_blocking(move || {
            let result = collect_host(&host, &settings);
            (index, host.name, result)
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok((index, _, Ok(report))) => reports.push((index, report)),
            Ok((_, host, Err(e))) => {
                warn!(host = %host, error = %e, "Failed to load host captures, skipping");
            }
            Err(e) => error!(error = %e, "Collection task failed"),
        }
    }

    reports.sort_by_key(|(index, _)| *index);
    reports.into_iter().map(|(_, report)| report).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    const EXPORT: &str = r#"Windows Registry Editor Version 5.00

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\DEL4065\5&1a2b3c&0&UID4352\Device Parameters]
"EDID"=hex:00,ff,ff,ff,ff,ff,ff,00,10,ac,65,40,53,4b,42,30,00,14,01,03,80,34,21,\
  78,ea

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\NEC61BE\1\Device Parameters]
"EDID"=hex:00,ff,ff,ff,ff,ff,ff,00,38,a3,be,61,00,00,00,00,00,14,01,03,80

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\GSM5B7F\1]
"DeviceDesc"="LG ULTRAWIDE"

[HKEY_LOCAL_MACHINE\SYSTEM\CurrentControlSet\Enum\DISPLAY\GSM5B7F\1\Device Parameters]
"EDID"=hex:00,ff,ff,ff,ff,ff,ff,00,1e,6d,7f,5b,00,00,00,00,00,1a,01,03,80
"#;

    const DISPLAYS: &str = r#"[{
        "Caption": "Dell U2410(Digital)",
        "MonitorManufacturer": "Dell",
        "ScreenWidth": 1920,
        "ScreenHeight": 1200,
        "Availability": 3,
        "PNPDeviceID": "DISPLAY\\DEL4065\\5&1A2B3C&0&UID4352",
        "DeviceID": "DesktopMonitor1"
    }]"#;

    fn write_captures(dir: &Path) -> (PathBuf, PathBuf) {
        let displays = dir.join("displays.json");
        let registry = dir.join("enum.reg");
        std::fs::write(&displays, DISPLAYS).unwrap();
        std::fs::write(&registry, EXPORT).unwrap();
        (displays, registry)
    }

    fn host(name: &str, displays: Option<PathBuf>, registry: Option<PathBuf>) -> HostConfig {
        HostConfig {
            name: name.to_string(),
            displays,
            registry,
            element_id: "1".to_string(),
            collector_id: "1".to_string(),
        }
    }

    fn settings() -> CollectSettings {
        let mut config = Config::default();
        config.collection.reference_year = Some(2024);
        CollectSettings::from_config(&config)
    }

    #[test]
    fn test_collect_host() {
        let dir = tempfile::tempdir().unwrap();
        let (displays, registry) = write_captures(dir.path());

        let report = collect_host(&host("ws-01", Some(displays), Some(registry)), &settings()).unwrap();
        let ids: Vec<&str> = report.monitors.iter().map(|m| m.hardware_id.as_str()).collect();
        assert_eq!(ids, vec![r"DISPLAY\DEL4065", r"DISPLAY\GSM5B7F"]);

        let dell = &report.monitors[0];
        assert_eq!(dell.model_name.as_deref(), Some("Dell U2410(Digital)"));
        assert_eq!(dell.manufacturer_id.as_deref(), Some("Dell"));
        assert_eq!(dell.product_id.as_deref(), Some("16485 (0x4065)"));
        assert_eq!(dell.manufacture_date, Some(2010));
        assert_eq!(dell.power_saving_mgmt.as_deref(), Some("Standby"));
        assert_eq!(dell.availability.as_deref(), Some("Running or Full Power"));

        let lg = &report.monitors[1];
        assert_eq!(lg.model_name.as_deref(), Some("LG ULTRAWIDE"));
        assert_eq!(lg.manufacture_date, Some(2016));
        assert_eq!(lg.gamma_value, None);
        assert_eq!(lg.power_saving_mgmt.as_deref(), Some("Unknown"));
    }

    #[tokio::test]
    async fn test_collect_hosts_skips_broken_captures() {
        let dir = tempfile::tempdir().unwrap();
        let (displays, registry) = write_captures(dir.path());
        let hosts = vec![
            host("ws-01", Some(displays.clone()), Some(registry)),
            host("broken", None, Some(dir.path().join("missing.reg"))),
            host("live-only", Some(displays), None),
        ];

        let reports = collect_hosts(hosts, Arc::new(settings())).await;
        let names: Vec<&str> = reports.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(names, vec!["ws-01", "live-only"]);
        assert_eq!(reports[0].monitors.len(), 2);
        assert_eq!(reports[1].monitors.len(), 1);
        assert_ne!(reports[0].run_id, reports[1].run_id);
    }
}
