//! Live display rows captured from `Win32_DesktopMonitor`
//!
//! Collected on the host with e.g.
//! `Get-CimInstance Win32_DesktopMonitor | ConvertTo-Json`.

use moncensus_core::{HardwareId, LiveDisplay};
use serde::Deserialize;

/// `ConvertTo-Json` writes a bare value for single-element results
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// One `Win32_DesktopMonitor` instance, keyed by WMI property names
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DesktopMonitorRow {
    pub caption: Option<String>,
    pub monitor_manufacturer: Option<String>,
    pub monitor_type: Option<String>,
    pub screen_width: Option<u32>,
    pub screen_height: Option<u32>,
    pub pixels_per_x_logical_inch: Option<u32>,
    pub pixels_per_y_logical_inch: Option<u32>,
    pub availability: Option<i64>,
    pub power_management_capabilities: Option<OneOrMany<i64>>,
    #[serde(rename = "PNPDeviceID")]
    pub pnp_device_id: Option<String>,
    #[serde(rename = "DeviceID")]
    pub device_id: Option<String>,
}

impl From<DesktopMonitorRow> for LiveDisplay {
    fn from(row: DesktopMonitorRow) -> Self {
        Self {
            device_id: row.device_id,
            model_caption: row.caption,
            manufacturer_hint: row.monitor_manufacturer,
            monitor_type: row.monitor_type,
            pixels_per_x_inch: row.pixels_per_x_logical_inch,
            pixels_per_y_inch: row.pixels_per_y_logical_inch,
            screen_width: row.screen_width,
            screen_height: row.screen_height,
            availability_code: row.availability,
            power_capability_code: row
                .power_management_capabilities
                .and_then(|caps| caps.into_vec().into_iter().next()),
            pnp_device_id: row
                .pnp_device_id
                .filter(|id| !id.is_empty())
                .map(HardwareId::new),
        }
    }
}

/// Parse a JSON snapshot (array or single object) into live displays
pub fn parse_live_displays(json: &str) -> Result<Vec<LiveDisplay>, serde_json::Error> {
    let json = json.trim_start_matches('\u{feff}');
    let rows: OneOrMany<DesktopMonitorRow> = serde_json::from_str(json)?;
    Ok(rows.into_vec().into_iter().map(LiveDisplay::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let json = r#"[
            {
                "Caption": "Dell U2410(Digital)",
                "MonitorManufacturer": "Dell Inc.",
                "MonitorType": "Dell U2410(Digital)",
                "ScreenWidth": 1920,
                "ScreenHeight": 1200,
                "PixelsPerXLogicalInch": 96,
                "PixelsPerYLogicalInch": 96,
                "Availability": 3,
                "PowerManagementCapabilities": null,
                "PNPDeviceID": "DISPLAY\\DEL4065\\5&1A2B3C&0&UID4352",
                "DeviceID": "DesktopMonitor1"
            },
            {
                "Caption": "Default Monitor",
                "Availability": 8,
                "PowerManagementCapabilities": [4, 3],
                "PNPDeviceID": "",
                "DeviceID": "DesktopMonitor2"
            }
        ]"#;

        let displays = parse_live_displays(json).unwrap();
        assert_eq!(displays.len(), 2);

        let dell = &displays[0];
        assert_eq!(dell.model_caption.as_deref(), Some("Dell U2410(Digital)"));
        assert_eq!(dell.manufacturer_hint.as_deref(), Some("Dell Inc."));
        assert_eq!(dell.screen_width, Some(1920));
        assert_eq!(dell.pixels_per_y_inch, Some(96));
        assert_eq!(dell.availability_code, Some(3));
        assert_eq!(dell.power_capability_code, None);
        assert_eq!(
            dell.pnp_device_id.as_ref().map(HardwareId::as_str),
            Some(r"DISPLAY\DEL4065\5&1A2B3C&0&UID4352")
        );

        let default = &displays[1];
        assert_eq!(default.power_capability_code, Some(4));
        assert_eq!(default.pnp_device_id, None);
        assert_eq!(default.screen_width, None);
    }

    #[test]
    fn test_single_object_with_bom() {
        let json = "\u{feff}{\"Caption\":\"Generic PnP Monitor\",\"PowerManagementCapabilities\":3}";
        let displays = parse_live_displays(json).unwrap();
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].power_capability_code, Some(3));
    }

    #[test]
    fn test_invalid_json() {
        assert!(parse_live_displays("{not json").is_err());
    }
}
