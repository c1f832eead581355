//! Monitor records produced by a collection run

use serde::{Deserialize, Serialize};

use crate::hwid::HardwareId;
use crate::tables::UNKNOWN_POWER;

/// Video input type declared by the EDID basic display parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSignal {
    Digital,
    Analog,
}

impl InputSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "Digital",
            Self::Analog => "Analog",
        }
    }
}

impl std::fmt::Display for InputSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One physical monitor as reported to the inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorRecord {
    /// Identity: hardware id without its instance segment
    #[serde(rename = "HardwareId")]
    pub hardware_id: HardwareId,
    #[serde(rename = "ModelName", default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(rename = "ManufacturerID", default, skip_serializing_if = "Option::is_none")]
    pub manufacturer_id: Option<String>,
    #[serde(rename = "ProductID", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Serial number
    #[serde(rename = "HardwareNumber", default, skip_serializing_if = "Option::is_none")]
    pub hardware_number: Option<String>,
    /// Year of manufacture
    #[serde(rename = "ManufactureDate", default, skip_serializing_if = "Option::is_none")]
    pub manufacture_date: Option<i32>,
    #[serde(rename = "EDID_Version", default, skip_serializing_if = "Option::is_none")]
    pub edid_version: Option<String>,
    #[serde(rename = "InputSignal", default, skip_serializing_if = "Option::is_none")]
    pub input_signal: Option<InputSignal>,
    #[serde(rename = "GammaValue", default, skip_serializing_if = "Option::is_none")]
    pub gamma_value: Option<f64>,
    #[serde(rename = "PowerSavingMgmt", default, skip_serializing_if = "Option::is_none")]
    pub power_saving_mgmt: Option<String>,
    #[serde(rename = "Availability", default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(rename = "MonitorType", default, skip_serializing_if = "Option::is_none")]
    pub monitor_type: Option<String>,
    #[serde(rename = "ScreenWidth", default, skip_serializing_if = "Option::is_none")]
    pub screen_width: Option<u32>,
    #[serde(rename = "ScreenHeight", default, skip_serializing_if = "Option::is_none")]
    pub screen_height: Option<u32>,
    #[serde(rename = "PixelsPerXInch", default, skip_serializing_if = "Option::is_none")]
    pub pixels_per_x_inch: Option<u32>,
    #[serde(rename = "PixelsPerYInch", default, skip_serializing_if = "Option::is_none")]
    pub pixels_per_y_inch: Option<u32>,
    /// Full hardware id used for EDID lookup; never emitted
    #[serde(skip)]
    pub pnp_device_id: Option<HardwareId>,
}

impl MonitorRecord {
    /// Create an empty record keyed by `hardware_id`'s identity
    pub fn new(hardware_id: &HardwareId) -> Self {
        Self {
            hardware_id: hardware_id.identity(),
            model_name: None,
            manufacturer_id: None,
            product_id: None,
            hardware_number: None,
            manufacture_date: None,
            edid_version: None,
            input_signal: None,
            gamma_value: None,
            power_saving_mgmt: None,
            availability: None,
            monitor_type: None,
            screen_width: None,
            screen_height: None,
            pixels_per_x_inch: None,
            pixels_per_y_inch: None,
            pnp_device_id: Some(hardware_id.clone()),
        }
    }

    /// Copy fields from `other` into fields that are still empty here.
    ///
    /// Populated fields are never replaced. The one placeholder treated as a
    /// gap is the "Unknown" power management text.
    pub fn fill_gaps(&mut self, other: MonitorRecord) {
        fill(&mut self.model_name, other.model_name);
        fill(&mut self.manufacturer_id, other.manufacturer_id);
        fill(&mut self.product_id, other.product_id);
        fill(&mut self.hardware_number, other.hardware_number);
        fill(&mut self.manufacture_date, other.manufacture_date);
        fill(&mut self.edid_version, other.edid_version);
        fill(&mut self.input_signal, other.input_signal);
        fill(&mut self.gamma_value, other.gamma_value);
        fill(&mut self.availability, other.availability);
        fill(&mut self.monitor_type, other.monitor_type);
        fill(&mut self.screen_width, other.screen_width);
        fill(&mut self.screen_height, other.screen_height);
        fill(&mut self.pixels_per_x_inch, other.pixels_per_x_inch);
        fill(&mut self.pixels_per_y_inch, other.pixels_per_y_inch);
        fill(&mut self.pnp_device_id, other.pnp_device_id);

        if self.power_saving_mgmt.as_deref() == Some(UNKNOWN_POWER) {
            if let Some(power) = other.power_saving_mgmt.filter(|p| p != UNKNOWN_POWER) {
                self.power_saving_mgmt = Some(power);
            }
        } else {
            fill(&mut self.power_saving_mgmt, other.power_saving_mgmt);
        }
    }

    /// Wire name/value pairs for every populated field, in report order.
    /// The identity and PnP id are lookup keys and are not included.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        push(&mut fields, "ModelName", self.model_name.as_ref());
        push(&mut fields, "ManufacturerID", self.manufacturer_id.as_ref());
        push(&mut fields, "ProductID", self.product_id.as_ref());
        push(&mut fields, "HardwareNumber", self.hardware_number.as_ref());
        push(&mut fields, "ManufactureDate", self.manufacture_date.as_ref());
        push(&mut fields, "EDID_Version", self.edid_version.as_ref());
        push(&mut fields, "InputSignal", self.input_signal.as_ref());
        push(&mut fields, "GammaValue", self.gamma_value.as_ref());
        push(&mut fields, "PowerSavingMgmt", self.power_saving_mgmt.as_ref());
        push(&mut fields, "Availability", self.availability.as_ref());
        push(&mut fields, "MonitorType", self.monitor_type.as_ref());
        push(&mut fields, "ScreenWidth", self.screen_width.as_ref());
        push(&mut fields, "ScreenHeight", self.screen_height.as_ref());
        push(&mut fields, "PixelsPerXInch", self.pixels_per_x_inch.as_ref());
        push(&mut fields, "PixelsPerYInch", self.pixels_per_y_inch.as_ref());
        fields
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn push<T: std::fmt::Display>(
    fields: &mut Vec<(&'static str, String)>,
    name: &'static str,
    value: Option<&T>,
) {
    if let Some(value) = value {
        let text = value.to_string();
        if !text.is_empty() {
            fields.push((name, text));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> MonitorRecord {
        MonitorRecord::new(&HardwareId::from(r"DISPLAY\DEL4065\5&1a2b3c&0&UID4352"))
    }

    #[test]
    fn test_new_record_keys_on_identity() {
        let r = record();
        assert_eq!(r.hardware_id.as_str(), r"DISPLAY\DEL4065");
        assert_eq!(
            r.pnp_device_id.as_ref().map(HardwareId::as_str),
            Some(r"DISPLAY\DEL4065\5&1a2b3c&0&UID4352")
        );
    }

    #[test]
    fn test_fill_gaps_keeps_populated_fields() {
        let mut live = record();
        live.manufacturer_id = Some("Dell".to_string());

        let mut edid = record();
        edid.manufacturer_id = Some("Samsung".to_string());
        edid.gamma_value = Some(2.2);

        live.fill_gaps(edid);
        assert_eq!(live.manufacturer_id.as_deref(), Some("Dell"));
        assert_eq!(live.gamma_value, Some(2.2));
    }

    #[test]
    fn test_unknown_power_is_a_gap() {
        let mut live = record();
        live.power_saving_mgmt = Some(UNKNOWN_POWER.to_string());
        let mut edid = record();
        edid.power_saving_mgmt = Some("Standby".to_string());
        live.fill_gaps(edid);
        assert_eq!(live.power_saving_mgmt.as_deref(), Some("Standby"));

        let mut live = record();
        live.power_saving_mgmt = Some("Enabled".to_string());
        let mut edid = record();
        edid.power_saving_mgmt = Some("Standby".to_string());
        live.fill_gaps(edid);
        assert_eq!(live.power_saving_mgmt.as_deref(), Some("Enabled"));
    }

    #[test]
    fn test_fields_skip_empty_and_internal() {
        let mut r = record();
        r.model_name = Some("Dell U2410".to_string());
        r.monitor_type = Some(String::new());
        r.input_signal = Some(InputSignal::Digital);
        r.gamma_value = Some(2.2);
        r.manufacture_date = Some(2010);

        let fields = r.fields();
        assert_eq!(
            fields,
            vec![
                ("ModelName", "Dell U2410".to_string()),
                ("ManufactureDate", "2010".to_string()),
                ("InputSignal", "Digital".to_string()),
                ("GammaValue", "2.2".to_string()),
            ]
        );
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let mut r = record();
        r.edid_version = Some("1.3".to_string());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["HardwareId"], r"DISPLAY\DEL4065");
        assert_eq!(json["EDID_Version"], "1.3");
        assert!(json.get("ModelName").is_none());
        assert!(json.get("pnp_device_id").is_none());
    }
}
