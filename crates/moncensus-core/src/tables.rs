//! Static code tables for monitor status and vendor names

use std::collections::HashMap;

/// Availability text when the code is absent or unmapped
pub const UNKNOWN_AVAILABILITY: &str = "Unknown Status";

/// Power management text when nothing better is known
pub const UNKNOWN_POWER: &str = "Unknown";

const AVAILABILITY: [(i64, &str); 17] = [
    (1, "Other"),
    (2, "Unknown"),
    (3, "Running or Full Power"),
    (4, "Warning"),
    (5, "In Test"),
    (6, "Not Applicable"),
    (7, "Power Off"),
    (8, "Off Line"),
    (9, "Off Duty"),
    (10, "Degraded"),
    (11, "Not Installed"),
    (12, "Install Error"),
    (13, "Power Save - Unknown"),
    (14, "Power Save - Low Power Mode"),
    (15, "Power Save - Standby"),
    (16, "Power Cycle"),
    (17, "Power Save - Warning"),
];

const POWER_CAPABILITY: [(i64, &str); 8] = [
    (0, "Unknown"),
    (1, "Not Supported"),
    (2, "Disabled"),
    (3, "Enabled"),
    (4, "Power Saving Modes Entered Automatically"),
    (5, "Power State Settable"),
    (6, "Power Cycling Supported"),
    (7, "Timed Power-On Supported"),
];

/// PNP vendor codes with a canonical display name
const VENDOR_NAMES: [(&str, &str); 5] = [
    ("SAM", "Samsung"),
    ("DEL", "Dell"),
    ("VSC", "Viewsonic"),
    ("ACR", "Acer"),
    ("PGS", "Princeton"),
];

/// Map a `Win32_DesktopMonitor.Availability` code to its description
pub fn availability_text(code: Option<i64>) -> &'static str {
    code.and_then(|code| AVAILABILITY.iter().find(|(c, _)| *c == code))
        .map(|(_, text)| *text)
        .unwrap_or(UNKNOWN_AVAILABILITY)
}

/// Map a power management capability code to its description
pub fn power_capability_text(code: Option<i64>) -> &'static str {
    let code = code.unwrap_or(0);
    POWER_CAPABILITY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, text)| *text)
        .unwrap_or(UNKNOWN_POWER)
}

/// Vendor code to name lookup: built-in names plus configured additions
#[derive(Debug, Clone, Default)]
pub struct VendorTable {
    extra: HashMap<String, String>,
}

impl VendorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add configured vendor names. Codes are upper-cased to match decoded
    /// letter codes; empty names are ignored.
    pub fn with_names<I, K, V>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (code, name) in names {
            let name = name.into();
            if !name.is_empty() {
                self.extra.insert(code.into().to_uppercase(), name);
            }
        }
        self
    }

    /// Canonical name for a vendor code, if one is known
    pub fn name_for(&self, code: &str) -> Option<&str> {
        VENDOR_NAMES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
            .or_else(|| self.extra.get(code).map(String::as_str))
    }

    /// Display name for a vendor code: the canonical name when known,
    /// otherwise the code with one trailing `_` removed.
    pub fn resolve(&self, code: &str) -> String {
        if let Some(name) = self.name_for(code) {
            return name.to_string();
        }
        match code.strip_suffix('_') {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => code.to_string(),
        }
    }
}
