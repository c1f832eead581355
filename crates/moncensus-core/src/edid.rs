//! EDID base block decoding
//!
//! Decodes the 128-byte EDID 1.x base block exposed by a display into a
//! partial [`MonitorRecord`]. Decoding never fails: fields whose bytes are
//! missing from a truncated block are simply left empty, and blocks that
//! declare version 2.0 or later only report their version.

use chrono::Datelike;
use tracing::{debug, trace};

use crate::hwid::HardwareId;
use crate::monitor::{InputSignal, MonitorRecord};
use crate::tables::{VendorTable, UNKNOWN_AVAILABILITY, UNKNOWN_POWER};

/// Registry value holding the EDID block
pub const EDID_VALUE_NAME: &str = "EDID";

/// Bytes in an EDID base block
pub const EDID_BLOCK_LEN: usize = 128;

const VERSION_OFFSET: usize = 18;
const REVISION_OFFSET: usize = 19;
const MANUFACTURER_OFFSET: usize = 8;
const PRODUCT_OFFSET: usize = 10;
const SERIAL_OFFSET: usize = 12;
const YEAR_OFFSET: usize = 17;
const INPUT_OFFSET: usize = 20;
const GAMMA_OFFSET: usize = 23;
const FEATURES_OFFSET: usize = 24;

/// First year representable by the manufacture year byte
const YEAR_BASE: i32 = 1990;

const DESCRIPTOR_OFFSETS: [usize; 4] = [54, 72, 90, 108];
const DESCRIPTOR_LEN: usize = 18;
const DESCRIPTOR_HEADER_LEN: usize = 4;

const SERIAL_DESCRIPTOR: [u8; 4] = [0x00, 0x00, 0x00, 0xFF];
const NAME_DESCRIPTOR: [u8; 4] = [0x00, 0x00, 0x00, 0xFC];

const DIGITAL_INPUT: u8 = 0x80;
const FEATURE_STANDBY: u8 = 0x80;
const FEATURE_SUSPEND_MASK: u8 = 0x40;
const FEATURE_SUSPEND_MATCH: u8 = 0x41;

/// Decoder for EDID base blocks
#[derive(Debug, Clone)]
pub struct EdidDecoder {
    /// Latest plausible manufacture year
    reference_year: i32,
    vendors: VendorTable,
}

impl Default for EdidDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EdidDecoder {
    /// Create a decoder that checks manufacture years against today
    pub fn new() -> Self {
        Self {
            reference_year: chrono::Local::now().year(),
            vendors: VendorTable::new(),
        }
    }

    /// Use a fixed "current year" instead of the wall clock
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    /// Use a vendor table with additional code to name mappings
    pub fn with_vendors(mut self, vendors: VendorTable) -> Self {
        self.vendors = vendors;
        self
    }

    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Decode `raw` read for `hardware_id` into a partial monitor record
    pub fn decode(&self, hardware_id: &HardwareId, raw: &[u8]) -> MonitorRecord {
        let mut record = MonitorRecord::new(hardware_id);

        if raw.len() < EDID_BLOCK_LEN {
            debug!(hwid = %hardware_id, len = raw.len(), "EDID block is truncated");
        }

        let (version, revision) = match (raw.get(VERSION_OFFSET), raw.get(REVISION_OFFSET)) {
            (Some(&version), Some(&revision)) => (version, revision),
            _ => return record,
        };
        record.edid_version = Some(format!("{:X}.{:X}", version, revision));
        if version >= 2 {
            debug!(hwid = %hardware_id, version, "EDID version not supported, keeping version only");
            return record;
        }

        record.manufacturer_id = byte_pair(raw, MANUFACTURER_OFFSET)
            .map(|(first, second)| self.manufacturer_name(first, second));

        record.manufacture_date = raw
            .get(YEAR_OFFSET)
            .map(|&year| i32::from(year) + YEAR_BASE)
            .filter(|&year| year <= self.reference_year);

        record.product_id = byte_pair(raw, PRODUCT_OFFSET)
            .map(|(lo, hi)| u32::from(u16::from_le_bytes([lo, hi])))
            .and_then(numbered);

        let serial = raw
            .get(SERIAL_OFFSET..SERIAL_OFFSET + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        record.hardware_number = serial.and_then(numbered);

        for offset in DESCRIPTOR_OFFSETS {
            let Some(block) = raw.get(offset..offset + DESCRIPTOR_LEN) else {
                continue;
            };
            let (header, payload) = block.split_at(DESCRIPTOR_HEADER_LEN);
            let text = descriptor_text(payload);
            if text.is_empty() {
                continue;
            }
            trace!(hwid = %hardware_id, offset, header = ?header, text = %text, "EDID descriptor");

            if header == SERIAL_DESCRIPTOR {
                if text != "0" {
                    let hex = raw
                        .get(SERIAL_OFFSET..SERIAL_OFFSET + 4)
                        .map(|b| joined_hex(b.iter().rev()))
                        .unwrap_or_default();
                    record.hardware_number = Some(format!("{} (0x{})", text, hex));
                }
            } else if header == NAME_DESCRIPTOR {
                record.model_name =
                    Some(qualify_model_name(record.manufacturer_id.as_deref(), &text));
            }
        }

        if record.model_name.is_none() {
            record.model_name = hardware_id.display_model_segment().map(str::to_string);
        }

        record.input_signal = raw.get(INPUT_OFFSET).map(|&input| {
            if input & DIGITAL_INPUT == DIGITAL_INPUT {
                InputSignal::Digital
            } else {
                InputSignal::Analog
            }
        });

        record.gamma_value = raw.get(GAMMA_OFFSET).map(|&gamma| gamma_value(gamma));

        let features = raw.get(FEATURES_OFFSET).map(|&f| power_features(f));
        record.power_saving_mgmt = Some(
            features
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| UNKNOWN_POWER.to_string()),
        );
        record.availability = Some(UNKNOWN_AVAILABILITY.to_string());

        record
    }

    /// Resolve the manufacturer from EDID bytes 8 and 9. Without a letter
    /// code the id is reported numerically from the joined byte hex, byte 9
    /// first.
    fn manufacturer_name(&self, first: u8, second: u8) -> String {
        match vendor_code(first, second) {
            Some(code) => self.vendors.resolve(&code),
            None => {
                let hex = joined_hex([second, first].iter());
                let value = u32::from_str_radix(&hex, 16).unwrap_or_default();
                format!("{} (0x{})", value, hex)
            }
        }
    }
}

/// Unpack the three 5-bit letters of a PNP vendor id.
///
/// A letter value of zero marks the id as unset and no code is produced.
pub fn vendor_code(hi: u8, lo: u8) -> Option<String> {
    let packed = u16::from_be_bytes([hi, lo]);
    let letters = [(packed >> 10) & 0x1F, (packed >> 5) & 0x1F, packed & 0x1F];
    if letters.contains(&0) {
        return None;
    }
    Some(
        letters
            .iter()
            .map(|&value| char::from(b'@' + value as u8))
            .collect(),
    )
}

/// Prefix a descriptor model name with the manufacturer unless it already
/// starts with it (compared case-insensitively).
pub fn qualify_model_name(manufacturer: Option<&str>, name: &str) -> String {
    match manufacturer.filter(|m| !m.is_empty()) {
        Some(manufacturer) if !name.to_uppercase().starts_with(&manufacturer.to_uppercase()) => {
            format!("{} {}", manufacturer, name)
        }
        _ => name.to_string(),
    }
}

/// Display gamma stored as `(gamma * 100) - 100`
pub fn gamma_value(raw: u8) -> f64 {
    (f64::from(raw) + 100.0) / 100.0
}

/// Names of the DPMS power states advertised by the feature support byte
#[allow(clippy::bad_bit_mask)]
pub fn power_features(features: u8) -> String {
    let mut tokens: Vec<&str> = Vec::new();
    if features & FEATURE_STANDBY == FEATURE_STANDBY {
        tokens.push("Standby");
    }
    // The mask can never equal its match value: suspend and active-off
    // are never reported.
    if features & FEATURE_SUSPEND_MASK == FEATURE_SUSPEND_MATCH {
        tokens.push("Suspend");
    }
    if features & FEATURE_SUSPEND_MASK == FEATURE_SUSPEND_MATCH {
        tokens.push("Active-off/low power");
    }
    tokens.join(", ")
}

/// Text payload of a display descriptor
fn descriptor_text(payload: &[u8]) -> String {
    let text: String = payload.iter().map(|&b| char::from(b)).collect();
    let text = text.trim_end();
    text.strip_prefix('\0').unwrap_or(text).to_string()
}

fn byte_pair(raw: &[u8], offset: usize) -> Option<(u8, u8)> {
    Some((*raw.get(offset)?, *raw.get(offset + 1)?))
}

/// Unpadded uppercase hex of each byte, concatenated
fn joined_hex<'a>(bytes: impl Iterator<Item = &'a u8>) -> String {
    bytes.map(|b| format!("{:X}", b)).collect()
}

/// `"{decimal} (0x{hex})"`, or nothing for zero
fn numbered(value: u32) -> Option<String> {
    (value != 0).then(|| format!("{} (0x{:X})", value, value))
}
