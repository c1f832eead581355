//! Monitor catalog that reconciles the live and configuration channels
//!
//! Monitors are discovered twice: once by the live device enumeration
//! (trusted, carries resolution and power state) and once by walking the
//! configuration store (every monitor ever installed, EDID only). The
//! catalog keys both on hardware id identity, so each physical monitor is
//! reported once, live entries first.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::edid::{EdidDecoder, EDID_VALUE_NAME};
use crate::hwid::{HardwareId, SEPARATOR};
use crate::monitor::MonitorRecord;
use crate::source::{
    device_parameters_path, LiveDisplay, RawSourceProvider, DEVICE_DESCRIPTION_VALUE,
};
use crate::tables::{availability_text, power_capability_text};
use crate::validator::HardwareIdValidator;

/// Configuration-store key that holds display-class devices
pub const DISPLAY_CLASS: &str = "DISPLAY";

/// Device descriptions containing any of these are generic driver names
const GENERIC_DESCRIPTION_MARKERS: [&str; 3] = ["Standard", "Default", ";"];

/// Options for a catalog build
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Configuration-store key walked for candidates
    pub display_class: String,
    /// Identities excluded in addition to the built-in denylist
    pub denylist: Vec<HardwareId>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            display_class: DISPLAY_CLASS.to_string(),
            denylist: Vec::new(),
        }
    }
}

/// Ordered, identity-keyed set of monitors for one host and one run
pub struct MonitorCatalog<'a, S: RawSourceProvider + ?Sized> {
    source: &'a S,
    decoder: &'a EdidDecoder,
    denylist: Vec<HardwareId>,
    records: Vec<MonitorRecord>,
    index: HashMap<HardwareId, usize>,
}

impl<'a, S: RawSourceProvider + ?Sized> MonitorCatalog<'a, S> {
    pub fn new(source: &'a S, decoder: &'a EdidDecoder) -> Self {
        Self {
            source,
            decoder,
            denylist: Vec::new(),
            records: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Exclude additional identities. Full instance ids
    /// (`class\model\instance`) are reduced to their identity.
    pub fn with_denylist(mut self, denylist: impl IntoIterator<Item = HardwareId>) -> Self {
        self.denylist.extend(denylist.into_iter().map(|id| {
            if id.as_str().matches(SEPARATOR).count() >= 2 {
                id.identity()
            } else {
                id
            }
        }));
        self
    }

    /// Reconcile both channels into the final, ordered monitor list.
    ///
    /// Live candidates are seeded first and enriched from their EDID; config
    /// candidates only contribute identities the live channel did not see.
    /// PnP ids are lookup metadata and are cleared from the result.
    pub fn merge(
        mut self,
        live_candidates: &[LiveDisplay],
        config_candidates: &[HardwareId],
    ) -> Vec<MonitorRecord> {
        // Phase 1: seed records from the live channel
        for live in live_candidates {
            let Some(record) = seed_from_live(live) else {
                debug!(device = ?live.device_id, "Live display has no PnP id, skipping");
                continue;
            };
            if self.admits(&record.hardware_id) {
                self.insert(record);
            }
        }
        let live_count = self.records.len();

        // Phase 2: fill the gaps of live records from their EDID
        for position in 0..live_count {
            let Some(pnp_id) = self.records[position].pnp_device_id.clone() else {
                continue;
            };
            if let Some(raw) = self.read_edid(&pnp_id) {
                let decoded = self.decoder.decode(&pnp_id, &raw);
                self.records[position].fill_gaps(decoded);
            }
        }

        // Phase 3: config-only monitors
        let validator = HardwareIdValidator::new(self.source);
        for candidate in config_candidates {
            let identity = candidate.identity();
            if self.index.contains_key(&identity) || !self.admits(&identity) {
                continue;
            }
            if !validator.is_genuine(candidate) {
                continue;
            }
            let Some(raw) = self.read_edid(candidate) else {
                continue;
            };

            let mut record = self.decoder.decode(candidate, &raw);
            if let Some(description) = self.device_description(candidate) {
                record.model_name = Some(description);
            }
            self.insert(record);
        }

        info!(
            live = live_count,
            config_only = self.records.len() - live_count,
            total = self.records.len(),
            "Monitor catalog built"
        );

        self.records
            .into_iter()
            .map(|mut record| {
                record.pnp_device_id = None;
                record
            })
            .collect()
    }

    fn admits(&self, identity: &HardwareId) -> bool {
        if identity.is_empty() {
            return false;
        }
        if identity.is_denylisted() || self.denylist.contains(identity) {
            debug!(hwid = %identity, "Identity is denylisted");
            return false;
        }
        true
    }

    fn insert(&mut self, record: MonitorRecord) {
        if self.index.contains_key(&record.hardware_id) {
            return;
        }
        self.index
            .insert(record.hardware_id.clone(), self.records.len());
        self.records.push(record);
    }

    fn read_edid(&self, hardware_id: &HardwareId) -> Option<Vec<u8>> {
        let path = device_parameters_path(hardware_id);
        match self.source.read_binary_value(&path, EDID_VALUE_NAME) {
            Ok(Some(raw)) => Some(raw),
            Ok(None) => {
                debug!(hwid = %hardware_id, "No EDID stored for device");
                None
            }
            Err(e) => {
                warn!(hwid = %hardware_id, error = %e, "Failed to read EDID");
                None
            }
        }
    }

    /// Specific (non-generic) driver description of a device, if any
    fn device_description(&self, hardware_id: &HardwareId) -> Option<String> {
        let description = match self
            .source
            .read_string_value(hardware_id.as_str(), DEVICE_DESCRIPTION_VALUE)
        {
            Ok(description) => description?,
            Err(e) => {
                debug!(hwid = %hardware_id, error = %e, "No device description");
                return None;
            }
        };
        is_specific_description(&description).then_some(description)
    }
}

/// Build the catalog for one host: list both channels and merge them.
///
/// A channel that cannot be listed contributes nothing; the other channel
/// is still reconciled.
pub fn collect_monitors<S: RawSourceProvider + ?Sized>(
    source: &S,
    decoder: &EdidDecoder,
    options: &CatalogOptions,
) -> Vec<MonitorRecord> {
    let live = source.list_live_displays().unwrap_or_else(|e| {
        warn!(error = %e, "Live display enumeration unavailable");
        Vec::new()
    });
    let config = source
        .list_config_candidates(&options.display_class)
        .unwrap_or_else(|e| {
            warn!(error = %e, class = %options.display_class, "Configuration store unavailable");
            Vec::new()
        });

    debug!(
        live = live.len(),
        config = config.len(),
        "Monitor candidates listed"
    );

    MonitorCatalog::new(source, decoder)
        .with_denylist(options.denylist.iter().cloned())
        .merge(&live, &config)
}

/// Seed a record from a live display; `None` without a PnP id
fn seed_from_live(display: &LiveDisplay) -> Option<MonitorRecord> {
    let pnp_id = display.pnp_device_id.as_ref().filter(|id| !id.is_empty())?;
    let mut record = MonitorRecord::new(pnp_id);
    record.model_name = non_empty(&display.model_caption);
    record.manufacturer_id = non_empty(&display.manufacturer_hint);
    record.monitor_type = non_empty(&display.monitor_type);
    record.pixels_per_x_inch = display.pixels_per_x_inch;
    record.pixels_per_y_inch = display.pixels_per_y_inch;
    record.screen_width = display.screen_width;
    record.screen_height = display.screen_height;
    record.availability = Some(availability_text(display.availability_code).to_string());
    record.power_saving_mgmt =
        Some(power_capability_text(display.power_capability_code).to_string());
    Some(record)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn is_specific_description(description: &str) -> bool {
    !description.is_empty()
        && !GENERIC_DESCRIPTION_MARKERS
            .iter()
            .any(|marker| description.contains(marker))
}
