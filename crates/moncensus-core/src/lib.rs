//! Moncensus Core - EDID decoding and monitor catalog reconciliation
//!
//! This crate provides the host-independent part of monitor inventory:
//! - Hardware id handling (identity, denylist)
//! - EDID 1.x base block decoding into monitor records
//! - Validation of configuration-store candidates
//! - The catalog that merges live and configuration channels per host

pub mod catalog;
pub mod edid;
pub mod hwid;
pub mod monitor;
pub mod source;
pub mod tables;
pub mod validator;

pub use catalog::{collect_monitors, CatalogOptions, MonitorCatalog, DISPLAY_CLASS};
pub use edid::EdidDecoder;
pub use hwid::HardwareId;
pub use monitor::{InputSignal, MonitorRecord};
pub use source::{LiveDisplay, MemorySource, RawSourceProvider, SourceError};
pub use tables::VendorTable;
pub use validator::{HardwareIdValidator, Rejection};
