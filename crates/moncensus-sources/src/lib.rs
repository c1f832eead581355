//! Moncensus Sources - Offline monitor data captured from Windows hosts
//!
//! This crate provides [`moncensus_core::RawSourceProvider`] implementations
//! backed by files:
//! - Registry exports (`.reg`) of the device enumeration tree
//! - `Win32_DesktopMonitor` JSON captures of the live displays

pub mod live;
pub mod regfile;
pub mod snapshot;

pub use live::{parse_live_displays, DesktopMonitorRow};
pub use regfile::{RegFileError, RegValue, RegistryHive};
pub use snapshot::{HostSnapshot, SnapshotError, DEFAULT_ENUM_ROOT};
