//! Hardware id validation for configuration-store candidates
//!
//! The configuration store keeps keys for every monitor ever attached to
//! the host. Only instances that carry a `Device Parameters` child were
//! fully installed and hold an EDID worth decoding.

use thiserror::Error;
use tracing::debug;

use crate::hwid::HardwareId;
use crate::source::{RawSourceProvider, SourceError, DEVICE_PARAMETERS};

/// Why a candidate was not accepted
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("no Device Parameters key under {0}")]
    MissingDeviceParameters(HardwareId),
    #[error("cannot list {id}: {source}")]
    Unreadable {
        id: HardwareId,
        #[source]
        source: SourceError,
    },
}

/// Confirms that a candidate id belongs to a genuine device instance
pub struct HardwareIdValidator<'a, S: RawSourceProvider + ?Sized> {
    source: &'a S,
}

impl<'a, S: RawSourceProvider + ?Sized> HardwareIdValidator<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Check a candidate, reporting why it was rejected
    pub fn check(&self, candidate: &HardwareId) -> Result<(), Rejection> {
        let children = self
            .source
            .child_names(candidate.as_str())
            .map_err(|source| Rejection::Unreadable {
                id: candidate.clone(),
                source,
            })?;

        if children.iter().any(|name| name == DEVICE_PARAMETERS) {
            Ok(())
        } else {
            Err(Rejection::MissingDeviceParameters(candidate.clone()))
        }
    }

    /// True only when the candidate lists a `Device Parameters` child
    pub fn is_genuine(&self, candidate: &HardwareId) -> bool {
        match self.check(candidate) {
            Ok(()) => true,
            Err(rejection) => {
                debug!(hwid = %candidate, reason = %rejection, "Candidate rejected");
                false
            }
        }
    }
}
