//! Hardware identifiers assigned by the host's device subsystem

use serde::{Deserialize, Serialize};

/// Separator between hardware id path segments
pub const SEPARATOR: char = '\\';

/// Prefix carried by every display-class hardware id
pub const DISPLAY_PREFIX: &str = "DISPLAY\\";

/// Identity that is never admitted into a catalog
pub const DENYLISTED_IDENTITY: &str = "DISPLAY\\NEC61BE";

/// Hierarchical path-like device identifier, e.g. `DISPLAY\DEL4065\5&1a2b3c&0&UID4352`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareId(pub String);

impl HardwareId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The id with its trailing instance segment removed.
    ///
    /// Two instances of the same physical monitor differ only in the final
    /// segment, so the identity is what the catalog keys on. An id whose
    /// only separator is the leading character is returned unchanged.
    pub fn identity(&self) -> HardwareId {
        match self.0.rfind(SEPARATOR) {
            Some(index) if index > 0 => Self(self.0[..index].to_string()),
            _ => self.clone(),
        }
    }

    /// Vendor/product segment of a display-class id (`DEL4065` for
    /// `DISPLAY\DEL4065\...`). Requires a following segment.
    pub fn display_model_segment(&self) -> Option<&str> {
        let rest = self.0.strip_prefix(DISPLAY_PREFIX)?;
        match rest.find(SEPARATOR) {
            Some(index) if index > 0 => Some(&rest[..index]),
            _ => None,
        }
    }

    /// Append a child segment
    pub fn join(&self, segment: &str) -> HardwareId {
        Self(format!("{}{}{}", self.0, SEPARATOR, segment))
    }

    pub fn is_denylisted(&self) -> bool {
        self.0 == DENYLISTED_IDENTITY
    }
}

impl std::fmt::Display for HardwareId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for HardwareId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for HardwareId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_drops_instance_segment() {
        let a = HardwareId::from(r"DISPLAY\ACM1234\4&1a2b3c&0");
        let b = HardwareId::from(r"DISPLAY\ACM1234\4&1a2b3c&1");
        assert_eq!(a.identity().as_str(), r"DISPLAY\ACM1234");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_identity_without_separator() {
        assert_eq!(HardwareId::from("MONITOR").identity().as_str(), "MONITOR");
        assert_eq!(HardwareId::from(r"\ROOT").identity().as_str(), r"\ROOT");
    }

    #[test]
    fn test_display_model_segment() {
        let id = HardwareId::from(r"DISPLAY\DEL4065\5&1a2b3c&0&UID4352");
        assert_eq!(id.display_model_segment(), Some("DEL4065"));
        assert_eq!(HardwareId::from(r"DISPLAY\DEL4065").display_model_segment(), None);
        assert_eq!(HardwareId::from(r"MONITOR\DEL4065\1").display_model_segment(), None);
    }

    #[test]
    fn test_join_and_denylist() {
        let id = HardwareId::from("DISPLAY").join("NEC61BE");
        assert_eq!(id.as_str(), DENYLISTED_IDENTITY);
        assert!(id.is_denylisted());
        assert!(!id.join("1").is_denylisted());
    }
}
