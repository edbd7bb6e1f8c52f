//! Client side of the external authority service.
//!
//! The authority holds the canonical "gestures enabled" flag (and the
//! camera switch).  It can be changed through channels other than this
//! daemon, so the dispatcher asks it on every command instead of trusting
//! a local copy.

pub mod http;

use crate::traits::Authority;
use serde::{Deserialize, Serialize};

/// Switches reported by `GET /status`.
///
/// Missing fields read as `false`; older backends only report the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityStatus {
    pub gestures_enabled: bool,
    pub camera_enabled: bool,
}

/// The authority could not be reached or did not answer sensibly.
#[derive(Debug, thiserror::Error)]
#[error("authority unavailable: {0}")]
pub struct AuthorityUnavailable(pub String);

/// Stand-in used when no authority client could be built.
///
/// Every call fails, so only `toggleGestures` and the capture events get
/// through the dispatcher.
#[derive(Debug, Clone)]
pub struct OfflineAuthority {
    reason: String,
}

impl OfflineAuthority {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable(&self) -> AuthorityUnavailable {
        AuthorityUnavailable(format!("offline ({})", self.reason))
    }
}

impl Authority for OfflineAuthority {
    fn fetch_status(&self) -> Result<AuthorityStatus, AuthorityUnavailable> {
        Err(self.unavailable())
    }

    fn set_gating_state(&self, _: bool) -> Result<(), AuthorityUnavailable> {
        Err(self.unavailable())
    }

    fn set_camera_enabled(&self, _: bool) -> Result<(), AuthorityUnavailable> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_authority_refuses_everything() {
        let offline = OfflineAuthority::new("client: no TLS backend");
        let err = offline.fetch_status().unwrap_err();
        assert_eq!(
            err.to_string(),
            "authority unavailable: offline (client: no TLS backend)"
        );
        assert!(offline.set_gating_state(true).is_err());
        assert!(offline.set_camera_enabled(false).is_err());
    }

    #[test]
    fn boxed_authority_forwards() {
        let boxed: Box<dyn Authority> = Box::new(OfflineAuthority::new("x"));
        assert!(boxed.fetch_status().is_err());
    }
}
