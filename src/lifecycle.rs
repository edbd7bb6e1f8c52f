//! Start/stop of the capture session.
//!
//! The camera runs inside a hidden document opened on the host.  At most one
//! such document exists; starting twice or stopping with nothing running is
//! a no-op.

use crate::command::SessionHandle;
use crate::traits::Host;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Capture session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Address of the page that runs the camera.  Default: `cam.html`.
    pub url: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            url: "cam.html".into(),
        }
    }
}

/// Owner of the single capture-session slot.
#[derive(Debug, Clone, Default)]
pub struct CaptureLifecycle {
    config: CaptureConfig,
    session: Option<SessionHandle>,
}

impl CaptureLifecycle {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// The live session, if any.
    pub fn session(&self) -> Option<SessionHandle> {
        self.session
    }

    /// Open the capture document in the background.  If a session is
    /// already live it is returned unchanged.
    pub fn start<H: Host>(&mut self, host: &H) -> Result<SessionHandle, H::Error> {
        if let Some(handle) = self.session {
            warn!("capture already running in {}", handle.0);
            return Ok(handle);
        }
        let id = host.create_document(&self.config.url, false)?;
        let handle = SessionHandle(id);
        self.session = Some(handle);
        info!("capture started in {}", id);
        Ok(handle)
    }

    /// Close the capture document.  Returns the session that was stopped,
    /// or `None` if nothing was running.
    ///
    /// The slot is emptied even when the host fails to close the document,
    /// since a document the host cannot close is usually already gone.
    pub fn stop<H: Host>(&mut self, host: &H) -> Result<Option<SessionHandle>, H::Error> {
        let Some(handle) = self.session.take() else {
            return Ok(None);
        };
        host.close_document(handle.0)?;
        info!("capture stopped ({})", handle.0);
        Ok(Some(handle))
    }
}
