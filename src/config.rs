//! Application configuration.
//!
//! The configuration is loaded from
//! `$XDG_CONFIG_HOME/gestured/config.json`.  Each top-level key is one
//! section; every section is optional and falls back to compiled-in
//! defaults, so a minimal `{}` file is valid.
//!
//! # Example
//!
//! ```json
//! {
//!   "authority": { "base_url": "http://127.0.0.1:5000", "timeout_ms": 1500 },
//!   "gestures": { "fist": "scrollUp", "open_palm": "pausePlay" },
//!   "cooldowns": { "default_ms": 200, "per_command": { "openTab": 2500 } },
//!   "actions": { "scroll_delta": 400, "new_tab_url": "https://duckduckgo.com" },
//!   "capture": { "url": "chrome-extension://abcdef/cam.html" },
//!   "bridge": { "socket_path": "/run/user/1000/gestured-bridge.sock" },
//!   "socket_path": "/run/user/1000/gestured.sock"
//! }
//! ```

use crate::authority::http::AuthorityConfig;
use crate::cooldown::CooldownTable;
use crate::executor::ActionConfig;
use crate::host::bridge::BridgeConfig;
use crate::lifecycle::CaptureConfig;
use crate::mapper::GestureMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where to reach the authority service.
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Gesture label → command table.  Replaces the default table when set.
    #[serde(default)]
    pub gestures: GestureMap,

    /// Per-command cooldowns.
    #[serde(default)]
    pub cooldowns: CooldownTable,

    /// Tunables for the host actions.
    #[serde(default)]
    pub actions: ActionConfig,

    /// Capture session settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// How to reach the browser bridge.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Path of the inbound event socket.  Defaults to
    /// `$XDG_RUNTIME_DIR/gestured.sock`.
    #[serde(default)]
    pub socket_path: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
