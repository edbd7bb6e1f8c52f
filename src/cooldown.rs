//! Per-command rate limiting.
//!
//! A held gesture or a noisy classifier produces the same label many times
//! per second.  [`CooldownLedger`] admits a command only once its cooldown
//! has elapsed since the last admission, and records the admission in the
//! same call so two back-to-back events can never both pass.

use crate::command::CommandName;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cooldown applied to commands absent from the table (ms).
pub const DEFAULT_COOLDOWN_MS: u64 = 200;

/// Command → minimum interval between admissions.
///
/// A configured `per_command` map replaces the built-in defaults; commands
/// absent from it fall back to `default_ms`.
///
/// ```json
/// { "default_ms": 250, "per_command": { "scrollUp": 150 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownTable {
    /// Fallback for commands without an entry.  Default: `200`.
    pub default_ms: u64,
    /// Per-command durations in milliseconds.
    pub per_command: HashMap<CommandName, u64>,
}

impl Default for CooldownTable {
    fn default() -> Self {
        // Scrolling is harmless to repeat; opening tabs or the voice prompt
        // is not.
        let per_command = [
            (CommandName::PausePlay, 1000),
            (CommandName::ScrollUp, 300),
            (CommandName::ScrollDown, 300),
            (CommandName::NextTab, 800),
            (CommandName::PrevTab, 800),
            (CommandName::VoiceSearch, 3000),
            (CommandName::OpenTab, 2000),
            (CommandName::CloseTab, 2000),
            (CommandName::ToggleGestures, 1500),
        ]
        .into_iter()
        .collect();
        Self {
            default_ms: DEFAULT_COOLDOWN_MS,
            per_command,
        }
    }
}

impl CooldownTable {
    /// A table with no per-command entries.
    pub fn empty() -> Self {
        Self {
            default_ms: DEFAULT_COOLDOWN_MS,
            per_command: HashMap::new(),
        }
    }

    /// Set the cooldown for `cmd`.
    pub fn with(mut self, cmd: CommandName, ms: u64) -> Self {
        self.per_command.insert(cmd, ms);
        self
    }

    /// Cooldown for `cmd` in milliseconds.
    pub fn duration(&self, cmd: CommandName) -> u64 {
        self.per_command.get(&cmd).copied().unwrap_or(self.default_ms)
    }
}

/// Last-admission timestamps plus the table that judges them.
///
/// Timestamps are monotonic milliseconds chosen by the caller.  Entries are
/// never rolled back and live as long as the ledger.
#[derive(Debug, Clone)]
pub struct CooldownLedger {
    table: CooldownTable,
    last_admitted: HashMap<CommandName, u64>,
}

impl CooldownLedger {
    pub fn new(table: CooldownTable) -> Self {
        Self {
            table,
            last_admitted: HashMap::new(),
        }
    }

    /// Admit `cmd` at `now` if its cooldown has elapsed, recording `now` on
    /// success.
    ///
    /// The first invocation of a command is always admitted.  The boundary
    /// is inclusive: exactly `duration` ms after the last admission passes.
    pub fn admit(&mut self, cmd: CommandName, now: u64) -> bool {
        let duration = self.table.duration(cmd);
        if let Some(&last) = self.last_admitted.get(&cmd) {
            let elapsed = now.saturating_sub(last);
            if elapsed < duration {
                debug!("{} cooling down ({}ms of {}ms)", cmd, elapsed, duration);
                return false;
            }
        }
        self.last_admitted.insert(cmd, now);
        true
    }

    /// Timestamp of the last admission of `cmd`, if any.
    pub fn last_admitted(&self, cmd: CommandName) -> Option<u64> {
        self.last_admitted.get(&cmd).copied()
    }
}
