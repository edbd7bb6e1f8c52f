//! Gesture label → command lookup.
//!
//! The table is plain data loaded from the `gestures` config section, so it
//! can be replaced without touching dispatch logic.  Labels that are not in
//! the table map to nothing; callers drop them silently.

use crate::command::CommandName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Immutable mapping from recognizer labels to commands.
///
/// Serialised as a flat JSON object:
///
/// ```json
/// { "fist": "scrollUp", "open_palm": "pausePlay" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureMap(HashMap<String, CommandName>);

impl Default for GestureMap {
    fn default() -> Self {
        Self::from_pairs([
            ("open_palm", CommandName::PausePlay),
            ("fist", CommandName::ScrollUp),
            ("peace", CommandName::ScrollDown),
            ("thumbs_up", CommandName::NextTab),
            ("thumbs_down", CommandName::PrevTab),
            ("pointing_up", CommandName::VoiceSearch),
            ("ok", CommandName::OpenTab),
            ("call_me", CommandName::CloseTab),
            ("rock", CommandName::ToggleGestures),
        ])
    }
}

impl GestureMap {
    /// Build a table from `(label, command)` pairs.  Later pairs win.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, CommandName)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(label, cmd)| (label.to_string(), cmd))
                .collect(),
        )
    }

    /// Look up the command for `label`.
    pub fn map(&self, label: &str) -> Option<CommandName> {
        self.0.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
