//! Commands, events and identifiers shared by every component.
//!
//! [`CommandName`] is the closed set of logical actions the dispatcher can
//! perform.  [`Event`] is everything that can arrive on the inbound surface
//! (gesture predictions, simulated commands, camera lifecycle requests).
//! [`DocumentInfo`] and friends describe the host documents (tabs) that
//! commands act on.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A logical action, independent of how the host carries it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    PausePlay,
    ScrollUp,
    ScrollDown,
    NextTab,
    PrevTab,
    VoiceSearch,
    OpenTab,
    CloseTab,
    ToggleGestures,
}

impl CommandName {
    /// Every command, in declaration order.
    pub const ALL: [CommandName; 9] = [
        CommandName::PausePlay,
        CommandName::ScrollUp,
        CommandName::ScrollDown,
        CommandName::NextTab,
        CommandName::PrevTab,
        CommandName::VoiceSearch,
        CommandName::OpenTab,
        CommandName::CloseTab,
        CommandName::ToggleGestures,
    ];

    /// Whether executing this command needs an active document.
    pub fn needs_target(self) -> bool {
        !matches!(self, CommandName::OpenTab | CommandName::ToggleGestures)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandName::PausePlay => "pausePlay",
            CommandName::ScrollUp => "scrollUp",
            CommandName::ScrollDown => "scrollDown",
            CommandName::NextTab => "nextTab",
            CommandName::PrevTab => "prevTab",
            CommandName::VoiceSearch => "voiceSearch",
            CommandName::OpenTab => "openTab",
            CommandName::CloseTab => "closeTab",
            CommandName::ToggleGestures => "toggleGestures",
        };
        f.write_str(s)
    }
}

/// Error returned when a string names no known command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command: {0:?}")]
pub struct UnknownCommand(pub String);

impl FromStr for CommandName {
    type Err = UnknownCommand;

    /// Case-insensitive; `_`, `-` and whitespace are ignored, so
    /// `"nextTab"`, `"next_tab"` and `"NextTab"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(|c| c.to_lowercase())
            .collect();
        match normalized.as_str() {
            "pauseplay" => Ok(CommandName::PausePlay),
            "scrollup" => Ok(CommandName::ScrollUp),
            "scrolldown" => Ok(CommandName::ScrollDown),
            "nexttab" => Ok(CommandName::NextTab),
            "prevtab" => Ok(CommandName::PrevTab),
            "voicesearch" => Ok(CommandName::VoiceSearch),
            "opentab" => Ok(CommandName::OpenTab),
            "closetab" => Ok(CommandName::CloseTab),
            "togglegestures" => Ok(CommandName::ToggleGestures),
            _ => Err(UnknownCommand(s.to_string())),
        }
    }
}

impl Serialize for CommandName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CommandName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(DeError::custom)
    }
}

/// A message on the inbound event surface.
///
/// On the wire every event is a JSON object tagged by `action`:
///
/// ```json
/// {"action":"startCamera"}
/// {"action":"gesturePrediction","gesture":"fist"}
/// {"action":"simulateCommand","command":"nextTab"}
/// {"action":"setCamera","enabled":true}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Event {
    /// Open the hidden capture document if it is not already open.
    StartCamera,

    /// Close the capture document if one is open.
    StopCamera,

    /// The recognizer classified a frame.  Labels outside the gesture
    /// table are ignored.
    GesturePrediction { gesture: String },

    /// Run a command directly, as if its gesture had been recognised.
    /// Still subject to cooldown and the enable/disable gate.
    SimulateCommand { command: CommandName },

    /// Report the camera switch to the authority, then start or stop
    /// capture to match.
    SetCamera { enabled: bool },

    /// Ask the authority whether the camera should be on and start or
    /// stop capture accordingly.
    SyncCamera,
}

/// Host identifier of a document (tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Host identifier of the window a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Minimal information about a host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: DocumentId,
    /// Window the document belongs to; siblings share it.
    pub window: WindowId,
    /// Current address of the document.
    pub url: String,
}

/// Handle to the live capture session.  Wraps the id of the hidden
/// document that hosts the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle(pub DocumentId);

/// Index of the sibling `step` positions away from `current`, wrapping
/// circularly within `count` documents.
pub fn cycle_index(current: usize, count: usize, step: isize) -> usize {
    debug_assert!(count > 0);
    let count = count as isize;
    (current as isize + step).rem_euclid(count) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_display_is_camel_case() {
        assert_eq!(CommandName::PausePlay.to_string(), "pausePlay");
        assert_eq!(CommandName::NextTab.to_string(), "nextTab");
        assert_eq!(CommandName::ToggleGestures.to_string(), "toggleGestures");
    }

    #[test]
    fn command_parse_is_lenient() {
        assert_eq!("nextTab".parse(), Ok(CommandName::NextTab));
        assert_eq!("next_tab".parse(), Ok(CommandName::NextTab));
        assert_eq!("NextTab".parse(), Ok(CommandName::NextTab));
        assert_eq!(" scroll-down ".parse(), Ok(CommandName::ScrollDown));
        assert!("fly".parse::<CommandName>().is_err());
    }

    #[test]
    fn every_command_parses_its_own_display() {
        for cmd in CommandName::ALL {
            assert_eq!(cmd.to_string().parse(), Ok(cmd));
        }
    }

    #[test]
    fn only_open_tab_and_toggle_skip_target() {
        let targetless: Vec<_> = CommandName::ALL
            .into_iter()
            .filter(|c| !c.needs_target())
            .collect();
        assert_eq!(targetless, vec![CommandName::OpenTab, CommandName::ToggleGestures]);
    }

    #[test]
    fn event_wire_format() {
        let ev: Event = serde_json::from_str(r#"{"action":"startCamera"}"#).unwrap();
        assert_eq!(ev, Event::StartCamera);

        let ev: Event =
            serde_json::from_str(r#"{"action":"gesturePrediction","gesture":"fist"}"#).unwrap();
        assert_eq!(ev, Event::GesturePrediction { gesture: "fist".into() });

        let ev: Event =
            serde_json::from_str(r#"{"action":"simulateCommand","command":"prev_tab"}"#).unwrap();
        assert_eq!(ev, Event::SimulateCommand { command: CommandName::PrevTab });

        let ev: Event = serde_json::from_str(r#"{"action":"setCamera","enabled":true}"#).unwrap();
        assert_eq!(ev, Event::SetCamera { enabled: true });
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(serde_json::from_str::<Event>(r#"{"action":"launchRocket"}"#).is_err());
        assert!(serde_json::from_str::<Event>(r#"{"action":"simulateCommand","command":"fly"}"#)
            .is_err());
    }

    #[test]
    fn event_serializes_with_action_tag() {
        let json = serde_json::to_string(&Event::SimulateCommand {
            command: CommandName::OpenTab,
        })
        .unwrap();
        assert_eq!(json, r#"{"action":"simulateCommand","command":"openTab"}"#);
    }

    #[test]
    fn cycle_index_wraps_both_ways() {
        assert_eq!(cycle_index(0, 3, 1), 1);
        assert_eq!(cycle_index(2, 3, 1), 0);
        assert_eq!(cycle_index(0, 3, -1), 2);
        assert_eq!(cycle_index(0, 1, 1), 0);
        assert_eq!(cycle_index(0, 1, -1), 0);
    }
}
