//! Carries out a logical command against a [`Host`].
//!
//! The executor fixes *what* each command means (which document, which
//! direction, which element); the host decides *how*.  "Nothing to act on"
//! (no media, no matching element, target missing from its window) is the
//! common case and is reported as [`Effect::Skipped`], never as an error.

use crate::command::{cycle_index, CommandName, DocumentInfo};
use crate::traits::Host;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

/// A search site whose pages have a voice-search button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSearchProvider {
    /// Registrable domain; subdomains match too (`google.com` matches
    /// `www.google.com`).
    pub domain: String,
    /// CSS selector of the voice-search trigger.
    pub selector: String,
}

/// Tunables for the concrete actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Pixels scrolled per scroll command.  Default: `300`.
    pub scroll_delta: i32,
    /// Address opened by `openTab`.  Default: `https://www.google.com`.
    pub new_tab_url: String,
    /// Outline the voice-search button before clicking it.  Default: `true`.
    pub highlight_voice_button: bool,
    /// Sites where `voiceSearch` does something.
    pub voice_search: Vec<VoiceSearchProvider>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            scroll_delta: 300,
            new_tab_url: "https://www.google.com".into(),
            highlight_voice_button: true,
            voice_search: vec![
                VoiceSearchProvider {
                    domain: "google.com".into(),
                    selector: r#"div[aria-label="Search by voice"]"#.into(),
                },
                VoiceSearchProvider {
                    domain: "youtube.com".into(),
                    selector: "#voice-search-button button".into(),
                },
            ],
        }
    }
}

/// What executing a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The host carried out the action.
    Applied,
    /// There was nothing to act on; the reason is for logs only.
    Skipped(&'static str),
}

/// Errors from executing a command.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The host refused or failed the action.
    #[error("{command} failed: {message}")]
    HostActionFailed {
        command: CommandName,
        message: String,
    },
    /// The command is not carried out by the executor.
    #[error("{0} is not a host action")]
    NotAHostAction(CommandName),
}

/// Stateless translator from commands to host calls.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    config: ActionConfig,
}

impl CommandExecutor {
    pub fn new(config: ActionConfig) -> Self {
        Self { config }
    }

    /// Execute `cmd` against `target`, whose window holds `siblings` in
    /// tab-strip order.
    ///
    /// `openTab` ignores `target`; every other host action is skipped when
    /// there is no active document.  `toggleGestures` changes dispatcher
    /// state rather than the host and is rejected with
    /// [`ExecutorError::NotAHostAction`].
    pub fn execute<H: Host>(
        &self,
        host: &H,
        cmd: CommandName,
        target: Option<&DocumentInfo>,
        siblings: &[DocumentInfo],
    ) -> Result<Effect, ExecutorError> {
        match (cmd, target) {
            (CommandName::ToggleGestures, _) => Err(ExecutorError::NotAHostAction(cmd)),
            (CommandName::OpenTab, _) => self.open_tab(host),
            (_, Some(target)) => self.execute_on(host, cmd, target, siblings),
            (_, None) => Ok(Effect::Skipped("no active document")),
        }
    }

    fn execute_on<H: Host>(
        &self,
        host: &H,
        cmd: CommandName,
        target: &DocumentInfo,
        siblings: &[DocumentInfo],
    ) -> Result<Effect, ExecutorError> {
        let failed = |e: H::Error| ExecutorError::HostActionFailed {
            command: cmd,
            message: e.to_string(),
        };

        match cmd {
            CommandName::PausePlay => {
                if host.toggle_media(target.id).map_err(failed)? {
                    Ok(Effect::Applied)
                } else {
                    Ok(Effect::Skipped("no media element"))
                }
            }

            CommandName::ScrollUp => {
                host.scroll_by(target.id, self.config.scroll_delta.saturating_neg())
                    .map_err(failed)?;
                Ok(Effect::Applied)
            }

            CommandName::ScrollDown => {
                host.scroll_by(target.id, self.config.scroll_delta)
                    .map_err(failed)?;
                Ok(Effect::Applied)
            }

            CommandName::NextTab => self.cycle(host, cmd, target, siblings, 1),

            CommandName::PrevTab => self.cycle(host, cmd, target, siblings, -1),

            CommandName::OpenTab => self.open_tab(host),

            CommandName::CloseTab => {
                host.close_document(target.id).map_err(failed)?;
                Ok(Effect::Applied)
            }

            CommandName::VoiceSearch => {
                let Some(provider) = self.voice_provider_for(&target.url) else {
                    return Ok(Effect::Skipped("not a voice-search site"));
                };
                let found = host
                    .activate_element(
                        target.id,
                        &provider.selector,
                        self.config.highlight_voice_button,
                    )
                    .map_err(failed)?;
                if found {
                    Ok(Effect::Applied)
                } else {
                    Ok(Effect::Skipped("voice-search button not found"))
                }
            }

            CommandName::ToggleGestures => Err(ExecutorError::NotAHostAction(cmd)),
        }
    }

    fn open_tab<H: Host>(&self, host: &H) -> Result<Effect, ExecutorError> {
        let id = host
            .create_document(&self.config.new_tab_url, true)
            .map_err(|e| ExecutorError::HostActionFailed {
                command: CommandName::OpenTab,
                message: e.to_string(),
            })?;
        info!("opened {} at {}", id, self.config.new_tab_url);
        Ok(Effect::Applied)
    }

    /// Activate the sibling `step` positions away from `target`, wrapping.
    fn cycle<H: Host>(
        &self,
        host: &H,
        cmd: CommandName,
        target: &DocumentInfo,
        siblings: &[DocumentInfo],
        step: isize,
    ) -> Result<Effect, ExecutorError> {
        let Some(index) = siblings.iter().position(|d| d.id == target.id) else {
            return Ok(Effect::Skipped("target not among its window's documents"));
        };
        let next = &siblings[cycle_index(index, siblings.len(), step)];
        debug!("{}: {} -> {}", cmd, target.id, next.id);
        host.activate_document(next.id)
            .map_err(|e| ExecutorError::HostActionFailed {
                command: cmd,
                message: e.to_string(),
            })?;
        Ok(Effect::Applied)
    }

    /// The configured provider whose domain serves `address`, if any.
    pub fn voice_provider_for(&self, address: &str) -> Option<&VoiceSearchProvider> {
        let url = Url::parse(address).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();
        self.config
            .voice_search
            .iter()
            .find(|p| domain_matches(&host, &p.domain))
    }
}

/// `host` is `domain` or one of its subdomains.
fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

//  Tests
