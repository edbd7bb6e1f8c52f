//! The orchestrator that ties mapping, cooldowns, the authority gate and
//! the executor together.
//!
//! [`DispatchEngine`] owns every piece of process-wide mutable state (the
//! cooldown ledger, the cached gating flag, the capture-session slot) and
//! reacts to [`Event`]s one at a time.  For a command the path is:
//!
//! 1. map the gesture label (unmapped → dropped),
//! 2. admit-and-record in the cooldown ledger (rejected → dropped),
//! 3. fetch the gating flag from the authority (unreachable → dropped,
//!    except `toggleGestures`),
//! 4. drop if disabled (except `toggleGestures`),
//! 5. execute against the active document.
//!
//! The cooldown is recorded before the authority round trip so a second
//! event for the same command can never slip in while the first is still
//! waiting on the network.

use crate::command::{CommandName, Event, SessionHandle};
use crate::config::Config;
use crate::cooldown::{CooldownLedger, CooldownTable};
use crate::executor::{ActionConfig, CommandExecutor, Effect, ExecutorError};
use crate::lifecycle::{CaptureConfig, CaptureLifecycle};
use crate::mapper::GestureMap;
use crate::traits::{Authority, Host};
use log::{debug, info, warn};
use std::time::Instant;

/// Possible errors from dispatching an event.
///
/// These are reported to the log only; the event source never hears back.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A host action failed while executing a command.
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    /// The host failed a query or a capture-session call.
    #[error("host error: {0}")]
    Host(String),
}

/// How an event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command passed every check and was carried out (or found
    /// nothing to act on).
    Executed { command: CommandName, effect: Effect },
    /// The gesture label is not in the table.
    Unmapped(String),
    /// The command fired again before its cooldown elapsed.
    CooldownRejected(CommandName),
    /// The authority could not be asked, so the command was dropped.
    AuthorityUnavailable(CommandName),
    /// Gesture control is switched off.
    Disabled(CommandName),
    /// A capture session is live (new or already running).
    CaptureStarted(SessionHandle),
    /// The capture session was closed, or `None` if none was live.
    CaptureStopped(Option<SessionHandle>),
    /// The camera switch could not be read from the authority; capture
    /// was left as it was.
    CameraSyncSkipped,
}

/// Processes inbound events against a [`Host`] and an [`Authority`].
///
/// Generic over both so it is independent of any concrete browser or
/// transport.  Construct one per process.
///
/// # Typical usage
///
/// ```ignore
/// let mut engine = DispatchEngine::from_config(MemoryHost::new(), authority, &config);
/// engine.handle(Event::GesturePrediction { gesture: "fist".into() })?;
/// ```
pub struct DispatchEngine<H: Host, A: Authority> {
    host: H,
    authority: A,
    gestures: GestureMap,
    cooldowns: CooldownLedger,
    executor: CommandExecutor,
    capture: CaptureLifecycle,
    /// Last gating flag seen from the authority, flipped locally by
    /// `toggleGestures`.  Starts disabled.
    gestures_enabled: bool,
    started: Instant,
}

impl<H: Host, A: Authority> DispatchEngine<H, A> {
    /// Create an engine with the default tables.
    pub fn new(host: H, authority: A) -> Self {
        Self {
            host,
            authority,
            gestures: GestureMap::default(),
            cooldowns: CooldownLedger::new(CooldownTable::default()),
            executor: CommandExecutor::default(),
            capture: CaptureLifecycle::default(),
            gestures_enabled: false,
            started: Instant::now(),
        }
    }

    /// Create an engine with every table taken from `config`.
    pub fn from_config(host: H, authority: A, config: &Config) -> Self {
        let mut engine = Self::new(host, authority);
        engine.set_gesture_map(config.gestures.clone());
        engine.set_cooldowns(config.cooldowns.clone());
        engine.set_action_config(config.actions.clone());
        engine.set_capture_config(config.capture.clone());
        engine
    }

    pub fn set_gesture_map(&mut self, gestures: GestureMap) {
        self.gestures = gestures;
    }

    /// Replace the cooldown table.  Clears the ledger; meant for
    /// configuration time.
    pub fn set_cooldowns(&mut self, table: CooldownTable) {
        self.cooldowns = CooldownLedger::new(table);
    }

    pub fn set_action_config(&mut self, config: ActionConfig) {
        self.executor = CommandExecutor::new(config);
    }

    /// Replace the capture settings.  Any live session is forgotten, so
    /// call this before the first `startCamera`.
    pub fn set_capture_config(&mut self, config: CaptureConfig) {
        self.capture = CaptureLifecycle::new(config);
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    /// The cached gating flag.  May lag the authority between dispatches.
    pub fn gestures_enabled(&self) -> bool {
        self.gestures_enabled
    }

    pub fn capture_session(&self) -> Option<SessionHandle> {
        self.capture.session()
    }

    /// Milliseconds since the engine was created.
    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Process a single [`Event`], timestamped with the engine's monotonic
    /// clock.
    pub fn handle(&mut self, event: Event) -> Result<Outcome, DispatchError> {
        let now = self.now_ms();
        self.handle_at(event, now)
    }

    /// Process a single [`Event`] as if it arrived at `now` (monotonic ms).
    pub fn handle_at(&mut self, event: Event, now: u64) -> Result<Outcome, DispatchError> {
        match event {
            Event::GesturePrediction { gesture } => match self.gestures.map(&gesture) {
                Some(cmd) => {
                    debug!("gesture {:?} -> {}", gesture, cmd);
                    self.dispatch(cmd, now)
                }
                None => {
                    debug!("ignoring unmapped gesture {:?}", gesture);
                    Ok(Outcome::Unmapped(gesture))
                }
            },

            Event::SimulateCommand { command } => {
                debug!("simulated {}", command);
                self.dispatch(command, now)
            }

            Event::StartCamera => self.apply_camera(true),

            Event::StopCamera => self.apply_camera(false),

            Event::SetCamera { enabled } => {
                if let Err(e) = self.authority.set_camera_enabled(enabled) {
                    warn!("could not report camera switch: {}", e);
                }
                self.apply_camera(enabled)
            }

            Event::SyncCamera => match self.authority.fetch_status() {
                Ok(status) => self.apply_camera(status.camera_enabled),
                Err(e) => {
                    warn!("{}; leaving capture as is", e);
                    Ok(Outcome::CameraSyncSkipped)
                }
            },
        }
    }

    /// Run `cmd` through cooldown, gate and executor.
    fn dispatch(&mut self, cmd: CommandName, now: u64) -> Result<Outcome, DispatchError> {
        if !self.cooldowns.admit(cmd, now) {
            return Ok(Outcome::CooldownRejected(cmd));
        }

        match self.authority.fetch_status() {
            Ok(status) => self.gestures_enabled = status.gestures_enabled,
            Err(e) if cmd == CommandName::ToggleGestures => {
                warn!("{}; toggling from cached state", e);
            }
            Err(e) => {
                warn!("{}; dropping {}", e, cmd);
                return Ok(Outcome::AuthorityUnavailable(cmd));
            }
        }

        if cmd == CommandName::ToggleGestures {
            return Ok(self.toggle_gestures());
        }

        if !self.gestures_enabled {
            debug!("gestures disabled, dropping {}", cmd);
            return Ok(Outcome::Disabled(cmd));
        }

        self.execute(cmd)
    }

    /// Flip the cached flag and tell the authority.
    fn toggle_gestures(&mut self) -> Outcome {
        self.gestures_enabled = !self.gestures_enabled;
        info!(
            "gestures {}",
            if self.gestures_enabled { "enabled" } else { "disabled" }
        );
        if let Err(e) = self.authority.set_gating_state(self.gestures_enabled) {
            warn!("could not report gating state: {}", e);
        }
        Outcome::Executed {
            command: CommandName::ToggleGestures,
            effect: Effect::Applied,
        }
    }

    /// Resolve the active document and its siblings, then execute.
    fn execute(&mut self, cmd: CommandName) -> Result<Outcome, DispatchError> {
        let host_err = |e: H::Error| DispatchError::Host(e.to_string());

        let target = self.host.active_document().map_err(host_err)?;
        let siblings = match &target {
            Some(t) if cmd.needs_target() => {
                self.host.documents_in_window(t.window).map_err(host_err)?
            }
            _ => Vec::new(),
        };

        let effect = self
            .executor
            .execute(&self.host, cmd, target.as_ref(), &siblings)?;
        match &effect {
            Effect::Applied => info!("{} done", cmd),
            Effect::Skipped(reason) => debug!("{} skipped: {}", cmd, reason),
        }
        Ok(Outcome::Executed {
            command: cmd,
            effect,
        })
    }

    /// Start or stop capture to match `enabled`.
    fn apply_camera(&mut self, enabled: bool) -> Result<Outcome, DispatchError> {
        let host_err = |e: H::Error| DispatchError::Host(e.to_string());
        if enabled {
            let handle = self.capture.start(&self.host).map_err(host_err)?;
            return Ok(Outcome::CaptureStarted(handle));
        }
        let stopped = self.capture.stop(&self.host).map_err(host_err)?;
        if stopped.is_none() {
            debug!("stop requested but no capture running");
        }
        Ok(Outcome::CaptureStopped(stopped))
    }
}

//  Tests
