//! Core traits that decouple the dispatcher from any specific browser,
//! authority service or transport.
//!
//! Every concrete backend (the in-memory host, the HTTP authority client, a
//! Unix-socket listener, a test harness, …) implements one of these traits.
//! The [`DispatchEngine`](crate::engine::DispatchEngine) only depends on
//! these abstractions.

use crate::authority::{AuthorityStatus, AuthorityUnavailable};
use crate::command::{DocumentId, DocumentInfo, Event, WindowId};
use std::sync::mpsc;

/// Abstraction over the application whose documents (tabs) gestures
/// control.
///
/// An implementation might drive a real browser through an extension
/// bridge, or it might be an in-memory model used in tests.  Queries that
/// find nothing return `Ok(None)` / `Ok(false)`; errors are reserved for
/// the host refusing or failing an action.
pub trait Host {
    /// The error type produced by this host.
    type Error: std::error::Error + Send + 'static;

    /// The document currently considered the target of actions, if any.
    fn active_document(&self) -> Result<Option<DocumentInfo>, Self::Error>;

    /// All documents in `window`, in tab-strip order.
    fn documents_in_window(&self, window: WindowId) -> Result<Vec<DocumentInfo>, Self::Error>;

    /// Make `id` the active document of its window.
    fn activate_document(&self, id: DocumentId) -> Result<(), Self::Error>;

    /// Open a new document at `url`.  Inactive documents are opened in the
    /// background without stealing focus.
    fn create_document(&self, url: &str, active: bool) -> Result<DocumentId, Self::Error>;

    /// Close document `id`.
    fn close_document(&self, id: DocumentId) -> Result<(), Self::Error>;

    /// Toggle play/pause on the first playable media element in `id`.
    ///
    /// Returns `false` when the document has no media element.
    fn toggle_media(&self, id: DocumentId) -> Result<bool, Self::Error>;

    /// Scroll the viewport of `id` vertically by `dy` pixels.
    fn scroll_by(&self, id: DocumentId, dy: i32) -> Result<(), Self::Error>;

    /// Click the first element in `id` matching `selector`, optionally
    /// highlighting it first.
    ///
    /// Returns `false` when no element matches.
    fn activate_element(
        &self,
        id: DocumentId,
        selector: &str,
        highlight: bool,
    ) -> Result<bool, Self::Error>;
}

/// The external service holding the canonical enable/disable flag.
pub trait Authority {
    /// Fetch the current switches.  Fails when the service cannot be
    /// reached or answers with something that is not a status document.
    fn fetch_status(&self) -> Result<AuthorityStatus, AuthorityUnavailable>;

    /// Tell the authority whether gesture control should be enabled.
    fn set_gating_state(&self, enabled: bool) -> Result<(), AuthorityUnavailable>;

    /// Tell the authority whether the camera should be running.
    fn set_camera_enabled(&self, enabled: bool) -> Result<(), AuthorityUnavailable>;
}

impl<A: Authority + ?Sized> Authority for Box<A> {
    fn fetch_status(&self) -> Result<AuthorityStatus, AuthorityUnavailable> {
        (**self).fetch_status()
    }

    fn set_gating_state(&self, enabled: bool) -> Result<(), AuthorityUnavailable> {
        (**self).set_gating_state(enabled)
    }

    fn set_camera_enabled(&self, enabled: bool) -> Result<(), AuthorityUnavailable> {
        (**self).set_camera_enabled(enabled)
    }
}

/// Destination for captured camera frames.
///
/// Fire-and-forget: callers do not inspect the response beyond success.
pub trait FrameSink {
    /// Submit one JPEG-encoded frame captured at `timestamp_ms`.
    fn submit_frame(&self, jpeg: &[u8], timestamp_ms: u64) -> Result<(), AuthorityUnavailable>;
}

/// A source of inbound [`Event`]s.
///
/// Implementations listen on some transport (a Unix socket, an extension
/// bridge, an in-memory channel, …) and forward parsed events into the
/// provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Event`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Event>) -> Result<(), Self::Error>;
}
