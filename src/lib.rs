//! **gestured**: turns recognized hand gestures into browser actions.
//!
//! A recognizer emits gesture labels ("fist", "open_palm", …).  Each label
//! is mapped to a logical command, rate-limited per command, checked
//! against a remote authority that can switch gesture control off, and
//! finally carried out on the active document of a tabbed host.
//!
//! # Architecture
//!
//! The crate is organised around the seams in [`traits`]:
//!
//! * [`traits::Host`] abstracts the tabbed document host, so command
//!   semantics are not coupled to any particular browser.
//! * [`traits::Authority`] abstracts the remote on/off switch.
//! * [`traits::EventSource`] abstracts the transport that delivers
//!   events (a Unix socket, a test harness, …).
//!
//! [`engine::DispatchEngine`] owns all mutable state and wires
//! [`mapper`], [`cooldown`], the authority gate, [`executor`] and
//! [`lifecycle`] together.  Concrete backends live in [`authority::http`],
//! [`host::memory`] and [`ipc`].

pub mod authority;
pub mod command;
pub mod config;
pub mod cooldown;
pub mod engine;
pub mod executor;
pub mod host;
pub mod ipc;
pub mod lifecycle;
pub mod mapper;
pub mod traits;
