//! Inbound event transport.
//!
//! The recognizer, the popup and ad-hoc scripts connect to a Unix socket
//! and send newline-delimited JSON [`Event`](crate::command::Event)s.

pub mod listener;
