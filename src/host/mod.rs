//! Concrete [`Host`](crate::traits::Host) backends.
//!
//! [`bridge`] drives a real browser; [`memory`] is the in-process model
//! used for simulation and tests.  Nothing outside this module should
//! depend on a particular host.

pub mod bridge;
pub mod memory;
