//! Shared utilities for nsgate
//!
//! Holds the process-level plumbing shared by the nsgate binaries, starting
//! with tracing initialization.

pub mod tracing;

pub use self::tracing::*;
