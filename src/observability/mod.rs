//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; fields over interpolated strings
//! - Secrets (the license key) are never logged in full

pub mod logging;
