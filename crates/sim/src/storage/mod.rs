//! Storage module for persisting simulation state.
//!
//! This module provides the count trace recorded during a run and the
//! versioned snapshot used to export, resume and compare runs.

pub mod snapshot;
pub mod types;

pub use snapshot::{Snapshot, SNAPSHOT_FORMAT, SNAPSHOT_VERSION};
pub use types::{RecordingStrategy, TraceEntry};
