//! Sandboxed execution of submissions
//!
//! Runs one validated submission as one interpreter subprocess inside a
//! throwaway execution unit, under OS resource caps and a wall-clock
//! deadline. This layer reports raw captured output and timing only;
//! interpreting failure text is [`crate::diagnose`]'s job.
//!
//! The caps applied here, together with killing the whole process group on
//! timeout, are the containment boundary for untrusted code. The deny-list
//! in [`crate::validate`] is only a pre-filter in front of this layer.

use thiserror::Error;

pub use crate::sandbox::limits::SandboxLimits;
pub use crate::sandbox::runner::{RawRun, RunVerdict, run_source};
pub use crate::sandbox::unit::ExecutionUnit;

mod limits;
mod runner;
mod unit;

/// Errors that occur while setting up or supervising a run
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to create execution unit: {0}")]
    Unit(#[source] std::io::Error),

    #[error("failed to spawn interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
