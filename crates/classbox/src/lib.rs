//! A library for sandboxed execution of student-submitted Python code.
//!
//! Classbox runs untrusted lesson submissions as real interpreter
//! subprocesses, feeds them simulated interactive input, bounds their
//! resource consumption, and translates failures into learner-friendly
//! structured diagnostics.
//!
//! # Features
//!
//! - **Submission screening** — size ceilings plus a table-driven deny-list
//!   of dangerous constructs, checked before any process is spawned.
//! - **Sliding-window rate limiting** — per-client, per-endpoint admission
//!   control with independent budgets.
//! - **Sandboxed execution** — one throwaway scratch unit per run, OS
//!   resource caps, a wall-clock deadline, and process-group teardown.
//! - **Simulated input** — pre-supplied lines stand in for a live user at
//!   the program's input prompts.
//! - **Friendly diagnostics** — interpreter failures classified into a
//!   closed taxonomy with a plain-language explanation, a suggestion, and
//!   the offending line.

pub use config::{Config, ConfigError, EXAMPLE_CONFIG, RateLimitConfig};
pub use diagnose::{Classification, advice, classify};
pub use limiter::{RateDecision, RateLimiter, resolve_client_id};
pub use sandbox::{ExecutionUnit, RawRun, RunVerdict, SandboxError, SandboxLimits, run_source};
pub use service::ExecutionService;
pub use types::{
    ErrorKind, ExecutionRequest, ExecutionResult, Failure, Response, TRUNCATION_MARKER,
    truncate_output,
};
pub use validate::{SourcePolicy, ValidationError};

pub mod config;
pub mod diagnose;
pub mod limiter;
pub mod sandbox;
pub mod service;
pub mod types;
pub mod validate;
