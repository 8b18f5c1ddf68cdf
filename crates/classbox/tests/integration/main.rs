//! Integration tests for classbox
//!
//! These tests require a `python3` binary on PATH.
//! Run with: cargo test -p classbox --features integration-tests

#![cfg(feature = "integration-tests")]

use classbox::Config;
use tempfile::TempDir;

mod diagnostics;
mod execution;
mod limits_and_timeout;
mod service_flow;

/// Config whose scratch root lives in a throwaway directory owned by the
/// test, so cleanup assertions can inspect it.
pub(crate) fn test_config() -> (Config, TempDir) {
    let scratch = tempfile::tempdir().expect("failed to create scratch dir");
    let mut config = Config::default();
    config.scratch_dir = Some(scratch.path().to_path_buf());
    (config, scratch)
}

/// Count leftover entries in the scratch root
pub(crate) fn scratch_entries(scratch: &TempDir) -> usize {
    std::fs::read_dir(scratch.path())
        .map(|entries| entries.count())
        .unwrap_or(0)
}
