//! Sliding-window admission control
//!
//! Each `(client, endpoint)` pair gets an independent budget evaluated over
//! a trailing time window. The window map lives for the life of the process;
//! entries are pruned on every check and keys are bounded by the distinct
//! clients seen.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Request admitted; `remaining` is the budget left in the window
    Allowed { remaining: u32 },
    /// Budget exhausted; retry once the window has moved on
    Denied { retry_after_seconds: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Sliding-window rate limiter.
///
/// Owns its window map outright; inject one instance into the orchestrator
/// rather than sharing ambient state. The read-prune-append sequence runs
/// under one lock so concurrent workers cannot undercount.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(String, String), Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record one request for `(client_id, endpoint)`.
    ///
    /// Timestamps older than the window are dropped; if at least
    /// `max_requests` remain the request is denied without being recorded.
    pub fn check(
        &self,
        client_id: &str,
        endpoint: &str,
        max_requests: u32,
        window: Duration,
    ) -> RateDecision {
        self.check_at(Instant::now(), client_id, endpoint, max_requests, window)
    }

    fn check_at(
        &self,
        now: Instant,
        client_id: &str,
        endpoint: &str,
        max_requests: u32,
        window: Duration,
    ) -> RateDecision {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let stamps = windows
            .entry((client_id.to_owned(), endpoint.to_owned()))
            .or_default();

        // Drop entries strictly older than the window. A cutoff before the
        // process started means nothing can be stale yet.
        if let Some(cutoff) = now.checked_sub(window) {
            stamps.retain(|&stamp| stamp >= cutoff);
        }

        if stamps.len() as u32 >= max_requests {
            return RateDecision::Denied {
                retry_after_seconds: window.as_secs(),
            };
        }

        stamps.push(now);
        RateDecision::Allowed {
            remaining: max_requests - stamps.len() as u32,
        }
    }
}

/// Resolve a best-effort client identity from connection metadata.
///
/// Order: first entry of the forwarded-for header, then the forwarded
/// real-ip header, then the direct connection address, then loopback.
/// Clients behind no trusted proxy can spoof the headers; this is a known
/// limitation of header-based identity, accepted for admission control.
pub fn resolve_client_id(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    remote_addr: Option<&str>,
) -> String {
    if let Some(header) = forwarded_for
        && let Some(first) = header.split(',').next()
        && !first.trim().is_empty()
    {
        return first.trim().to_owned();
    }
    if let Some(ip) = real_ip
        && !ip.trim().is_empty()
    {
        return ip.trim().to_owned();
    }
    if let Some(addr) = remote_addr
        && !addr.trim().is_empty()
    {
        return addr.trim().to_owned();
    }
    "127.0.0.1".to_owned()
}
