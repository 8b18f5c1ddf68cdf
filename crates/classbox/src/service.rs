//! Request orchestration
//!
//! One request/response cycle: kill switch, admission, validation, sandboxed
//! run, diagnostic translation. Cheapest failures fail fastest: the limiter
//! and validator reject before any subprocess exists. Every collaborator
//! error is recovered here into a structured failure; nothing unstructured
//! reaches the caller.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::diagnose::{self, advice};
use crate::limiter::{RateDecision, RateLimiter};
use crate::sandbox::{self, RunVerdict};
use crate::types::{ErrorKind, ExecutionRequest, ExecutionResult, Failure, Response};
use crate::validate;

/// High-level execution service.
///
/// Owns the rate limiter outright; construct one service per process and
/// share it across workers.
#[derive(Debug)]
pub struct ExecutionService {
    config: Config,
    limiter: RateLimiter,
}

impl ExecutionService {
    /// Create a service with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            limiter: RateLimiter::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one request through the full pipeline
    #[instrument(skip(self, request), fields(client = %request.client_id, endpoint = %request.endpoint_name))]
    pub async fn handle(&self, request: ExecutionRequest) -> Response {
        let echo = if request.simulated_inputs.is_empty() {
            None
        } else {
            Some(request.simulated_inputs.clone())
        };
        self.execute(request).await.into_response(echo)
    }

    async fn execute(&self, request: ExecutionRequest) -> ExecutionResult {
        if !self.config.execution_enabled {
            debug!("execution disabled by configuration");
            return ExecutionResult::Failure(failure(
                ErrorKind::SystemError,
                "code execution is currently disabled",
                Duration::ZERO,
            ));
        }

        let budget = self.config.rate_limit_for(&request.endpoint_name);
        let decision = self.limiter.check(
            &request.client_id,
            &request.endpoint_name,
            budget.max_requests,
            Duration::from_secs(budget.window_seconds),
        );
        if let RateDecision::Denied {
            retry_after_seconds,
        } = decision
        {
            debug!(retry_after_seconds, "request rate limited");
            let mut denied = failure(
                ErrorKind::RateLimitError,
                "too many requests",
                Duration::ZERO,
            );
            denied.retry_after_seconds = Some(retry_after_seconds);
            return ExecutionResult::Failure(denied);
        }

        let source = match validate::validate(&request.source_text, &self.config.source_policy()) {
            Ok(source) => source.to_owned(),
            Err(e) => {
                debug!(error = %e, "submission rejected");
                return ExecutionResult::Failure(failure(e.kind(), &e.to_string(), Duration::ZERO));
            }
        };

        let timeout = self.config.effective_timeout(request.timeout_seconds);
        let raw = match sandbox::run_source(
            &self.config,
            &source,
            &request.simulated_inputs,
            timeout,
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "sandbox failure");
                return ExecutionResult::Failure(failure(
                    ErrorKind::SystemError,
                    &e.to_string(),
                    Duration::ZERO,
                ));
            }
        };

        match raw.verdict {
            RunVerdict::Exited(0) => ExecutionResult::Success {
                stdout: raw.stdout,
                elapsed: raw.elapsed,
            },
            RunVerdict::TimedOut => {
                let mut timed_out = failure(
                    ErrorKind::TimeoutError,
                    &format!(
                        "execution timed out after {:.1} seconds",
                        timeout.as_secs_f64()
                    ),
                    raw.elapsed,
                );
                timed_out.raw_stderr = raw.stderr;
                timed_out.stdout_partial = non_empty(raw.stdout);
                ExecutionResult::Failure(timed_out)
            }
            RunVerdict::Exited(_) | RunVerdict::Signaled(_) => {
                let classified = diagnose::classify(&raw.stderr);
                ExecutionResult::Failure(Failure {
                    kind: classified.kind,
                    message: classified.message,
                    friendly_message: classified.friendly_message,
                    suggestion: classified.suggestion,
                    line_number: classified.line_number,
                    raw_stderr: raw.stderr,
                    stdout_partial: non_empty(raw.stdout),
                    elapsed: raw.elapsed,
                    retry_after_seconds: None,
                })
            }
        }
    }
}

/// Failure with the fixed advice copy for kinds that carry no interpreter
/// text
fn failure(kind: ErrorKind, message: &str, elapsed: Duration) -> Failure {
    let (friendly_message, suggestion) = advice(kind);
    Failure {
        kind,
        message: message.to_owned(),
        friendly_message: friendly_message.to_owned(),
        suggestion: suggestion.to_owned(),
        line_number: None,
        raw_stderr: String::new(),
        stdout_partial: None,
        elapsed,
        retry_after_seconds: None,
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}
