use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Marker appended when captured output exceeds the configured ceiling.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Closed failure taxonomy.
///
/// Wire names are the snake_case form (e.g. `zero_division_error`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, empty, or oversized submission
    InputError,
    /// Submission matched the deny-list of dangerous constructs
    SecurityError,
    /// Sliding-window admission budget exhausted
    RateLimitError,
    SyntaxError,
    IndentationError,
    NameError,
    TypeError,
    ValueError,
    IndexError,
    KeyError,
    ZeroDivisionError,
    /// Generic interpreter failure that matched no specific marker
    RuntimeError,
    /// Wall-clock deadline expired
    TimeoutError,
    /// Host or infrastructure failure, never the learner's fault
    SystemError,
    /// Empty or unparseable diagnostic text
    UnknownError,
}

impl ErrorKind {
    /// The wire name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InputError => "input_error",
            ErrorKind::SecurityError => "security_error",
            ErrorKind::RateLimitError => "rate_limit_error",
            ErrorKind::SyntaxError => "syntax_error",
            ErrorKind::IndentationError => "indentation_error",
            ErrorKind::NameError => "name_error",
            ErrorKind::TypeError => "type_error",
            ErrorKind::ValueError => "value_error",
            ErrorKind::IndexError => "index_error",
            ErrorKind::KeyError => "key_error",
            ErrorKind::ZeroDivisionError => "zero_division_error",
            ErrorKind::RuntimeError => "runtime_error",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::SystemError => "system_error",
            ErrorKind::UnknownError => "unknown_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request to execute a submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The submitted source text
    pub source_text: String,

    /// Lines fed to the program's input prompts, in order
    #[serde(default)]
    pub simulated_inputs: Vec<String>,

    /// Wall-clock deadline override in seconds.
    ///
    /// Must be positive to take effect; otherwise the configured default
    /// applies.
    #[serde(default)]
    pub timeout_seconds: Option<f64>,

    /// Opaque client identifier, resolved by the caller
    pub client_id: String,

    /// Rate-limit bucket tag (e.g. "run" vs "check")
    #[serde(default = "default_endpoint_name")]
    pub endpoint_name: String,
}

fn default_endpoint_name() -> String {
    "run".to_owned()
}

impl ExecutionRequest {
    /// Create a request with no simulated input and the default endpoint
    pub fn new(source_text: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            simulated_inputs: Vec::new(),
            timeout_seconds: None,
            client_id: client_id.into(),
            endpoint_name: default_endpoint_name(),
        }
    }

    /// Set the simulated input lines
    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.simulated_inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the wall-clock deadline in seconds
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Set the rate-limit bucket
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_name = endpoint.into();
        self
    }
}

/// Result of one execution: exactly one variant, matched exhaustively at
/// every consumption site.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success {
        /// Captured stdout, truncated to the configured ceiling
        stdout: String,
        elapsed: Duration,
    },
    Failure(Failure),
}

/// Structured failure carried by [`ExecutionResult::Failure`]
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,

    /// Technical one-liner (exception summary or collaborator error text)
    pub message: String,

    /// Learner-facing explanation
    pub friendly_message: String,

    /// Learner-facing remediation hint
    pub suggestion: String,

    /// Source line of the innermost reported frame.
    /// `None` when no line was reported, never a sentinel value.
    pub line_number: Option<u32>,

    /// Raw interpreter stderr, truncated to the configured ceiling
    pub raw_stderr: String,

    /// Stdout produced before the failure, if any
    pub stdout_partial: Option<String>,

    pub elapsed: Duration,

    /// Populated for rate-limit rejections only
    pub retry_after_seconds: Option<u64>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Shape the result for transport
    pub fn into_response(self, simulated_input_echo: Option<Vec<String>>) -> Response {
        match self {
            ExecutionResult::Success { stdout, elapsed } => Response::Success {
                output: stdout,
                elapsed_seconds: elapsed.as_secs_f64(),
                simulated_input_echo,
            },
            ExecutionResult::Failure(failure) => Response::Error {
                error_kind: failure.kind,
                message: failure.message,
                friendly_message: failure.friendly_message,
                suggestion: failure.suggestion,
                line_number: failure.line_number,
                raw_error_output: failure.raw_stderr,
                partial_output: failure.stdout_partial,
                elapsed_seconds: failure.elapsed.as_secs_f64(),
                retry_after_seconds: failure.retry_after_seconds,
            },
        }
    }
}

/// Transport-independent response shape.
///
/// Serializes with a `status` tag of `"success"` or `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Success {
        output: String,
        elapsed_seconds: f64,
        /// The input lines actually supplied, for UI display
        #[serde(default, skip_serializing_if = "Option::is_none")]
        simulated_input_echo: Option<Vec<String>>,
    },
    Error {
        error_kind: ErrorKind,
        message: String,
        friendly_message: String,
        suggestion: String,
        line_number: Option<u32>,
        raw_error_output: String,
        partial_output: Option<String>,
        elapsed_seconds: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        retry_after_seconds: Option<u64>,
    },
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

/// Truncate `text` to at most `max_chars` characters.
///
/// When the input exceeds the ceiling the result is exactly `max_chars`
/// characters followed by [`TRUNCATION_MARKER`], appended once. Shorter
/// input is returned unchanged.
pub fn truncate_output(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            out
        }
    }
}
