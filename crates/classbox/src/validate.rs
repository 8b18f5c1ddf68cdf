//! Submission pre-screening
//!
//! Rejects malformed, oversized, or pattern-matched-dangerous submissions
//! before any process is spawned. The deny-list is a defense-in-depth
//! heuristic, not a security boundary: pattern matching is evadable (string
//! concatenation can reconstruct any forbidden token), so the resource caps
//! and process-group teardown in [`crate::sandbox`] remain the actual
//! containment layer regardless of what passes here.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::types::ErrorKind;

/// Size ceilings applied before any pattern checks
#[derive(Debug, Clone, Copy)]
pub struct SourcePolicy {
    /// Maximum source length in characters
    pub max_length: usize,
    /// Maximum source line count
    pub max_lines: usize,
}

/// Why a submission was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no code was provided")]
    Empty,

    #[error("code is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("code has too many lines (maximum {max})")]
    TooManyLines { max: usize },

    /// A deny-list rule matched; the message names the blocked construct
    #[error("{0}")]
    Denied(String),
}

impl ValidationError {
    /// The taxonomy kind this rejection maps to
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::Denied(_) => ErrorKind::SecurityError,
            _ => ErrorKind::InputError,
        }
    }
}

struct DenyRule {
    pattern: Regex,
    message: &'static str,
}

/// Dangerous-construct deny-list, checked case-insensitively in order.
/// First match wins and supplies the rejection message.
static DENY_LIST: LazyLock<Vec<DenyRule>> = LazyLock::new(|| {
    [
        (
            r"(?i)\bimport\s+subprocess\b|\bfrom\s+subprocess\s+import\b",
            "spawning processes is not available in lessons",
        ),
        (
            r"(?i)\beval\s*\(",
            "eval() is not available in lessons",
        ),
        (
            r"(?i)\bexec\s*\(",
            "exec() is not available in lessons",
        ),
        (
            r"(?i)\bcompile\s*\(",
            "compile() is not available in lessons",
        ),
        (
            r"(?i)\bos\s*\.\s*(remove|unlink|rmdir)\s*\(|\bshutil\s*\.\s*rmtree\s*\(",
            "deleting files is not available in lessons",
        ),
        (
            r"(?i)\bos\s*\.\s*(system|popen)\s*\(",
            "running system commands is not available in lessons",
        ),
        (
            r"(?i)\bimport\s+os\b|\bfrom\s+os\b",
            "the os module is not available in lessons",
        ),
        (
            r"(?i)\bimport\s+shutil\b|\bfrom\s+shutil\b",
            "the shutil module is not available in lessons",
        ),
        (
            r"(?i)\bimport\s+socket\b|\bfrom\s+socket\b",
            "network access is not available in lessons",
        ),
        (
            r"(?i)\bimport\s+(urllib|requests|http)\b|\bfrom\s+(urllib|requests|http)\b",
            "network access is not available in lessons",
        ),
        (
            r"(?i)__import__",
            "dynamic imports are not available in lessons",
        ),
        (
            r"(?i)\bimportlib\b",
            "dynamic imports are not available in lessons",
        ),
    ]
    .into_iter()
    .map(|(pattern, message)| DenyRule {
        pattern: Regex::new(pattern).expect("deny-list pattern must compile"),
        message,
    })
    .collect()
});

/// Screen a submission against the size ceilings and the deny-list.
///
/// Returns the trimmed source unchanged on success; the validator only
/// accepts or rejects, it never rewrites code.
pub fn validate<'a>(source: &'a str, policy: &SourcePolicy) -> Result<&'a str, ValidationError> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    if trimmed.chars().count() > policy.max_length {
        return Err(ValidationError::TooLong {
            max: policy.max_length,
        });
    }
    if trimmed.lines().count() > policy.max_lines {
        return Err(ValidationError::TooManyLines {
            max: policy.max_lines,
        });
    }
    for rule in DENY_LIST.iter() {
        if rule.pattern.is_match(trimmed) {
            return Err(ValidationError::Denied(rule.message.to_owned()));
        }
    }
    Ok(trimmed)
}
