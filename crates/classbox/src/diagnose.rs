//! Learner-facing translation of interpreter diagnostics
//!
//! Pure classification of raw stderr text into the closed failure taxonomy:
//! the same input always produces the same classification, with no hidden
//! state. Raw tracebacks are preserved elsewhere for debugging; the output
//! here is the friendly explanation a learner reads first.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ErrorKind;

/// Longest technical summary kept in [`Classification::message`]
const MAX_MESSAGE_CHARS: usize = 400;

/// Classified diagnostic for one failed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,

    /// Technical one-liner: the exception summary from the raw text
    pub message: String,

    pub friendly_message: String,

    pub suggestion: String,

    /// Source line of the innermost reported frame, if any reported.
    /// `None` when absent, never a sentinel value.
    pub line_number: Option<u32>,
}

/// Marker substrings checked against the lowercased text, in priority order.
/// First match determines the kind; anything unmatched is the generic
/// runtime bucket.
const MARKERS: &[(&str, ErrorKind)] = &[
    ("timeouterror", ErrorKind::TimeoutError),
    ("timed out", ErrorKind::TimeoutError),
    ("syntaxerror", ErrorKind::SyntaxError),
    ("indentationerror", ErrorKind::IndentationError),
    ("taberror", ErrorKind::IndentationError),
    ("nameerror", ErrorKind::NameError),
    ("typeerror", ErrorKind::TypeError),
    ("valueerror", ErrorKind::ValueError),
    ("indexerror", ErrorKind::IndexError),
    ("keyerror", ErrorKind::KeyError),
    ("zerodivisionerror", ErrorKind::ZeroDivisionError),
];

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"name '([^']+)' is not defined").expect("name pattern must compile")
});

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bline (\d+)").expect("line pattern must compile"));

/// Classify raw interpreter stderr into the failure taxonomy.
///
/// Empty or whitespace-only input is the unknown bucket. Unmatched text
/// lands in the generic runtime bucket; that fallback is deliberate, so
/// exceptions like AttributeError still get a useful (if generic) answer.
pub fn classify(raw_stderr: &str) -> Classification {
    if raw_stderr.trim().is_empty() {
        let (friendly_message, suggestion) = advice(ErrorKind::UnknownError);
        return Classification {
            kind: ErrorKind::UnknownError,
            message: String::new(),
            friendly_message: friendly_message.to_owned(),
            suggestion: suggestion.to_owned(),
            line_number: None,
        };
    }

    let lowered = raw_stderr.to_lowercase();
    let kind = MARKERS
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|&(_, kind)| kind)
        .unwrap_or(ErrorKind::RuntimeError);

    let line_number = extract_line_number(raw_stderr);
    let message = summary_line(raw_stderr);

    if kind == ErrorKind::NameError
        && let Some(ident) = NAME_RE
            .captures(raw_stderr)
            .and_then(|captures| captures.get(1))
    {
        let ident = ident.as_str();
        return Classification {
            kind,
            message,
            friendly_message: format!(
                "You used a variable called '{ident}' that hasn't been created yet."
            ),
            suggestion: format!("Create '{ident}' before this line, or check its spelling."),
            line_number,
        };
    }

    let (friendly_message, suggestion) = advice(kind);
    Classification {
        kind,
        message,
        friendly_message: friendly_message.to_owned(),
        suggestion: suggestion.to_owned(),
        line_number,
    }
}

/// Fixed learner-facing copy for a failure kind.
///
/// The orchestrator reuses this for kinds that never reach the classifier
/// (input, security, rate limit, system), so every failure speaks with the
/// same voice.
pub fn advice(kind: ErrorKind) -> (&'static str, &'static str) {
    match kind {
        ErrorKind::InputError => (
            "There's a problem with the code you submitted.",
            "Make sure you submit some code and keep it within the size limits.",
        ),
        ErrorKind::SecurityError => (
            "Your code uses something that isn't available in lessons.",
            "Stick to the tools the lesson introduces; the blocked part is named above.",
        ),
        ErrorKind::RateLimitError => (
            "You're running code a little too quickly.",
            "Wait a moment and try again.",
        ),
        ErrorKind::SyntaxError => (
            "There's a syntax problem in your code.",
            "Check for missing or unbalanced parentheses, quotes, or colons.",
        ),
        ErrorKind::IndentationError => (
            "The spacing at the start of a line isn't right.",
            "Use consistent indentation (4 spaces per level) and don't mix tabs with spaces.",
        ),
        ErrorKind::NameError => (
            "You used a variable that hasn't been created yet.",
            "Define the variable before using it, and check the spelling.",
        ),
        ErrorKind::TypeError => (
            "Two different types of values got mixed together.",
            "Check that you're combining compatible kinds of data, like using str() on a number before adding it to text.",
        ),
        ErrorKind::ValueError => (
            "A value didn't have the form the code expected.",
            "Check the format of the value, like making sure text is numeric before int().",
        ),
        ErrorKind::IndexError => (
            "The code tried to read past the end of a list.",
            "Remember positions start at 0, so a list with 3 items ends at position 2.",
        ),
        ErrorKind::KeyError => (
            "The code looked up a dictionary key that doesn't exist.",
            "Check the key's spelling, or use .get() to supply a fallback.",
        ),
        ErrorKind::ZeroDivisionError => (
            "The code tried to divide by zero.",
            "That's undefined in math, so check the divisor before dividing.",
        ),
        ErrorKind::RuntimeError => (
            "A problem came up while your code was running.",
            "Read the last line of the error message; it usually names what went wrong.",
        ),
        ErrorKind::TimeoutError => (
            "Your code timed out.",
            "Look for infinite loops and make sure every loop has a way to finish.",
        ),
        ErrorKind::SystemError => (
            "The platform hit a problem running your code.",
            "This one isn't your fault. Try again in a moment.",
        ),
        ErrorKind::UnknownError => (
            "An unknown error occurred.",
            "Try running your code again, and simplify it if the problem persists.",
        ),
    }
}

/// Last `line <n>` token in scan order: the innermost reported frame
fn extract_line_number(raw: &str) -> Option<u32> {
    LINE_RE
        .captures_iter(raw)
        .filter_map(|captures| captures.get(1)?.as_str().parse().ok())
        .last()
}

/// Last non-empty line of the raw text, length-capped
fn summary_line(raw: &str) -> String {
    raw.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}
