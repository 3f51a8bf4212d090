//! Boilerplate removal for pasted AI output.
//!
//! Chat models like to open with a sentence about the answer rather than
//! the answer itself. The filter strips those preambles from the start of
//! the text only; the body is never touched.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Known preamble phrases, in match priority order.
const PREAMBLE_PHRASES: &[&str] = &[
    "Here is a summary:",
    "Here's a response I've drafted:",
    "Is there anything else you need help with?",
    "Here's what I've come up with:",
    "I hope this helps.",
    "Let me know if you need any clarification.",
    "Here's my response:",
];

static PREAMBLE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    PREAMBLE_PHRASES
        .iter()
        .filter_map(|&phrase| {
            let body = regex::escape(phrase).replace('\'', "['’]");
            Regex::new(&format!("(?i)^{body}")).ok().map(|re| (phrase, re))
        })
        .collect()
});

/// Result of [`clean_boilerplate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    /// The cleaned text
    pub text: String,
    /// Preamble phrases removed, in the order they were stripped
    pub removed: Vec<&'static str>,
    /// Whether the text differs from the input (trimming counts)
    pub changed: bool,
}

/// Strips known preamble phrases from the start of `text`.
///
/// The text is trimmed, then leading phrases are removed one at a time
/// (re-trimming after each) until none matches at the start. Running the
/// filter on its own output is a no-op.
#[must_use]
pub fn clean_boilerplate(text: &str) -> CleanOutcome {
    let mut rest = text.trim();
    let mut removed = Vec::new();

    while let Some((phrase, end)) = leading_preamble(rest) {
        removed.push(phrase);
        rest = rest[end..].trim();
    }

    if !removed.is_empty() {
        debug!("Removed {} preamble phrase(s)", removed.len());
    }

    CleanOutcome {
        text: rest.to_string(),
        removed,
        changed: rest != text,
    }
}

fn leading_preamble(text: &str) -> Option<(&'static str, usize)> {
    PREAMBLE_PATTERNS
        .iter()
        .find_map(|(phrase, re)| re.find(text).map(|m| (*phrase, m.end())))
}
