//! Warning-word scanning.
//!
//! A warning word matches when it occurs case-insensitively and is not
//! adjacent to a word character (letter, digit, underscore) on either side.
//! For plain words this is the regex `\b` rule, so `urgent` does not match
//! inside `urgently`; words with punctuation at their edges such as `c++`
//! still match as a whole.

use crate::template::Template;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// A single flagged word found in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceWarning {
    /// The warning word as stored on the template
    pub word: String,
    /// User-facing description
    pub message: String,
}

/// Verdict of a scan. Always recomputed from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    /// True iff no warning word was found
    pub is_compliant: bool,
    /// One entry per matching word, in template order
    pub warnings: Vec<ComplianceWarning>,
}

impl ComplianceResult {
    fn from_warnings(warnings: Vec<ComplianceWarning>) -> Self {
        Self {
            is_compliant: warnings.is_empty(),
            warnings,
        }
    }

    /// The flagged words, in template order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().map(|w| w.word.as_str())
    }
}

/// Scans `text` for the warning words of `template`.
#[must_use]
pub fn scan(text: &str, template: &Template) -> ComplianceResult {
    scan_words(text, &template.warning_words)
}

/// Scans `text` for each of `words`, preserving their order.
#[must_use]
pub fn scan_words<S: AsRef<str>>(text: &str, words: &[S]) -> ComplianceResult {
    let warnings = words
        .iter()
        .map(AsRef::as_ref)
        .filter(|word| contains_whole_word(text, word))
        .map(|word| ComplianceWarning {
            word: word.to_string(),
            message: format!("Warning word \"{word}\" detected"),
        })
        .collect();

    ComplianceResult::from_warnings(warnings)
}

/// Returns true if `word` occurs in `text` as a whole word, ignoring case.
#[must_use]
pub fn contains_whole_word(text: &str, word: &str) -> bool {
    let word = word.trim();
    if word.is_empty() {
        return false;
    }

    match whole_word_regex(word) {
        Some(re) => {
            let found = re.is_match(text);
            trace!(word, found, "Scanned for warning word");
            found
        }
        None => false,
    }
}

fn whole_word_regex(word: &str) -> Option<Regex> {
    let pattern = format!(r"(?:^|\W){}(?:\W|$)", regex::escape(word));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| warn!("Skipping unmatchable warning word '{}': {}", word, e))
        .ok()
}
