//! Template data model and the in-memory template store.
//!
//! A template bundles free-text formatting instructions with a list of
//! warning words. Users edit a single draft; saving it freezes a copy into
//! the store under a fresh id and resets the draft.

use crate::error::{Error, Result};
use crate::preset::TemplateKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Opaque template identifier, derived from the creation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(i64);

impl TemplateId {
    /// Returns the raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of adding a warning word to a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordChange {
    /// The normalized word was appended
    Added,
    /// The word was already present (case-insensitive)
    Duplicate,
    /// The word was empty after trimming
    Ignored,
}

/// A template that has not been saved yet.
///
/// All editing happens here; saved [`Template`]s are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    /// Display name, used as the selection key
    pub name: String,
    /// Formatting instructions passed to the text-generation API
    pub content: String,
    /// Flagged words in insertion order
    pub warning_words: Vec<String>,
    /// Alternative words per flagged word. Carried along, never consumed.
    #[serde(default)]
    pub synonyms: BTreeMap<String, BTreeSet<String>>,
    /// Built-in starter template this draft was seeded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TemplateKind>,
}

impl TemplateDraft {
    /// Creates a draft with the given name and instructions.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Adds each word through [`Self::add_warning_word`].
    #[must_use]
    pub fn with_warning_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.add_warning_word(word.as_ref());
        }
        self
    }

    /// Trims and lower-cases `word`, then appends it unless already present.
    pub fn add_warning_word(&mut self, word: &str) -> WordChange {
        let normalized = word.trim().to_lowercase();
        if normalized.is_empty() {
            return WordChange::Ignored;
        }

        if self
            .warning_words
            .iter()
            .any(|w| w.to_lowercase() == normalized)
        {
            return WordChange::Duplicate;
        }

        self.warning_words.push(normalized);
        WordChange::Added
    }

    /// Removes the exact match of `word`. Returns whether anything changed.
    pub fn remove_warning_word(&mut self, word: &str) -> bool {
        let before = self.warning_words.len();
        self.warning_words.retain(|w| w != word);
        self.warning_words.len() != before
    }

    /// Checks that the draft carries the fields required for saving.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name or the content is blank.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.content.trim().is_empty() {
            return Err(Error::validation(
                "Please fill in template name and content.",
            ));
        }
        Ok(())
    }
}

/// A saved template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Identifier assigned at save time
    pub id: TemplateId,
    /// Display name
    pub name: String,
    /// Formatting instructions
    pub content: String,
    /// Flagged words in insertion order
    pub warning_words: Vec<String>,
    /// Inert synonym map
    #[serde(default)]
    pub synonyms: BTreeMap<String, BTreeSet<String>>,
    /// Starter template kind, if seeded from one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TemplateKind>,
}

impl Template {
    fn from_draft(id: TemplateId, draft: TemplateDraft) -> Self {
        Self {
            id,
            name: draft.name,
            content: draft.content,
            warning_words: draft.warning_words,
            synonyms: draft.synonyms,
            kind: draft.kind,
        }
    }
}

/// In-memory collection of templates plus the working draft.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
    draft: TemplateDraft,
    last_id: Option<TemplateId>,
}

impl TemplateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns saved templates in creation order.
    #[must_use]
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    /// Number of saved templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true when no template has been saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The working draft.
    #[must_use]
    pub const fn draft(&self) -> &TemplateDraft {
        &self.draft
    }

    /// Mutable access to the working draft.
    pub fn draft_mut(&mut self) -> &mut TemplateDraft {
        &mut self.draft
    }

    /// Replaces the working draft wholesale.
    pub fn replace_draft(&mut self, draft: TemplateDraft) {
        self.draft = draft;
    }

    /// Looks a template up by id.
    #[must_use]
    pub fn get(&self, id: TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Returns the first template with the given name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Saves the working draft and resets it to an empty draft.
    ///
    /// # Errors
    ///
    /// Returns a validation error (leaving store and draft untouched) if
    /// the draft has no name or no content.
    pub fn save(&mut self) -> Result<&Template> {
        self.draft.validate()?;
        let draft = std::mem::take(&mut self.draft);
        Ok(self.insert(draft))
    }

    /// Saves the built-in starter template for `kind`.
    ///
    /// The working draft is left alone.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the starter template is incomplete.
    pub fn seed(&mut self, kind: TemplateKind) -> Result<&Template> {
        let draft = kind.draft();
        draft.validate()?;
        Ok(self.insert(draft))
    }

    /// Removes the template with `id`. Unknown ids are ignored.
    pub fn delete(&mut self, id: TemplateId) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        let removed = self.templates.len() != before;
        if removed {
            debug!("Deleted template {}", id);
        }
        removed
    }

    fn insert(&mut self, draft: TemplateDraft) -> &Template {
        let id = self.next_id();
        debug!("Saving template '{}' as {}", draft.name, id);
        self.templates.push(Template::from_draft(id, draft));
        &self.templates[self.templates.len() - 1]
    }

    fn next_id(&mut self) -> TemplateId {
        let now = chrono::Utc::now().timestamp_millis();
        let id = match self.last_id {
            Some(TemplateId(last)) if now <= last => TemplateId(last + 1),
            _ => TemplateId(now),
        };
        self.last_id = Some(id);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formal_draft() -> TemplateDraft {
        TemplateDraft::new("Formal", "Dear [Name], ... Best regards")
            .with_warning_words(["urgent", "asap"])
    }

    #[test]
    fn test_add_warning_word_normalizes() {
        let mut draft = TemplateDraft::default();
        assert_eq!(draft.add_warning_word("  URGENT "), WordChange::Added);
        assert_eq!(draft.warning_words, vec!["urgent"]);
    }

    #[test]
    fn test_add_warning_word_suppresses_duplicates() {
        let mut draft = formal_draft();
        assert_eq!(draft.add_warning_word("Urgent"), WordChange::Duplicate);
        assert_eq!(draft.add_warning_word("   "), WordChange::Ignored);
        assert_eq!(draft.warning_words, vec!["urgent", "asap"]);
    }

    #[test]
    fn test_add_then_remove_restores_sequence() {
        let mut draft = TemplateDraft::default().with_warning_words(["alpha", "beta", "gamma"]);
        let original = draft.warning_words.clone();

        assert_eq!(draft.add_warning_word("delta"), WordChange::Added);
        assert!(draft.remove_warning_word("delta"));

        assert_eq!(draft.warning_words, original);
    }

    #[test]
    fn test_remove_is_exact_match() {
        let mut draft = formal_draft();
        assert!(!draft.remove_warning_word("URGENT"));
        assert!(draft.remove_warning_word("urgent"));
        assert_eq!(draft.warning_words, vec!["asap"]);
    }

    #[test]
    fn test_save_resets_draft() {
        let mut store = TemplateStore::new();
        store.replace_draft(formal_draft());

        let saved = store.save().unwrap();
        assert_eq!(saved.name, "Formal");
        assert_eq!(saved.warning_words, vec!["urgent", "asap"]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.draft(), &TemplateDraft::default());
    }

    #[test]
    fn test_save_with_empty_name_is_rejected() {
        let mut store = TemplateStore::new();
        store.replace_draft(TemplateDraft::new("", "some content"));

        let err = store.save().unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());
        assert_eq!(store.draft().content, "some content");
    }

    #[test]
    fn test_save_with_blank_content_is_rejected() {
        let mut store = TemplateStore::new();
        store.replace_draft(TemplateDraft::new("Name", "  \n "));
        assert!(store.save().is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut store = TemplateStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            store.replace_draft(TemplateDraft::new(format!("T{i}"), "content"));
            ids.push(store.save().unwrap().id);
        }

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_delete_by_id() {
        let mut store = TemplateStore::new();
        store.replace_draft(formal_draft());
        let id = store.save().unwrap().id;

        assert!(store.delete(id));
        assert!(store.is_empty());
        assert!(!store.delete(id));
    }

    #[test]
    fn test_find_by_name() {
        let mut store = TemplateStore::new();
        store.replace_draft(formal_draft());
        store.save().unwrap();

        assert!(store.find("Formal").is_some());
        assert!(store.find("formal").is_none());
    }

    #[test]
    fn test_seed_keeps_draft() {
        let mut store = TemplateStore::new();
        store.draft_mut().name = "work in progress".to_string();

        let seeded = store.seed(TemplateKind::MarketingCopy).unwrap();
        assert_eq!(seeded.kind, Some(TemplateKind::MarketingCopy));
        assert_eq!(store.draft().name, "work in progress");
    }

    #[test]
    fn test_template_json_shape() {
        let mut store = TemplateStore::new();
        store.replace_draft(formal_draft());
        let saved = store.save().unwrap().clone();

        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["warningWords"][0], "urgent");
        assert!(json["synonyms"].as_object().unwrap().is_empty());
        assert!(json.get("kind").is_none());
    }
}
