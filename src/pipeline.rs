use crate::{
    client::{HttpGenerator, TextGenerator},
    clipboard::ClipboardSource,
    config::Config,
    error::{Error, Result},
    filter::{clean_boilerplate, CleanOutcome},
    notify::{Level, Notification},
    preset::TemplateKind,
    prompt::InstructionRenderer,
    scanner::{self, ComplianceResult},
    session::{GateEvent, GateState, Session},
    storage::{CredentialStore, FileStore, MemoryStore},
    template::{Template, TemplateDraft, TemplateId, TemplateStore, WordChange},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Top-level controller owning all state for one session.
///
/// Every user action maps to one method. Failures leave the session in a
/// well-defined state and queue exactly one error [`Notification`].
pub struct Pipeline {
    config: Config,
    generator: Arc<dyn TextGenerator>,
    renderer: InstructionRenderer,
    storage: Box<dyn CredentialStore>,
    templates: TemplateStore,
    session: Session,
    credential: String,
    notifications: Vec<Notification>,
}

impl Pipeline {
    /// Creates a pipeline with explicit collaborators.
    ///
    /// The credential is loaded from `storage` if present. A storage read
    /// failure is logged and the session starts without a credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(
        config: Config,
        generator: Arc<dyn TextGenerator>,
        storage: Box<dyn CredentialStore>,
    ) -> Result<Self> {
        config.validate()?;
        let renderer = InstructionRenderer::new(config.instructions_template.as_deref())?;

        let credential = match storage.get(&config.credential_key) {
            Ok(stored) => stored.unwrap_or_default().trim().to_string(),
            Err(e) => {
                warn!("Could not read stored API key: {}", e);
                String::new()
            }
        };

        Ok(Self {
            config,
            generator,
            renderer,
            storage,
            templates: TemplateStore::new(),
            session: Session::default(),
            credential,
            notifications: Vec::new(),
        })
    }

    /// Creates a pipeline talking HTTP to the configured endpoint, with the
    /// credential persisted at `config.credential_path` (memory otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let generator = Arc::new(HttpGenerator::new(&config)?);
        let storage: Box<dyn CredentialStore> = match config.credential_path {
            Some(ref path) => Box::new(FileStore::new(path)),
            None => Box::new(MemoryStore::new()),
        };
        Self::new(config, generator, storage)
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Session state (content, gate, results).
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Template store.
    #[must_use]
    pub const fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Queued notifications, oldest first.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drains the notification queue.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn notify(&mut self, level: Level, title: &str, message: impl Into<String>) {
        let notification = Notification::new(level, title, message);
        debug!("{}", notification);
        self.notifications.push(notification);
    }

    fn fail(&mut self, title: &str, error: Error) -> Error {
        self.notify(Level::Error, title, error.to_string());
        error
    }

    // ------------------------------------------------------------------
    // Credential
    // ------------------------------------------------------------------

    /// The in-memory credential.
    #[must_use]
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Replaces the in-memory credential. It is persisted after the next
    /// successful API call.
    pub fn set_credential(&mut self, credential: impl Into<String>) {
        self.credential = credential.into().trim().to_string();
    }

    fn persist_credential(&mut self) {
        if self.credential.is_empty() {
            return;
        }

        let key = self.config.credential_key.clone();
        let stored = self.storage.get(&key).ok().flatten();
        if stored.as_deref() == Some(self.credential.as_str()) {
            return;
        }

        match self.storage.set(&key, &self.credential) {
            Ok(()) => info!("Stored API key for future sessions"),
            Err(e) => warn!("Failed to store API key: {}", e),
        }
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    /// Mutable access to the working draft.
    pub fn draft_mut(&mut self) -> &mut TemplateDraft {
        self.templates.draft_mut()
    }

    /// Replaces the working draft wholesale.
    pub fn replace_draft(&mut self, draft: TemplateDraft) {
        self.templates.replace_draft(draft);
    }

    /// Adds a warning word to the draft.
    pub fn add_warning_word(&mut self, word: &str) -> WordChange {
        let change = self.templates.draft_mut().add_warning_word(word);
        let normalized = word.trim().to_lowercase();
        match change {
            WordChange::Added => self.notify(
                Level::Success,
                "Warning Word Added",
                format!("\"{normalized}\" will be flagged."),
            ),
            WordChange::Duplicate => self.notify(
                Level::Info,
                "Duplicate Warning Word",
                format!("\"{normalized}\" is already in the list."),
            ),
            WordChange::Ignored => {}
        }
        change
    }

    /// Removes a warning word (exact match) from the draft.
    pub fn remove_warning_word(&mut self, word: &str) -> bool {
        self.templates.draft_mut().remove_warning_word(word)
    }

    /// Saves the working draft.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft lacks a name or content.
    pub fn save_template(&mut self) -> Result<TemplateId> {
        match self.templates.save() {
            Ok(template) => {
                let id = template.id;
                self.notify(
                    Level::Success,
                    "Template Saved",
                    "Your new template has been saved successfully.",
                );
                Ok(id)
            }
            Err(e) => Err(self.fail("Missing Information", e)),
        }
    }

    /// Saves the built-in starter template for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the starter template is incomplete.
    pub fn seed_template(&mut self, kind: TemplateKind) -> Result<TemplateId> {
        match self.templates.seed(kind) {
            Ok(template) => {
                let id = template.id;
                self.notify(
                    Level::Success,
                    "Template Saved",
                    format!("Added the \"{}\" template.", kind.display_name()),
                );
                Ok(id)
            }
            Err(e) => Err(self.fail("Missing Information", e)),
        }
    }

    /// Deletes a template. Unknown ids are ignored silently.
    pub fn delete_template(&mut self, id: TemplateId) -> bool {
        let removed = self.templates.delete(id);
        if removed {
            self.notify(Level::Success, "Template Deleted", "The template has been removed.");
        }
        removed
    }

    /// Selects the template used for verify and convert.
    pub fn select_template(&mut self, name: Option<&str>) {
        self.session.select_template(name);
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Replaces the raw content, as if typed by the user.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.session.set_content(content);
        debug!(revision = self.session.revision(), "Content edited");
    }

    /// Replaces the raw content with the clipboard text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClipboardUnavailable`] and leaves the content alone
    /// if the clipboard cannot be read.
    pub fn paste(&mut self, clipboard: &mut dyn ClipboardSource) -> Result<()> {
        match clipboard.read_text() {
            Ok(text) => {
                self.set_content(text);
                Ok(())
            }
            Err(e) => Err(self.fail("Clipboard Error", e)),
        }
    }

    /// Strips known preamble phrases from the raw content.
    ///
    /// A change counts as an edit and resets verification.
    pub fn clean_boilerplate(&mut self) -> CleanOutcome {
        let outcome = clean_boilerplate(self.session.content());
        if outcome.changed {
            self.set_content(outcome.text.clone());
            self.notify(
                Level::Success,
                "Content Cleaned",
                "Unnecessary prefatory phrases have been removed.",
            );
        } else {
            self.notify(
                Level::Info,
                "No Changes Needed",
                "No prefatory phrases were found in the content.",
            );
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------

    /// Sends `text` to the text-generation API, formatted per `template`.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingCredential`] if no credential is set and one is required
    /// - [`Error::InvalidCredential`] if the API rejects the credential
    /// - [`Error::Processing`] for any other failure
    pub async fn invoke(&self, text: &str, template: &Template) -> Result<String> {
        self.prepare(template)?.send(text).await
    }

    fn prepare(&self, template: &Template) -> Result<PreparedCall> {
        if self.credential.is_empty() && self.config.require_credential {
            return Err(Error::MissingCredential);
        }

        let instructions = self
            .renderer
            .render(template)
            .map_err(|e| Error::processing(e.to_string()))?;

        Ok(PreparedCall {
            generator: Arc::clone(&self.generator),
            instructions,
            credential: self.credential.clone(),
        })
    }

    /// Prepares and sends the API call for the in-flight gate state. The
    /// gate is rolled back if the returned future is dropped before the
    /// call completes.
    async fn call_in_flight(&mut self, template: &Template) -> Result<String> {
        let call = self.prepare(template)?;
        let content = self.session.content().to_string();

        let guard = InFlight::arm(&mut self.session);
        let outcome = call.send(&content).await;
        guard.disarm();
        outcome
    }

    /// Runs the content through the API and scans the result.
    ///
    /// On success the gate moves to `Verified` and convert becomes
    /// available. On failure it returns to `Unverified`.
    ///
    /// # Errors
    ///
    /// Validation errors (no content, no template, busy) leave the gate
    /// untouched; API errors roll it back to `Unverified`.
    #[instrument(skip(self), fields(revision = self.session.revision()))]
    pub async fn verify(&mut self) -> Result<ComplianceResult> {
        let template = match self.ready_template("verify") {
            Ok(t) => t,
            Err((title, e)) => return Err(self.fail(title, e)),
        };

        self.session.advance(GateEvent::Verify);
        info!("Verifying content against '{}'", template.name);

        match self.call_in_flight(&template).await {
            Ok(output) => {
                self.session.record_output(output);
                self.session.advance(GateEvent::Succeeded);
                self.persist_credential();

                let result = self.rescan(&template);
                let (level, message) = if result.is_compliant {
                    (
                        Level::Success,
                        "Content has been verified. You can now proceed with conversion."
                            .to_string(),
                    )
                } else {
                    (
                        Level::Warning,
                        format!(
                            "Content has been verified with {} warning word(s): {}. \
                             You can now proceed with conversion.",
                            result.warnings.len(),
                            result.words().collect::<Vec<_>>().join(", ")
                        ),
                    )
                };
                self.notify(level, "Verification Complete", message);
                Ok(result)
            }
            Err(e) => {
                self.session.advance(GateEvent::Failed);
                warn!("Verification failed: {}", e);
                Err(self.fail("Verification Error", e))
            }
        }
    }

    /// Produces the final reformatted content. Requires a successful verify
    /// on the current content.
    ///
    /// # Errors
    ///
    /// A validation error when not verified; API errors keep the gate at
    /// `Verified` and the previous converted content.
    #[instrument(skip(self), fields(revision = self.session.revision()))]
    pub async fn convert(&mut self) -> Result<String> {
        if self.session.gate().is_busy() {
            let e = Error::validation("Processing is already in progress.");
            return Err(self.fail("Please Wait", e));
        }

        if self.session.gate() != GateState::Verified {
            let e = Error::validation("Please verify the content before converting.");
            return Err(self.fail("Verification Required", e));
        }

        let template = match self.selected_template() {
            Ok(t) => t,
            Err(e) => return Err(self.fail("Template Required", e)),
        };

        self.session.advance(GateEvent::Convert);
        info!("Converting content with '{}'", template.name);

        match self.call_in_flight(&template).await {
            Ok(output) => {
                self.session.set_converted(output.clone());
                self.session.advance(GateEvent::Succeeded);
                self.persist_credential();
                self.rescan(&template);
                self.notify(
                    Level::Success,
                    "Conversion Complete",
                    "Content has been successfully converted according to the template.",
                );
                Ok(output)
            }
            Err(e) => {
                self.session.advance(GateEvent::Failed);
                warn!("Conversion failed: {}", e);
                Err(self.fail("Conversion Error", e))
            }
        }
    }

    /// Scans the current scan target against the selected template without
    /// calling the API.
    ///
    /// # Errors
    ///
    /// Returns a validation error if content or template is missing.
    pub fn check_compliance(&mut self) -> Result<ComplianceResult> {
        if self.session.content().trim().is_empty() || self.session.selected_template().is_none() {
            let e = Error::validation("Please select a template and enter content to check.");
            return Err(self.fail("Missing Information", e));
        }

        let template = match self.selected_template() {
            Ok(t) => t,
            Err(e) => return Err(self.fail("Template Required", e)),
        };

        let result = self.rescan(&template);
        if result.is_compliant {
            self.notify(Level::Success, "Compliance Check Passed", "No warning words found.");
        } else {
            self.notify(
                Level::Warning,
                "Warning Words Found",
                format!("{} warning word(s) detected.", result.warnings.len()),
            );
        }
        Ok(result)
    }

    fn rescan(&mut self, template: &Template) -> ComplianceResult {
        let result = scanner::scan(self.session.scan_target(), template);
        debug!(
            compliant = result.is_compliant,
            warnings = result.warnings.len(),
            "Scanned content"
        );
        self.session.set_compliance(result.clone());
        result
    }

    /// Checks the preconditions of an API call. The error carries the
    /// notification title to report it under.
    fn ready_template(&self, action: &str) -> std::result::Result<Template, (&'static str, Error)> {
        if self.session.gate().is_busy() {
            let e = Error::validation("Processing is already in progress.");
            return Err(("Please Wait", e));
        }
        if self.session.content().trim().is_empty() {
            let e = Error::validation(format!("Please enter content to {action}."));
            return Err(("Missing Information", e));
        }
        self.selected_template().map_err(|e| ("Template Required", e))
    }

    fn selected_template(&self) -> Result<Template> {
        let name = self.session.selected_template().ok_or_else(|| {
            Error::validation("Please select a template before verifying compliance.")
        })?;

        self.templates
            .find(name)
            .cloned()
            .ok_or_else(|| Error::validation(format!("Template \"{name}\" no longer exists.")))
    }
}

/// Everything needed to send one request, detached from the pipeline.
struct PreparedCall {
    generator: Arc<dyn TextGenerator>,
    instructions: String,
    credential: String,
}

impl PreparedCall {
    async fn send(&self, text: &str) -> Result<String> {
        self.generator
            .generate(&self.instructions, text, &self.credential)
            .await
    }
}

/// Rolls a busy gate back as a failed call when dropped while armed.
struct InFlight<'a> {
    session: &'a mut Session,
    armed: bool,
}

impl<'a> InFlight<'a> {
    fn arm(session: &'a mut Session) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            let state = self.session.gate();
            if self.session.advance(GateEvent::Failed) {
                warn!("Call cancelled while {}, gate reset to {}", state, self.session.gate());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::StaticClipboard;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Generator returning scripted responses and recording every call.
    #[derive(Default)]
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl ScriptedGenerator {
        fn with(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::default(),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, instructions: &str, text: &str, credential: &str) -> Result<String> {
            self.calls.lock().unwrap().push((
                instructions.to_string(),
                text.to_string(),
                credential.to_string(),
            ));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::processing("no scripted response")))
        }
    }

    fn pipeline_with(generator: Arc<ScriptedGenerator>, credential: Option<&str>) -> Pipeline {
        let config = Config::builder().build().unwrap();
        let storage = match credential {
            Some(key) => MemoryStore::with_entry(&config.credential_key, key),
            None => MemoryStore::new(),
        };
        Pipeline::new(config, generator, Box::new(storage)).unwrap()
    }

    fn with_formal_template(pipeline: &mut Pipeline) {
        pipeline.replace_draft(
            TemplateDraft::new("Formal", "Formal business letter").with_warning_words(["urgent", "asap"]),
        );
        pipeline.save_template().unwrap();
        pipeline.select_template(Some("Formal"));
        pipeline.take_notifications();
    }

    #[tokio::test]
    async fn test_verify_then_convert() {
        let generator = ScriptedGenerator::with(vec![
            Ok("Dear team, this is urgent.".to_string()),
            Ok("Dear team, please reply soon.".to_string()),
        ]);
        let mut pipeline = pipeline_with(Arc::clone(&generator), Some("sk-test"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("hey, reply fast");

        let result = pipeline.verify().await.unwrap();
        assert_eq!(pipeline.session().gate(), GateState::Verified);
        assert_eq!(result.words().collect::<Vec<_>>(), vec!["urgent"]);

        let converted = pipeline.convert().await.unwrap();
        assert_eq!(converted, "Dear team, please reply soon.");
        assert_eq!(pipeline.session().converted_content(), converted);
        assert!(pipeline.session().compliance().unwrap().is_compliant);

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.contains("Formal business letter"));
        assert_eq!(calls[0].1, "hey, reply fast");
        assert_eq!(calls[0].2, "sk-test");
    }

    #[tokio::test]
    async fn test_edit_after_convert_resets_gate() {
        let generator = ScriptedGenerator::with(vec![Ok("a".to_string()), Ok("b".to_string())]);
        let mut pipeline = pipeline_with(Arc::clone(&generator), Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        pipeline.verify().await.unwrap();
        pipeline.convert().await.unwrap();
        pipeline.set_content("text, edited");
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
        pipeline.take_notifications();

        let err = pipeline.convert().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(generator.call_count(), 2);
        let notes = pipeline.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Verification Required");
    }

    #[tokio::test]
    async fn test_convert_before_verify_is_rejected() {
        let generator = ScriptedGenerator::with(vec![]);
        let mut pipeline = pipeline_with(Arc::clone(&generator), Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        assert!(pipeline.convert().await.unwrap_err().is_validation());
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let generator = ScriptedGenerator::with(vec![Ok("unused".to_string())]);
        let mut pipeline = pipeline_with(Arc::clone(&generator), None);
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        let err = pipeline.verify().await.unwrap_err();
        assert!(matches!(err, Error::MissingCredential));
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
        assert_eq!(generator.call_count(), 0);

        let notes = pipeline.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Verification Error");
    }

    #[tokio::test]
    async fn test_credential_not_required() {
        let generator = ScriptedGenerator::with(vec![Ok("done".to_string())]);
        let config = Config::builder().require_credential(false).build().unwrap();
        let mut pipeline =
            Pipeline::new(config, Arc::clone(&generator) as Arc<dyn TextGenerator>, Box::new(MemoryStore::new()))
                .unwrap();
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        assert!(pipeline.verify().await.is_ok());
        assert_eq!(generator.calls.lock().unwrap()[0].2, "");
    }

    #[tokio::test]
    async fn test_verify_failure_rolls_back() {
        let generator = ScriptedGenerator::with(vec![
            Ok("first".to_string()),
            Err(Error::invalid_credential("401 Unauthorized")),
        ]);
        let mut pipeline = pipeline_with(generator, Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        pipeline.verify().await.unwrap();
        let err = pipeline.verify().await.unwrap_err();
        assert!(err.is_credential());
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
    }

    #[tokio::test]
    async fn test_convert_failure_keeps_verified_and_output() {
        let generator = ScriptedGenerator::with(vec![
            Ok("verified".to_string()),
            Ok("converted".to_string()),
            Err(Error::processing("connection reset")),
        ]);
        let mut pipeline = pipeline_with(generator, Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        pipeline.verify().await.unwrap();
        pipeline.convert().await.unwrap();
        pipeline.take_notifications();

        let err = pipeline.convert().await.unwrap_err();
        assert!(err.is_processing());
        assert_eq!(pipeline.session().gate(), GateState::Verified);
        assert_eq!(pipeline.session().converted_content(), "converted");

        let notes = pipeline.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Conversion Error");
    }

    #[tokio::test]
    async fn test_verify_requires_content_and_template() {
        let generator = ScriptedGenerator::with(vec![]);
        let mut pipeline = pipeline_with(Arc::clone(&generator), Some("key"));

        pipeline.set_content("text");
        let err = pipeline.verify().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(pipeline.take_notifications()[0].title, "Template Required");

        with_formal_template(&mut pipeline);
        pipeline.set_content("   ");
        assert!(pipeline.verify().await.unwrap_err().is_validation());
        assert_eq!(pipeline.take_notifications()[0].title, "Missing Information");

        assert_eq!(generator.call_count(), 0);
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
    }

    #[tokio::test]
    async fn test_deleted_template_blocks_verify() {
        let generator = ScriptedGenerator::with(vec![]);
        let mut pipeline = pipeline_with(generator, Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        let id = pipeline.templates().find("Formal").unwrap().id;
        assert!(pipeline.delete_template(id));
        assert!(pipeline.verify().await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_credential_persisted_after_success() {
        let generator = ScriptedGenerator::with(vec![Ok("ok".to_string())]);
        let mut pipeline = pipeline_with(generator, Some("old-key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");
        pipeline.set_credential("  new-key ");

        pipeline.verify().await.unwrap();

        let key = pipeline.config().credential_key.clone();
        assert_eq!(pipeline.storage.get(&key).unwrap(), Some("new-key".to_string()));
    }

    #[tokio::test]
    async fn test_credential_not_persisted_after_failure() {
        let generator = ScriptedGenerator::with(vec![Err(Error::processing("boom"))]);
        let mut pipeline = pipeline_with(generator, None);
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");
        pipeline.set_credential("fresh");

        assert!(pipeline.verify().await.is_err());
        let key = pipeline.config().credential_key.clone();
        assert_eq!(pipeline.storage.get(&key).unwrap(), None);
    }

    #[test]
    fn test_credential_loaded_from_storage() {
        let pipeline = pipeline_with(ScriptedGenerator::with(vec![]), Some("stored"));
        assert_eq!(pipeline.credential(), "stored");
    }

    #[test]
    fn test_save_with_empty_name_notifies() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);
        pipeline.replace_draft(TemplateDraft::new("", "content"));

        assert!(pipeline.save_template().unwrap_err().is_validation());
        assert!(pipeline.templates().is_empty());

        let notes = pipeline.take_notifications();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].is_error());
        assert_eq!(notes[0].title, "Missing Information");
    }

    #[test]
    fn test_warning_word_notifications() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);

        assert_eq!(pipeline.add_warning_word("Urgent"), WordChange::Added);
        assert_eq!(pipeline.add_warning_word("URGENT"), WordChange::Duplicate);
        assert_eq!(pipeline.add_warning_word(" "), WordChange::Ignored);

        let titles: Vec<_> = pipeline
            .take_notifications()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Warning Word Added", "Duplicate Warning Word"]);

        assert!(pipeline.remove_warning_word("urgent"));
        assert!(pipeline.templates().draft().warning_words.is_empty());
    }

    #[test]
    fn test_delete_unknown_is_silent() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);
        let id = pipeline.seed_template(TemplateKind::SalesPitch).unwrap();
        pipeline.take_notifications();

        assert!(pipeline.delete_template(id));
        assert!(!pipeline.delete_template(id));
        assert_eq!(pipeline.take_notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_paste_resets_gate() {
        let generator = ScriptedGenerator::with(vec![Ok("ok".to_string())]);
        let mut pipeline = pipeline_with(generator, Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");
        pipeline.verify().await.unwrap();

        pipeline.paste(&mut StaticClipboard::with_text("pasted")).unwrap();
        assert_eq!(pipeline.session().content(), "pasted");
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
    }

    #[test]
    fn test_paste_failure_leaves_content() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);
        pipeline.set_content("kept");
        let revision = pipeline.session().revision();

        let err = pipeline.paste(&mut StaticClipboard::denied()).unwrap_err();
        assert!(matches!(err, Error::ClipboardUnavailable { .. }));
        assert_eq!(pipeline.session().content(), "kept");
        assert_eq!(pipeline.session().revision(), revision);
        assert_eq!(pipeline.take_notifications()[0].title, "Clipboard Error");
    }

    #[test]
    fn test_clean_boilerplate_updates_content() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);
        pipeline.set_content("Here is a summary: Hello world");

        let outcome = pipeline.clean_boilerplate();
        assert!(outcome.changed);
        assert_eq!(pipeline.session().content(), "Hello world");

        let outcome = pipeline.clean_boilerplate();
        assert!(!outcome.changed);

        let titles: Vec<_> = pipeline
            .take_notifications()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["Content Cleaned", "No Changes Needed"]);
    }

    #[tokio::test]
    async fn test_check_compliance_scans_latest_output() {
        let generator = ScriptedGenerator::with(vec![Ok("Formal and calm.".to_string())]);
        let mut pipeline = pipeline_with(generator, Some("key"));
        with_formal_template(&mut pipeline);
        pipeline.set_content("This is urgent, please help ASAP");

        assert!(!pipeline.check_compliance().unwrap().is_compliant);

        let result = pipeline.verify().await.unwrap();
        assert!(result.is_compliant);
        assert!(pipeline.check_compliance().unwrap().is_compliant);

        pipeline.set_content("still urgent");
        let result = pipeline.check_compliance().unwrap();
        assert_eq!(result.words().collect::<Vec<_>>(), vec!["urgent"]);
    }

    /// Generator that answers from a queue, then never completes.
    struct StallingGenerator {
        ready: Mutex<VecDeque<String>>,
    }

    #[async_trait]
    impl TextGenerator for StallingGenerator {
        async fn generate(&self, _instructions: &str, _text: &str, _credential: &str) -> Result<String> {
            let next = self.ready.lock().unwrap().pop_front();
            match next {
                Some(text) => Ok(text),
                None => std::future::pending().await,
            }
        }
    }

    fn stalling_pipeline(ready: &[&str]) -> Pipeline {
        let generator = Arc::new(StallingGenerator {
            ready: Mutex::new(ready.iter().map(|s| (*s).to_string()).collect()),
        });
        let config = Config::builder().build().unwrap();
        let storage = MemoryStore::with_entry(&config.credential_key, "key");
        let mut pipeline = Pipeline::new(config, generator, Box::new(storage)).unwrap();
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");
        pipeline
    }

    /// Polls `future` once and drops it. Returns true if it completed.
    async fn poll_once<F: std::future::Future>(future: F) -> bool {
        tokio::select! {
            biased;
            _ = future => true,
            () = std::future::ready(()) => false,
        }
    }

    #[tokio::test]
    async fn test_dropped_verify_resets_gate() {
        let mut pipeline = stalling_pipeline(&[]);

        assert!(!poll_once(pipeline.verify()).await);
        assert_eq!(pipeline.session().gate(), GateState::Unverified);

        let err = pipeline.convert().await.unwrap_err();
        assert_eq!(err.to_string(), "Please verify the content before converting.");
        assert!(!poll_once(pipeline.verify()).await);
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
    }

    #[tokio::test]
    async fn test_dropped_convert_keeps_verified() {
        let mut pipeline = stalling_pipeline(&["verified"]);
        pipeline.verify().await.unwrap();

        assert!(!poll_once(pipeline.convert()).await);
        assert_eq!(pipeline.session().gate(), GateState::Verified);
        assert_eq!(pipeline.session().converted_content(), "");
    }

    #[tokio::test]
    async fn test_instruction_render_failure_is_processing_error() {
        let generator = ScriptedGenerator::with(vec![Ok("unused".to_string())]);
        let config = Config::builder()
            .instructions_template("{{ template }}{% if warning_words | length > 0 %}{{ warning_words.9 }}{% endif %}")
            .build()
            .unwrap();
        let storage = MemoryStore::with_entry(&config.credential_key, "key");
        let mut pipeline =
            Pipeline::new(config, Arc::clone(&generator) as Arc<dyn TextGenerator>, Box::new(storage)).unwrap();
        with_formal_template(&mut pipeline);
        pipeline.set_content("text");

        let err = pipeline.verify().await.unwrap_err();
        assert!(err.is_processing());
        assert_eq!(pipeline.session().gate(), GateState::Unverified);
        assert_eq!(generator.call_count(), 0);
        assert_eq!(pipeline.take_notifications()[0].title, "Verification Error");
    }

    #[test]
    fn test_check_compliance_requires_inputs() {
        let mut pipeline = pipeline_with(ScriptedGenerator::with(vec![]), None);
        assert!(pipeline.check_compliance().unwrap_err().is_validation());
        assert_eq!(pipeline.take_notifications()[0].title, "Missing Information");
    }
}
