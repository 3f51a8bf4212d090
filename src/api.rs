//! # Quick Start API
//!
//! High-level, ergonomic API for the common case: one piece of text, one
//! template, one pass through clean → verify → convert.
//!
//! ## Examples
//!
//! ```no_run
//! use llm_comply::api::{Preset, Review};
//!
//! # async fn demo() -> llm_comply::Result<()> {
//! // Scan locally, no API call
//! let result = Review::text("This is urgent, please help ASAP")
//!     .preset(Preset::InternalCommunication)
//!     .scan();
//! assert!(!result.is_compliant);
//!
//! // Full round trip through the text-generation API
//! let outcome = Review::text("Here is a summary: we shipped it")
//!     .preset(Preset::InternalCommunication)
//!     .credential("sk-...")
//!     .clean()
//!     .convert()
//!     .run()
//!     .await?;
//! println!("{}", outcome.converted.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    error::Result,
    filter::clean_boilerplate,
    notify::Notification,
    pipeline::Pipeline,
    scanner::{scan_words, ComplianceResult},
    template::TemplateDraft,
};

pub use crate::preset::TemplateKind as Preset;

/// Where the review's template comes from.
#[derive(Debug, Clone)]
enum TemplateSource {
    Preset(Preset),
    Draft(TemplateDraft),
}

/// One-shot review of a piece of text.
///
/// # Examples
///
/// ```no_run
/// use llm_comply::api::*;
/// use llm_comply::TemplateDraft;
///
/// # async fn demo() -> llm_comply::Result<()> {
/// let template = TemplateDraft::new("Formal", "Dear [Name], ... Regards")
///     .with_warning_words(["urgent", "asap"]);
///
/// let outcome = Review::text("hey, need this asap")
///     .template(template)
///     .credential("sk-...")
///     .run()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
#[must_use = "call .run() or .scan() to execute the review"]
pub struct Review {
    text: String,
    template: TemplateSource,
    credential: Option<String>,
    config: Option<Config>,
    clean: bool,
    convert: bool,
}

/// What a completed review produced.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// Whether boilerplate cleaning changed the text
    pub cleaned: bool,
    /// The raw content after cleaning
    pub content: String,
    /// Scan of the latest API output
    pub compliance: ComplianceResult,
    /// Final text, when conversion was requested
    pub converted: Option<String>,
    /// Notifications raised along the way
    pub notifications: Vec<Notification>,
}

impl Review {
    /// Starts a review of `text` with an empty template.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            template: TemplateSource::Draft(TemplateDraft::default()),
            credential: None,
            config: None,
            clean: false,
            convert: false,
        }
    }

    /// Uses a built-in starter template.
    pub fn preset(mut self, preset: Preset) -> Self {
        self.template = TemplateSource::Preset(preset);
        self
    }

    /// Uses a custom template.
    pub fn template(mut self, draft: TemplateDraft) -> Self {
        self.template = TemplateSource::Draft(draft);
        self
    }

    /// Sets the API credential, overriding any stored one.
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Uses a custom configuration (endpoint, model, ...).
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Strips AI preamble phrases before verifying.
    pub fn clean(mut self) -> Self {
        self.clean = true;
        self
    }

    /// Converts after a successful verify.
    pub fn convert(mut self) -> Self {
        self.convert = true;
        self
    }

    /// Scans the text locally without calling the API.
    #[must_use]
    pub fn scan(self) -> ComplianceResult {
        let draft = self.draft();
        let text = if self.clean {
            clean_boilerplate(&self.text).text
        } else {
            self.text
        };
        scan_words(&text, &draft.warning_words)
    }

    /// Runs the review against the configured HTTP endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the template is
    /// incomplete, or verify/convert fail.
    pub async fn run(mut self) -> Result<ReviewOutcome> {
        let config = match self.config.take() {
            Some(config) => config,
            None => Config::builder().build()?,
        };
        let pipeline = Pipeline::from_config(config)?;
        self.run_with(pipeline).await
    }

    /// Runs the review on an existing pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is incomplete or verify/convert fail.
    pub async fn run_with(self, mut pipeline: Pipeline) -> Result<ReviewOutcome> {
        let name = match self.template {
            TemplateSource::Preset(kind) => {
                pipeline.seed_template(kind)?;
                kind.display_name().to_string()
            }
            TemplateSource::Draft(draft) => {
                let name = draft.name.clone();
                pipeline.replace_draft(draft);
                pipeline.save_template()?;
                name
            }
        };
        pipeline.select_template(Some(&name));

        if let Some(credential) = self.credential {
            pipeline.set_credential(credential);
        }

        pipeline.set_content(self.text);
        let cleaned = self.clean && pipeline.clean_boilerplate().changed;

        let mut compliance = pipeline.verify().await?;
        let converted = if self.convert {
            let text = pipeline.convert().await?;
            if let Some(latest) = pipeline.session().compliance() {
                compliance = latest.clone();
            }
            Some(text)
        } else {
            None
        };

        Ok(ReviewOutcome {
            cleaned,
            content: pipeline.session().content().to_string(),
            compliance,
            converted,
            notifications: pipeline.take_notifications(),
        })
    }

    fn draft(&self) -> TemplateDraft {
        match &self.template {
            TemplateSource::Preset(kind) => kind.draft(),
            TemplateSource::Draft(draft) => draft.clone(),
        }
    }
}
