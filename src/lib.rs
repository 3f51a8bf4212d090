//! # llm-comply
//!
//! Reformat AI-generated text against named templates and flag risky words.
//!
//! ## Features
//!
//! - In-memory template store with case-insensitive warning-word lists
//! - Removal of chat-model preamble phrases ("Here is a summary:", ...)
//! - Reformatting through any OpenAI-compatible chat completions API
//! - Whole-word, case-insensitive warning-word scanning
//! - A verify → convert gate that resets whenever the content changes
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_comply::{Config, Pipeline, TemplateDraft};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut pipeline = Pipeline::from_config(Config::builder().build()?)?;
//! pipeline.set_credential("sk-...");
//!
//! pipeline.replace_draft(
//!     TemplateDraft::new("Formal", "Dear [Name], ... Best regards")
//!         .with_warning_words(["urgent", "asap"]),
//! );
//! pipeline.save_template()?;
//! pipeline.select_template(Some("Formal"));
//!
//! pipeline.set_content("Here is a summary: we need this ASAP");
//! pipeline.clean_boilerplate();
//!
//! let result = pipeline.verify().await?;
//! println!("compliant: {}", result.is_compliant);
//!
//! let converted = pipeline.convert().await?;
//! println!("{converted}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Template store**: named templates plus the working draft
//! 2. **Pipeline**: boilerplate cleaning, API calls, the verify/convert gate
//! 3. **Scanner**: warning-word detection on the latest output

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod clipboard;
mod config;
mod error;
mod filter;
mod notify;
mod pipeline;
mod prompt;
mod scanner;
mod session;
mod storage;
mod template;

pub mod api;
pub mod preset;

pub use client::{HttpGenerator, TextGenerator};
pub use clipboard::{ClipboardSource, StaticClipboard, SystemClipboard};
pub use config::{Config, ConfigBuilder, CREDENTIAL_KEY};
pub use error::{Error, Result};
pub use filter::{clean_boilerplate, CleanOutcome};
pub use notify::{Level, Notification};
pub use pipeline::Pipeline;
pub use preset::TemplateKind;
pub use scanner::{contains_whole_word, scan, scan_words, ComplianceResult, ComplianceWarning};
pub use session::{GateEvent, GateState, Session};
pub use storage::{CredentialStore, FileStore, MemoryStore};
pub use template::{Template, TemplateDraft, TemplateId, TemplateStore, WordChange};
