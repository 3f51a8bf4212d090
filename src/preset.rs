//! Built-in starter templates.
//!
//! Each [`TemplateKind`] maps to a ready-made draft with formatting
//! instructions and a sensible list of warning words, so a session can
//! start without typing a template from scratch.

use crate::template::TemplateDraft;
use serde::{Deserialize, Serialize};

/// Kind of starter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Reply to a customer inquiry
    #[serde(rename = "Customer Service Email")]
    CustomerServiceEmail,
    /// Promotional copy
    #[serde(rename = "Marketing Copy")]
    MarketingCopy,
    /// Memo to colleagues
    #[serde(rename = "Internal Communication")]
    InternalCommunication,
    /// Pitch to a prospect
    #[serde(rename = "Sales Pitch")]
    SalesPitch,
    /// Catalogue or store listing
    #[serde(rename = "Product Description")]
    ProductDescription,
}

impl TemplateKind {
    /// Returns the ID string for this kind.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::CustomerServiceEmail => "customer-service-email",
            Self::MarketingCopy => "marketing-copy",
            Self::InternalCommunication => "internal-communication",
            Self::SalesPitch => "sales-pitch",
            Self::ProductDescription => "product-description",
        }
    }

    /// Human-readable name, used as the saved template's name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::CustomerServiceEmail => "Customer Service Email",
            Self::MarketingCopy => "Marketing Copy",
            Self::InternalCommunication => "Internal Communication",
            Self::SalesPitch => "Sales Pitch",
            Self::ProductDescription => "Product Description",
        }
    }

    /// Returns all available kinds.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CustomerServiceEmail,
            Self::MarketingCopy,
            Self::InternalCommunication,
            Self::SalesPitch,
            Self::ProductDescription,
        ]
    }

    /// Parse a kind from its string ID.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.id() == id)
    }

    /// Builds the starter draft for this kind.
    #[must_use]
    pub fn draft(self) -> TemplateDraft {
        let (content, words): (&str, &[&str]) = match self {
            Self::CustomerServiceEmail => (
                r"Dear [Name],

Thank you for reaching out about [Topic]. [One short paragraph answering the question.]

[Next steps, if any.]

Best regards,
[Your Name]",
                &["guarantee", "promise", "never", "always", "free"],
            ),
            Self::MarketingCopy => (
                r"[Headline, under ten words]

[Two or three sentences describing the benefit to the reader.]

[Single call to action.]",
                &["best", "cheapest", "guaranteed", "risk-free", "miracle"],
            ),
            Self::InternalCommunication => (
                r"Subject: [Topic]

Hi team,

[Context in one paragraph.]
[What changes and when.]
[Who to contact with questions.]

Thanks,
[Your Name]",
                &["confidential", "asap", "urgent", "blame"],
            ),
            Self::SalesPitch => (
                r"[Opening that names the prospect's problem]

[How the product addresses it, with one concrete example.]

[Proposed next step and a specific time.]",
                &["guarantee", "cheapest", "no risk", "limited time"],
            ),
            Self::ProductDescription => (
                r"[Product name]

[One-sentence summary.]

Features:
- [Feature]
- [Feature]
- [Feature]

[Specifications or care instructions.]",
                &["cure", "best", "perfect", "100%"],
            ),
        };

        let mut draft =
            TemplateDraft::new(self.display_name(), content).with_warning_words(words);
        draft.kind = Some(self);
        draft
    }
}
