//! Session state and the verify/convert gate.

use crate::scanner::ComplianceResult;
use serde::Serialize;
use std::fmt;

/// Where the current content stands with respect to verify and convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GateState {
    /// Content changed since the last successful verify (or never verified)
    #[default]
    Unverified,
    /// A verify call is in flight
    Verifying,
    /// The current content passed verify; convert is allowed
    Verified,
    /// A convert call is in flight
    Converting,
}

/// Inputs to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateEvent {
    /// User asked to verify
    Verify,
    /// User asked to convert
    Convert,
    /// The in-flight call returned successfully
    Succeeded,
    /// The in-flight call failed
    Failed,
    /// Raw content was edited or replaced by a paste
    Edited,
}

impl GateState {
    /// Returns the next state, or `None` if `event` is not allowed here.
    #[must_use]
    pub const fn on(self, event: GateEvent) -> Option<Self> {
        use GateEvent as E;
        match (self, event) {
            (_, E::Edited) => Some(Self::Unverified),
            (Self::Unverified | Self::Verified, E::Verify) => Some(Self::Verifying),
            (Self::Verified, E::Convert) => Some(Self::Converting),
            (Self::Verifying, E::Succeeded) | (Self::Converting, E::Succeeded | E::Failed) => {
                Some(Self::Verified)
            }
            (Self::Verifying, E::Failed) => Some(Self::Unverified),
            _ => None,
        }
    }

    /// True while a call is in flight.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Verifying | Self::Converting)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unverified => "unverified",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::Converting => "converting",
        };
        f.write_str(label)
    }
}

/// API output tagged with the content revision it was produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Output {
    revision: u64,
    text: String,
}

/// Per-session working state.
#[derive(Debug, Default)]
pub struct Session {
    content: String,
    revision: u64,
    selected_template: Option<String>,
    converted: String,
    latest_output: Option<Output>,
    gate: GateState,
    compliance: Option<ComplianceResult>,
}

impl Session {
    /// Current raw content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Increments on every edit or paste.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Replaces the raw content. Always resets the gate to `Unverified`.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.revision += 1;
        self.advance(GateEvent::Edited);
    }

    /// Name of the selected template, if any.
    #[must_use]
    pub fn selected_template(&self) -> Option<&str> {
        self.selected_template.as_deref()
    }

    /// Selects a template by name. An empty name clears the selection.
    pub fn select_template(&mut self, name: Option<&str>) {
        self.selected_template = name
            .filter(|n| !n.is_empty())
            .map(str::to_string);
    }

    /// Last successfully converted content (empty before the first convert).
    #[must_use]
    pub fn converted_content(&self) -> &str {
        &self.converted
    }

    pub(crate) fn set_converted(&mut self, text: String) {
        self.converted.clone_from(&text);
        self.record_output(text);
    }

    pub(crate) fn record_output(&mut self, text: String) {
        self.latest_output = Some(Output {
            revision: self.revision,
            text,
        });
    }

    /// Text the scanner should look at: the latest API output when it was
    /// produced for the current content, otherwise the raw content.
    #[must_use]
    pub fn scan_target(&self) -> &str {
        match &self.latest_output {
            Some(output) if output.revision == self.revision => &output.text,
            _ => &self.content,
        }
    }

    /// Current gate state.
    #[must_use]
    pub const fn gate(&self) -> GateState {
        self.gate
    }

    /// Applies `event` to the gate. Returns false (and leaves the state
    /// alone) when the transition is not allowed.
    pub(crate) fn advance(&mut self, event: GateEvent) -> bool {
        match self.gate.on(event) {
            Some(next) => {
                self.gate = next;
                true
            }
            None => false,
        }
    }

    /// Result of the most recent scan.
    #[must_use]
    pub const fn compliance(&self) -> Option<&ComplianceResult> {
        self.compliance.as_ref()
    }

    pub(crate) fn set_compliance(&mut self, result: ComplianceResult) {
        self.compliance = Some(result);
    }
}
