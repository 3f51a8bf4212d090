//! Clipboard access for pasting content.

use crate::error::{Error, Result};

/// Source of pasted text.
pub trait ClipboardSource {
    /// Reads the current clipboard text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClipboardUnavailable`] when the clipboard cannot be
    /// read or holds no text.
    fn read_text(&mut self) -> Result<String>;
}

/// The operating system clipboard.
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    /// Opens the system clipboard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClipboardUnavailable`] if no clipboard is reachable
    /// (for example a headless session).
    pub fn new() -> Result<Self> {
        arboard::Clipboard::new()
            .map(|inner| Self { inner })
            .map_err(|e| Error::clipboard(e.to_string()))
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        self.inner
            .get_text()
            .map_err(|e| Error::clipboard(e.to_string()))
    }
}

/// Stand-in used when the crate is built without clipboard support.
#[cfg(not(feature = "clipboard"))]
pub struct SystemClipboard;

#[cfg(not(feature = "clipboard"))]
impl SystemClipboard {
    /// Always fails: clipboard support was not compiled in.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::ClipboardUnavailable`].
    pub fn new() -> Result<Self> {
        Err(Error::clipboard(
            "clipboard support is disabled in this build",
        ))
    }
}

#[cfg(not(feature = "clipboard"))]
impl ClipboardSource for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        Err(Error::clipboard(
            "clipboard support is disabled in this build",
        ))
    }
}

/// Clipboard with fixed contents, handy for scripted sessions.
#[derive(Debug, Clone, Default)]
pub struct StaticClipboard {
    text: Option<String>,
}

impl StaticClipboard {
    /// A clipboard holding `text`.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// A clipboard that refuses every read.
    #[must_use]
    pub const fn denied() -> Self {
        Self { text: None }
    }
}

impl ClipboardSource for StaticClipboard {
    fn read_text(&mut self) -> Result<String> {
        self.text
            .clone()
            .ok_or_else(|| Error::clipboard("permission denied"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_clipboard() {
        let mut clipboard = StaticClipboard::with_text("pasted");
        assert_eq!(clipboard.read_text().unwrap(), "pasted");

        let err = StaticClipboard::denied().read_text().unwrap_err();
        assert!(matches!(err, Error::ClipboardUnavailable { .. }));
    }
}
