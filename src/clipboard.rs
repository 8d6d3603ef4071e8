//! System clipboard access and paste normalization

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard not available: {0}")]
    Unavailable(String),
    #[error("clipboard is empty")]
    Empty,
    #[error("clipboard access failed: {0}")]
    Access(String),
}

pub trait Clipboard: Send + Sync {
    fn read(&self) -> Result<String, ClipboardError>;

    fn write(&self, text: &str) -> Result<(), ClipboardError>;

    /// Copy `text` and return the status line shown to the user.
    fn write_with_feedback(&self, text: &str) -> Result<String, ClipboardError> {
        self.write(text)?;
        Ok(format!("Copied: {}", preview(text)))
    }
}

/// Clipboard backed by the desktop session through `arboard`.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        match clipboard.get_text() {
            Ok(text) if text.is_empty() => Err(ClipboardError::Empty),
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Err(ClipboardError::Empty),
            Err(err) => Err(ClipboardError::Access(err.to_string())),
        }
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|err| ClipboardError::Unavailable(err.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|err| ClipboardError::Access(err.to_string()))
    }
}

/// Process-local clipboard for tests and headless sessions.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<Option<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(text.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> Result<String, ClipboardError> {
        self.contents.lock().clone().ok_or(ClipboardError::Empty)
    }

    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.lock() = Some(text.to_string());
        Ok(())
    }
}

/// Flatten clipboard text for a single-line input.
pub fn normalize_paste(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn preview(text: &str) -> String {
    if text.chars().count() > 20 {
        let head: String = text.chars().take(20).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_paste() {
        assert_eq!(
            normalize_paste("line1\nline2\r\nline3   end"),
            "line1 line2 line3 end"
        );
        assert_eq!(normalize_paste("  0xabc\n"), "0xabc");
        assert_eq!(normalize_paste("\r\n"), "");
    }

    #[test]
    fn test_write_with_feedback_truncates_preview() {
        let clipboard = MemoryClipboard::new();
        let address = "0x00000000000000000000000000000000000000aa";
        let message = clipboard.write_with_feedback(address).unwrap();
        assert_eq!(message, "Copied: 0x000000000000000000...");
        assert_eq!(clipboard.contents().as_deref(), Some(address));
    }

    #[test]
    fn test_empty_memory_clipboard() {
        assert!(matches!(MemoryClipboard::new().read(), Err(ClipboardError::Empty)));
    }
}
