//! Two-step armed confirmations layered on top of a screen

use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    Idle,
    Armed,
}

impl Confirmation {
    pub fn arm(&mut self) {
        *self = Confirmation::Armed;
    }

    pub fn is_armed(&self) -> bool {
        *self == Confirmation::Armed
    }

    pub fn clear(&mut self) {
        *self = Confirmation::Idle;
    }

    /// Consume the key that follows arming.
    ///
    /// Returns `None` when idle (the key belongs to the screen), otherwise
    /// `Some(true)` for `y`/`Y` and `Some(false)` for anything else. The state
    /// is back to `Idle` in both cases.
    pub fn resolve(&mut self, key: &KeyEvent) -> Option<bool> {
        if !self.is_armed() {
            return None;
        }
        self.clear();
        Some(matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_idle_passes_key_through() {
        let mut confirm = Confirmation::Idle;
        assert_eq!(confirm.resolve(&key(KeyCode::Char('y'))), None);
        assert!(!confirm.is_armed());
    }

    #[test]
    fn test_affirmative_is_case_insensitive() {
        let mut confirm = Confirmation::Idle;
        confirm.arm();
        assert_eq!(
            confirm.resolve(&KeyEvent::new(KeyCode::Char('Y'), KeyModifiers::SHIFT)),
            Some(true)
        );
        assert!(!confirm.is_armed());
    }

    #[test]
    fn test_any_other_key_cancels() {
        let mut confirm = Confirmation::Idle;
        confirm.arm();
        assert_eq!(confirm.resolve(&key(KeyCode::Esc)), Some(false));
        assert!(!confirm.is_armed());
        assert_eq!(confirm.resolve(&key(KeyCode::Esc)), None);
    }
}
