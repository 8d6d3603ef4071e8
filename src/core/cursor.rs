//! List cursor shared by every selectable list

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const PAGE: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListCursor {
    selected: usize,
}

impl ListCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(index: usize) -> Self {
        Self { selected: index }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Index of the selection when the list is non-empty.
    pub fn get(&self, len: usize) -> Option<usize> {
        (self.selected < len).then_some(self.selected)
    }

    pub fn set(&mut self, index: usize, len: usize) {
        self.selected = index;
        self.clamp(len);
    }

    pub fn reset(&mut self) {
        self.selected = 0;
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn go_to_top(&mut self) {
        self.selected = 0;
    }

    pub fn go_to_bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub fn page_up(&mut self, amount: usize) {
        self.selected = self.selected.saturating_sub(amount);
    }

    pub fn page_down(&mut self, amount: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.selected = (self.selected + amount).min(len - 1);
    }

    pub fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Apply a navigation key. Returns false when the key is not a navigation key.
    pub fn handle_key(&mut self, key: &KeyEvent, len: usize) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => self.move_up(),
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => self.move_down(len),
            (KeyCode::Home, _) => self.go_to_top(),
            (KeyCode::End, _) => self.go_to_bottom(len),
            (KeyCode::PageUp, _) => self.page_up(PAGE),
            (KeyCode::PageDown, _) => self.page_down(PAGE, len),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_moves_stay_in_bounds() {
        let mut cursor = ListCursor::new();
        cursor.move_up();
        assert_eq!(cursor.selected(), 0);
        for _ in 0..10 {
            cursor.move_down(3);
        }
        assert_eq!(cursor.selected(), 2);
        cursor.page_down(50, 3);
        assert_eq!(cursor.selected(), 2);
        cursor.page_up(50);
        assert_eq!(cursor.selected(), 0);
    }

    #[test]
    fn test_empty_list() {
        let mut cursor = ListCursor::at(4);
        cursor.clamp(0);
        assert_eq!(cursor.get(0), None);
        cursor.go_to_bottom(0);
        assert_eq!(cursor.selected(), 0);
    }

    #[test]
    fn test_handle_key_ignores_other_keys() {
        let mut cursor = ListCursor::new();
        assert!(cursor.handle_key(&key(KeyCode::Down), 5));
        assert!(cursor.handle_key(&key(KeyCode::Char('j')), 5));
        assert_eq!(cursor.selected(), 2);
        assert!(!cursor.handle_key(&key(KeyCode::Enter), 5));
        assert!(!cursor.handle_key(
            &KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL),
            5
        ));
        assert_eq!(cursor.selected(), 2);
    }
}
