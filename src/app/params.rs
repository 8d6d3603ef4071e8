//! Call parameter list / edit state machine

use super::{App, EditState, StatusLevel};
use crate::clipboard::normalize_paste;
use crate::core::{Command, ListCursor, Screen};
use crate::domain::{validate_call, validate_field, CallField, CallType};

use super::commands;

impl App {
    pub fn selected_field(&self) -> Option<CallField> {
        self.cursors
            .params
            .get(CallField::ALL.len())
            .and_then(CallField::from_index)
    }

    /// List -> Edit for the field under the cursor.
    pub fn begin_edit(&mut self) {
        let Some(field) = self.selected_field() else {
            return;
        };
        self.validation_error.clear();
        if field == CallField::CallType {
            self.cursors.call_type = ListCursor::at(self.params.call_type.index());
            self.edit = None;
            self.screen = Screen::CallTypeEdit;
        } else {
            self.edit = Some(EditState {
                field,
                input: crate::core::TextInput::with_value(self.params.get(field)),
            });
            self.screen = Screen::CallParameterEdit;
        }
    }

    /// Validate and commit the edit buffer. A failing validator keeps the editor open.
    pub fn save_edit(&mut self) {
        if self.screen == Screen::CallTypeEdit {
            self.params.call_type = CallType::from_index(self.cursors.call_type.selected());
            self.finish_edit();
            return;
        }
        let Some(edit) = self.edit.as_ref() else {
            self.finish_edit();
            return;
        };
        let field = edit.field;
        let value = edit.input.value().to_string();
        if let Err(err) = validate_field(field, &value) {
            self.validation_error = err.ui_message().to_string();
            return;
        }
        self.params.set(field, value);
        self.finish_edit();
    }

    pub fn cancel_edit(&mut self) {
        self.finish_edit();
    }

    fn finish_edit(&mut self) {
        self.edit = None;
        self.validation_error.clear();
        self.screen = Screen::CallParameterList;
    }

    /// Restore the field under the list cursor to its default.
    pub fn reset_selected_field(&mut self) {
        if let Some(field) = self.selected_field() {
            self.params.reset_field(field, &self.defaults);
        }
        self.validation_error.clear();
    }

    /// Restore the field being edited, in the parameters and in the live buffer.
    pub fn reset_editing_field(&mut self) {
        match self.screen {
            Screen::CallTypeEdit => {
                self.params.reset_field(CallField::CallType, &self.defaults);
                self.cursors.call_type = ListCursor::at(self.defaults.call_type.index());
            }
            Screen::CallParameterEdit => {
                if let Some(edit) = self.edit.as_mut() {
                    self.params.reset_field(edit.field, &self.defaults);
                    edit.input.set_value(self.defaults.get(edit.field));
                }
            }
            _ => return,
        }
        self.validation_error.clear();
    }

    /// Every field back to its default; no confirmation.
    pub fn reset_all_params(&mut self) {
        self.params = self.defaults.clone();
        self.finish_edit();
    }

    /// Replace the edit buffer with normalized clipboard text.
    pub fn paste_into_edit(&mut self) {
        let text = match self.services.clipboard.read() {
            Ok(text) => normalize_paste(&text),
            Err(err) => {
                self.set_status(err.to_string(), StatusLevel::Warn);
                return;
            }
        };
        if let Some(edit) = self.edit.as_mut() {
            edit.input.set_value(text);
        }
    }

    /// Validate the whole parameter set and launch execution.
    pub fn execute(&mut self) -> Option<Command> {
        if let Err(err) = validate_call(&self.params) {
            self.validation_error = err.to_string();
            return None;
        }
        self.validation_error.clear();
        self.screen = Screen::CallExecuting;
        tracing::info!(call_type = %self.params.call_type, "executing call");
        Some(commands::execute_call(
            self.services.evm.clone(),
            self.services.store.clone(),
            self.params.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::app::test_support::app;
    use crate::clipboard::MemoryClipboard;
    use crate::domain::CallParams;

    #[test]
    fn test_invalid_save_stays_in_edit() {
        let mut app = app();
        app.screen = Screen::CallParameterList;
        app.cursors.params = ListCursor::at(CallField::Caller as usize);
        app.begin_edit();
        assert_eq!(app.screen, Screen::CallParameterEdit);
        if let Some(edit) = app.edit.as_mut() {
            edit.input.set_value("0x12");
        }
        app.save_edit();
        assert_eq!(app.screen, Screen::CallParameterEdit);
        assert_eq!(app.validation_error, "Invalid caller address");
        assert_eq!(app.params.caller, CallParams::default().caller);
    }

    #[test]
    fn test_call_type_edit_uses_index() {
        let mut app = app();
        app.screen = Screen::CallParameterList;
        app.cursors.params = ListCursor::at(0);
        app.begin_edit();
        assert_eq!(app.screen, Screen::CallTypeEdit);
        app.cursors.call_type = ListCursor::at(CallType::Create2.index());
        app.save_edit();
        assert_eq!(app.params.call_type, CallType::Create2);
        assert_eq!(app.screen, Screen::CallParameterList);
    }

    #[test]
    fn test_reset_editing_field_updates_buffer() {
        let mut app = app();
        app.screen = Screen::CallParameterList;
        app.cursors.params = ListCursor::at(CallField::GasLimit as usize);
        app.params.gas_limit = "5".into();
        app.begin_edit();
        app.reset_editing_field();
        assert_eq!(app.params.gas_limit, "30000000");
        assert_eq!(app.edit.as_ref().map(|e| e.input.value()), Some("30000000"));
    }

    #[test]
    fn test_paste_replaces_buffer() {
        let mut app = app();
        app.services.clipboard = Arc::new(MemoryClipboard::with_text("0xdead\r\nbeef  "));
        app.screen = Screen::CallParameterList;
        app.cursors.params = ListCursor::at(CallField::InputData as usize);
        app.begin_edit();
        app.paste_into_edit();
        assert_eq!(app.edit.as_ref().map(|e| e.input.value()), Some("0xdead beef"));
    }

    #[test]
    fn test_execute_requires_valid_params() {
        let mut app = app();
        app.screen = Screen::CallParameterList;
        app.params.target = String::new();
        assert!(app.execute().is_none());
        assert_eq!(app.validation_error, "Target address is required for CALL");
        assert_eq!(app.screen, Screen::CallParameterList);

        app.params.target = CallParams::default().target;
        assert!(app.execute().is_some());
        assert_eq!(app.screen, Screen::CallExecuting);
        assert!(app.validation_error.is_empty());
    }
}
