//! Folding completion messages back into the model

use super::{App, LogSource, StatusLevel};
use crate::core::{Command, Message, Screen};

impl App {
    /// Apply one completion message. Messages are processed in arrival order.
    pub fn update(&mut self, message: Message) -> Option<Command> {
        if self.quitting {
            return None;
        }
        tracing::debug!(message = message.label(), "message received");
        match message {
            Message::CallFinished {
                params,
                result,
                timestamp,
            } => {
                let id = self.services.record_call(&params, &result, timestamp);
                self.selection.history_id = Some(id);
                self.selection.log_source = LogSource::LastResult;
                self.selection.log_index = None;
                self.cursors.logs.reset();
                self.last_result = Some(result);
                self.refresh_stats();
                self.screen = Screen::CallResult;
            }
            Message::DisassemblyLoaded { address, result } => {
                let showing = self.screen == Screen::ContractDetail
                    && self.selection.contract == Some(address);
                if !showing {
                    tracing::debug!(%address, "dropping stale disassembly");
                    return None;
                }
                self.block_index = 0;
                self.cursors.instructions.reset();
                match result {
                    Ok(disassembly) => {
                        self.disassembly = Some(disassembly);
                        self.disassembly_error = None;
                    }
                    Err(err) => {
                        self.disassembly = None;
                        self.disassembly_error = Some(err);
                    }
                }
            }
            Message::ResetFinished { backend } => {
                self.reset_pending = false;
                match backend {
                    Ok(backend) => {
                        self.services.evm = backend;
                        self.apply_reset();
                        self.set_status("State reset", StatusLevel::Info);
                    }
                    Err(err) => {
                        self.set_status(format!("Reset failed: {err}"), StatusLevel::Error);
                        if self.screen == Screen::ConfirmReset {
                            self.go_back(Screen::MainMenu);
                        }
                    }
                }
            }
            Message::ExportFinished(result) => match result {
                Ok(paths) => {
                    let names: Vec<String> = paths
                        .iter()
                        .filter_map(|path| path.file_name())
                        .map(|name| name.to_string_lossy().into_owned())
                        .collect();
                    self.set_status(format!("Exported {}", names.join(", ")), StatusLevel::Info);
                }
                Err(err) => self.set_status(format!("Export failed: {err}"), StatusLevel::Error),
            },
        }
        None
    }

    fn apply_reset(&mut self) {
        self.services.chain.reset();
        self.services.history.clear();
        self.services.accounts.clear_contracts();
        self.last_result = None;
        self.disassembly = None;
        self.disassembly_error = None;
        self.block_index = 0;
        self.inspector_result = None;
        self.refresh_stats();
        tracing::info!("state reset to genesis");

        // only the confirmation screen hands control back to its origin
        if self.screen != Screen::ConfirmReset {
            return;
        }
        self.params = self.defaults.clone();
        self.edit = None;
        self.validation_error.clear();
        self.selection = Default::default();
        self.cursors = Default::default();
        let origin = self.nav.pop().map(|entry| entry.screen);
        self.nav.clear();
        self.screen = origin.unwrap_or(Screen::MainMenu);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use alloy_primitives::{Address, Bytes};
    use chrono::Utc;

    use super::*;
    use crate::app::test_support::app;
    use crate::bytecode::disassemble;
    use crate::core::ListCursor;
    use crate::domain::{CallField, CallParams, CallResult};

    #[test]
    fn test_call_finished_records_history() {
        let mut app = app();
        app.screen = Screen::CallExecuting;
        let timestamp = Utc::now();
        let params = CallParams::default();
        app.update(Message::CallFinished {
            params: params.clone(),
            result: CallResult {
                success: true,
                ..CallResult::default()
            },
            timestamp,
        });
        assert_eq!(app.screen, Screen::CallResult);
        let history = app.services.history.get_all_calls();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].params, params);
        assert_eq!(history[0].timestamp, timestamp);
        assert_eq!(app.stats.total_transactions, 1);
    }

    #[test]
    fn test_stale_disassembly_is_dropped() {
        let mut app = app();
        app.screen = Screen::Contracts;
        app.update(Message::DisassemblyLoaded {
            address: Address::repeat_byte(1),
            result: disassemble(&[0x00]).map_err(|e| e.to_string()),
        });
        assert!(app.disassembly.is_none());
    }

    #[test]
    fn test_reset_finished_returns_to_origin() {
        let mut app = app();
        app.services.chain.record_call(&CallParams::default(), &CallResult::default(), Utc::now());
        app.params.value = "7".into();
        app.screen = Screen::Settings;
        app.drill_down(Screen::ConfirmReset);
        app.reset_pending = true;
        let backend = (app.services.evm_factory)().map_err(|e| e.to_string());
        app.update(Message::ResetFinished { backend });
        assert_eq!(app.screen, Screen::Settings);
        assert!(!app.reset_pending);
        assert_eq!(app.params, CallParams::default());
        assert_eq!(app.services.chain.get_stats().total_transactions, 0);
    }

    #[test]
    fn test_reset_forgets_deployed_contracts() {
        let mut app = app();
        let contract = Address::repeat_byte(0x42);
        app.services.accounts.set_code(contract, Bytes::from_static(&[0x00]));
        app.screen = Screen::MainMenu;
        app.drill_down(Screen::ConfirmReset);
        let backend = (app.services.evm_factory)().map_err(|e| e.to_string());
        app.update(Message::ResetFinished { backend });
        assert!(!app.services.accounts.contains(&contract));
        assert_eq!(app.screen, Screen::MainMenu);
    }

    #[test]
    fn test_reset_finished_elsewhere_keeps_screen() {
        let mut app = app();
        app.screen = Screen::CallParameterList;
        app.cursors.params = ListCursor::at(CallField::Value as usize);
        app.begin_edit();
        assert_eq!(app.screen, Screen::CallParameterEdit);
        app.reset_pending = true;
        let backend = (app.services.evm_factory)().map_err(|e| e.to_string());
        app.update(Message::ResetFinished { backend });
        assert_eq!(app.screen, Screen::CallParameterEdit);
        assert!(app.edit.is_some());
        assert!(!app.reset_pending);
    }

    #[test]
    fn test_export_status() {
        let mut app = app();
        app.update(Message::ExportFinished(Ok(vec![PathBuf::from("/x/history_1.json")])));
        assert_eq!(app.status_text().map(|(t, _)| t), Some("Exported history_1.json"));
    }
}
