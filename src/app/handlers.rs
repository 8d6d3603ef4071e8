//! Per-screen key handling
//!
//! [`App::handle_key`] checks the global keys, then routes to the handler
//! returned by [`handler_for`]. Handlers only touch the model and return at most
//! one command. Keys a screen does not bind are ignored.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{commands, App, LogSource, MenuItem, StatusLevel, MAIN_MENU};
use crate::bytecode::{find_instruction_index_by_pc, jump_destination};
use crate::clipboard::normalize_paste;
use crate::core::{Command, ListCursor, Screen};
use crate::domain::{CallField, CallType};

pub type KeyHandler = fn(&mut App, KeyEvent) -> Option<Command>;

const GAS_LIMIT_STEP: u64 = 1_000_000;
const INSPECT_ADDRESS_LEN: usize = 42;

pub fn handler_for(screen: Screen) -> KeyHandler {
    match screen {
        Screen::MainMenu => main_menu,
        Screen::CallParameterList => call_parameter_list,
        Screen::CallParameterEdit => call_parameter_edit,
        Screen::CallTypeEdit => call_type_edit,
        Screen::CallExecuting => call_executing,
        Screen::CallResult => call_result,
        Screen::CallHistory => call_history,
        Screen::CallHistoryDetail => call_history_detail,
        Screen::LogDetail => log_detail,
        Screen::Contracts => contracts,
        Screen::ContractDetail => contract_detail,
        Screen::ConfirmReset => confirm_reset,
        Screen::Dashboard => dashboard,
        Screen::AccountsList => accounts_list,
        Screen::AccountDetail => account_detail,
        Screen::BlocksList => blocks_list,
        Screen::BlockDetail => block_detail,
        Screen::TransactionsList => transactions_list,
        Screen::TransactionDetail => transaction_detail,
        Screen::StateInspector => state_inspector,
        Screen::Settings => settings,
    }
}

impl App {
    /// Apply one key press. Returns the background command to launch, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if self.quitting || key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.quit();
                    return None;
                }
                KeyCode::Char('y') => {
                    self.copy_to_clipboard();
                    return None;
                }
                _ => {}
            }
        }
        handler_for(self.screen)(self, key)
    }

    pub fn next_block(&mut self) {
        let count = self.disassembly.as_ref().map_or(0, |dis| dis.block_count());
        if self.block_index + 1 < count {
            self.block_index += 1;
            self.cursors.instructions.reset();
        }
    }

    pub fn prev_block(&mut self) {
        if self.block_index > 0 {
            self.block_index -= 1;
            self.cursors.instructions.reset();
        }
    }

    /// Follow the jump under the instruction cursor. No-op when it cannot be resolved.
    pub fn jump_to_destination(&mut self) {
        let Some((block, index)) = self.resolve_jump() else {
            return;
        };
        tracing::debug!(block, index, "jump followed");
        self.block_index = block;
        self.cursors.instructions = ListCursor::at(index);
    }

    fn resolve_jump(&self) -> Option<(usize, usize)> {
        let dis = self.disassembly.as_ref()?;
        let instructions = dis.instructions_for_block(self.block_index)?;
        let cursor = self.cursors.instructions.get(instructions.len())?;
        let pc = jump_destination(instructions, cursor)?;
        let block = dis.find_block_containing_pc(pc)?;
        let index = find_instruction_index_by_pc(dis.instructions_for_block(block)?, pc)?;
        Some((block, index))
    }

    fn open_log(&mut self, source: LogSource) {
        let len = self.logs_from(source).len();
        if let Some(index) = self.cursors.logs.get(len) {
            self.selection.log_index = Some(index);
            self.selection.log_source = source;
            self.drill_down(Screen::LogDetail);
        }
    }

    fn inspect(&mut self) {
        let raw = self.inspector_input.value().trim().to_string();
        if !raw.starts_with("0x") || raw.len() != INSPECT_ADDRESS_LEN {
            self.inspector_result = Some(Err(
                "invalid address: must start with 0x and be 42 characters".to_string(),
            ));
            return;
        }
        self.inspector_result = Some(
            self.services
                .inspector
                .inspect_address(&raw)
                .map_err(|err| err.to_string()),
        );
    }
}

/// A printable key with no Ctrl/Alt chord.
fn plain_char(key: &KeyEvent) -> Option<char> {
    let chord = KeyModifiers::CONTROL | KeyModifiers::ALT;
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(chord) => Some(c),
        _ => None,
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Tab/BackTab on the explorer screens.
fn tab_key(app: &mut App, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Tab => app.switch_tab(true),
        KeyCode::BackTab => app.switch_tab(false),
        _ => return false,
    }
    true
}

fn main_menu(app: &mut App, key: KeyEvent) -> Option<Command> {
    if app.cursors.main_menu.handle_key(&key, MAIN_MENU.len()) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) => {
            let item = app
                .cursors
                .main_menu
                .get(MAIN_MENU.len())
                .map(|index| MAIN_MENU[index])?;
            match item {
                MenuItem::MakeCall => {
                    app.cursors.params.reset();
                    app.validation_error.clear();
                    app.screen = Screen::CallParameterList;
                }
                MenuItem::CallHistory => {
                    let len = app.history_entries().len();
                    app.cursors.history.clamp(len);
                    app.screen = Screen::CallHistory;
                }
                MenuItem::Contracts => {
                    let len = app.contracts().len();
                    app.cursors.contracts.clamp(len);
                    app.screen = Screen::Contracts;
                }
                MenuItem::Dashboard => {
                    app.refresh_stats();
                    app.screen = Screen::Dashboard;
                }
                MenuItem::ResetState => app.drill_down(Screen::ConfirmReset),
                MenuItem::Exit => app.quit(),
            }
        }
        (_, Some('q')) => app.quit(),
        _ => {}
    }
    None
}

fn call_parameter_list(app: &mut App, key: KeyEvent) -> Option<Command> {
    if app.cursors.params.handle_key(&key, CallField::ALL.len()) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) => app.begin_edit(),
        (KeyCode::Esc, _) => {
            app.validation_error.clear();
            app.screen = Screen::MainMenu;
        }
        (_, Some('e')) => return app.execute(),
        (_, Some('r')) => app.reset_selected_field(),
        (_, Some('R')) => app.reset_all_params(),
        _ => {}
    }
    None
}

fn call_parameter_edit(app: &mut App, key: KeyEvent) -> Option<Command> {
    if is_ctrl(&key, 'v') {
        app.paste_into_edit();
        return None;
    }
    if is_ctrl(&key, 'r') {
        app.reset_editing_field();
        return None;
    }
    match key.code {
        KeyCode::Enter => app.save_edit(),
        KeyCode::Esc => app.cancel_edit(),
        _ => {
            if let Some(edit) = app.edit.as_mut() {
                edit.input.handle_key(&key);
            }
        }
    }
    None
}

fn call_type_edit(app: &mut App, key: KeyEvent) -> Option<Command> {
    if app.cursors.call_type.handle_key(&key, CallType::ALL.len()) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) => app.save_edit(),
        (KeyCode::Esc, _) => app.cancel_edit(),
        (_, Some('r')) => app.reset_editing_field(),
        _ => {}
    }
    None
}

fn call_executing(_app: &mut App, _key: KeyEvent) -> Option<Command> {
    None
}

fn call_result(app: &mut App, key: KeyEvent) -> Option<Command> {
    let len = app.logs_from(LogSource::LastResult).len();
    if app.cursors.logs.handle_key(&key, len) {
        return None;
    }
    match key.code {
        KeyCode::Enter => app.open_log(LogSource::LastResult),
        KeyCode::Esc => app.screen = Screen::CallParameterList,
        _ => {}
    }
    None
}

fn call_history(app: &mut App, key: KeyEvent) -> Option<Command> {
    let entries = app.history_entries();
    if app.cursors.history.handle_key(&key, entries.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(entry) = app.cursors.history.get(entries.len()).map(|i| &entries[i]) {
                app.selection.history_id = Some(entry.id);
                app.cursors.logs.reset();
                app.screen = Screen::CallHistoryDetail;
            }
        }
        KeyCode::Esc => app.screen = Screen::MainMenu,
        _ => {}
    }
    None
}

fn call_history_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    let len = app.logs_from(LogSource::History).len();
    if app.cursors.logs.handle_key(&key, len) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) => app.open_log(LogSource::History),
        (_, Some('e')) => {
            if let Some(entry) = app.selected_history() {
                app.params = entry.params;
                app.cursors.params.reset();
                app.validation_error.clear();
                app.screen = Screen::CallParameterList;
                app.set_status(format!("Loaded call #{}", entry.id), StatusLevel::Info);
            }
        }
        (KeyCode::Esc, _) => app.screen = Screen::CallHistory,
        _ => {}
    }
    None
}

fn log_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    if key.code == KeyCode::Esc {
        app.go_back(Screen::CallResult);
    }
    None
}

fn contracts(app: &mut App, key: KeyEvent) -> Option<Command> {
    let contracts = app.contracts();
    if app.cursors.contracts.handle_key(&key, contracts.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            let contract = app
                .cursors
                .contracts
                .get(contracts.len())
                .map(|i| contracts[i].clone())?;
            app.selection.contract = Some(contract.address);
            app.disassembly = None;
            app.disassembly_error = None;
            app.block_index = 0;
            app.cursors.instructions.reset();
            app.screen = Screen::ContractDetail;
            if !contract.code.is_empty() {
                return Some(commands::load_disassembly(contract.address, contract.code));
            }
        }
        KeyCode::Esc => app.screen = Screen::MainMenu,
        _ => {}
    }
    None
}

fn contract_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    match (key.code, plain_char(&key)) {
        (KeyCode::Left, _) | (_, Some('h')) => app.prev_block(),
        (KeyCode::Right, _) | (_, Some('l')) => app.next_block(),
        (_, Some('g')) => app.jump_to_destination(),
        (KeyCode::Esc, _) => {
            app.disassembly = None;
            app.disassembly_error = None;
            app.block_index = 0;
            app.screen = Screen::Contracts;
        }
        _ => {
            let len = app.current_block_instructions().len();
            app.cursors.instructions.handle_key(&key, len);
        }
    }
    None
}

fn confirm_reset(app: &mut App, key: KeyEvent) -> Option<Command> {
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) | (_, Some('y' | 'Y')) => {
            if app.reset_pending {
                return None;
            }
            app.reset_pending = true;
            app.set_status("Resetting state...", StatusLevel::Info);
            tracing::info!("reset requested");
            Some(commands::reset_state(
                app.services.evm.clone(),
                app.services.evm_factory.clone(),
                app.services.store.clone(),
            ))
        }
        // the pending reset returns here, so stay until it lands
        (KeyCode::Esc, _) if !app.reset_pending => {
            app.go_back(Screen::MainMenu);
            None
        }
        _ => None,
    }
}

fn dashboard(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (_, Some('r')) => {
            app.refresh_stats();
            app.set_status("Refreshed", StatusLevel::Info);
        }
        (KeyCode::Esc, _) => app.screen = Screen::MainMenu,
        _ => {}
    }
    None
}

fn accounts_list(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    let accounts = app.accounts();
    if app.cursors.accounts.handle_key(&key, accounts.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(account) = app.cursors.accounts.get(accounts.len()).map(|i| &accounts[i]) {
                app.selection.account = Some(account.address);
                app.show_private_key = false;
                app.private_key_confirm.clear();
                app.drill_down(Screen::AccountDetail);
            }
        }
        KeyCode::Esc => app.screen = Screen::Dashboard,
        _ => {}
    }
    None
}

fn account_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    if let Some(confirmed) = app.private_key_confirm.resolve(&key) {
        if confirmed {
            app.show_private_key = true;
            tracing::info!(account = ?app.selection.account, "private key revealed");
        }
        return None;
    }
    if tab_key(app, &key) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (_, Some('p')) => {
            if app.show_private_key {
                app.show_private_key = false;
            } else {
                app.private_key_confirm.arm();
                app.set_status("Press y to reveal the private key", StatusLevel::Warn);
            }
        }
        (KeyCode::Esc, _) => {
            app.show_private_key = false;
            app.private_key_confirm.clear();
            app.go_back(Screen::AccountsList);
        }
        _ => {}
    }
    None
}

fn blocks_list(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    let blocks = app.blocks();
    if app.cursors.blocks.handle_key(&key, blocks.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(block) = app.cursors.blocks.get(blocks.len()).map(|i| &blocks[i]) {
                app.selection.block = Some(block.number);
                app.cursors.block_txs.reset();
                app.drill_down(Screen::BlockDetail);
            }
        }
        KeyCode::Esc => app.screen = Screen::Dashboard,
        _ => {}
    }
    None
}

fn block_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    let txs = app.block_transactions();
    if app.cursors.block_txs.handle_key(&key, txs.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(tx) = app.cursors.block_txs.get(txs.len()).map(|i| &txs[i]) {
                app.selection.transaction = Some(tx.id.clone());
                app.cursors.logs.reset();
                app.drill_down(Screen::TransactionDetail);
            }
        }
        KeyCode::Esc => app.go_back(Screen::BlocksList),
        _ => {}
    }
    None
}

fn transactions_list(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    let txs = app.transactions();
    if app.cursors.transactions.handle_key(&key, txs.len()) {
        return None;
    }
    match key.code {
        KeyCode::Enter => {
            if let Some(tx) = app.cursors.transactions.get(txs.len()).map(|i| &txs[i]) {
                app.selection.transaction = Some(tx.id.clone());
                app.cursors.logs.reset();
                app.drill_down(Screen::TransactionDetail);
            }
        }
        KeyCode::Esc => app.screen = Screen::Dashboard,
        _ => {}
    }
    None
}

fn transaction_detail(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    let len = app.logs_from(LogSource::Transaction).len();
    if app.cursors.logs.handle_key(&key, len) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (KeyCode::Enter, _) => app.open_log(LogSource::Transaction),
        (_, Some('b')) => {
            if let Some(tx) = app.selected_transaction() {
                app.drill_down(Screen::BlockDetail);
                app.selection.block = Some(tx.block_number);
                app.cursors.block_txs.reset();
            }
        }
        (_, Some('a')) => {
            if let Some(tx) = app.selected_transaction() {
                app.drill_down(Screen::AccountDetail);
                app.selection.account = Some(tx.from);
                app.show_private_key = false;
                app.private_key_confirm.clear();
            }
        }
        (KeyCode::Esc, _) => app.go_back(Screen::TransactionsList),
        _ => {}
    }
    None
}

fn state_inspector(app: &mut App, key: KeyEvent) -> Option<Command> {
    if tab_key(app, &key) {
        return None;
    }
    if is_ctrl(&key, 'v') {
        match app.services.clipboard.read() {
            Ok(text) => app.inspector_input.set_value(normalize_paste(&text)),
            Err(err) => app.set_status(err.to_string(), StatusLevel::Warn),
        }
        return None;
    }
    match key.code {
        KeyCode::Enter => app.inspect(),
        KeyCode::Esc => app.screen = Screen::Dashboard,
        _ => {
            app.inspector_input.handle_key(&key);
        }
    }
    None
}

fn settings(app: &mut App, key: KeyEvent) -> Option<Command> {
    if let Some(confirmed) = app.regenerate_confirm.resolve(&key) {
        if confirmed {
            app.services.accounts.regenerate();
            app.selection.account = None;
            app.cursors.accounts.reset();
            app.inspector_result = None;
            app.set_status("Accounts regenerated", StatusLevel::Info);
        } else {
            app.set_status("Regenerate cancelled", StatusLevel::Info);
        }
        return None;
    }
    if tab_key(app, &key) {
        return None;
    }
    match (key.code, plain_char(&key)) {
        (_, Some('r')) => app.drill_down(Screen::ConfirmReset),
        (_, Some('g')) => {
            app.regenerate_confirm.arm();
            app.set_status("Press y to confirm regenerating accounts", StatusLevel::Warn);
        }
        (_, Some('t')) => {
            app.auto_refresh = !app.auto_refresh;
            let state = if app.auto_refresh { "enabled" } else { "disabled" };
            app.set_status(format!("Auto-refresh {state}"), StatusLevel::Info);
        }
        (_, Some(']')) => {
            let limit = app.services.chain.get_gas_limit().saturating_add(GAS_LIMIT_STEP);
            app.services.chain.set_gas_limit(limit);
            app.set_status(format!("Gas limit: {limit}"), StatusLevel::Info);
        }
        (_, Some('[')) => {
            let current = app.services.chain.get_gas_limit();
            if current > GAS_LIMIT_STEP {
                let limit = current - GAS_LIMIT_STEP;
                app.services.chain.set_gas_limit(limit);
                app.set_status(format!("Gas limit: {limit}"), StatusLevel::Info);
            }
        }
        (_, Some('x')) => {
            let Some(dir) = app.services.export_dir.clone() else {
                app.set_status("No export directory available", StatusLevel::Error);
                return None;
            };
            app.set_status("Exporting history...", StatusLevel::Info);
            return Some(commands::export_history(dir, app.history_entries()));
        }
        (KeyCode::Esc, _) => app.screen = Screen::Dashboard,
        _ => {}
    }
    None
}
