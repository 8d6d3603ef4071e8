//! Application model: the single owner of UI state
//!
//! Only the event loop mutates [`App`]. Background work is started by returning
//! a [`Command`] from [`App::handle_key`] or [`App::update`], and its result is
//! folded back in through [`App::update`].

pub mod commands;
mod handlers;
mod params;
mod update;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::Address;
use chrono::{DateTime, Utc};

use crate::accounts::{Account, AccountManager};
use crate::bytecode::{Disassembly, Instruction};
use crate::chain::{Block, Chain, ChainStats, Transaction};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::core::{Confirmation, ListCursor, NavContext, NavigationStack, Screen, TextInput};
use crate::domain::{CallField, CallParams, CallResult, Contract, HistoryEntry, LogEntry};
use crate::evm::{BackendFactory, EvmBackend};
use crate::history::HistoryManager;
use crate::inspector::{AccountState, StateInspector};
use crate::store::CallStore;

pub use handlers::handler_for;

const STATUS_TTL: Duration = Duration::from_secs(3);
const COPY_FEEDBACK_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    MakeCall,
    CallHistory,
    Contracts,
    Dashboard,
    ResetState,
    Exit,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::MakeCall => "Make Call",
            MenuItem::CallHistory => "Call History",
            MenuItem::Contracts => "Contracts",
            MenuItem::Dashboard => "Dashboard",
            MenuItem::ResetState => "Reset State",
            MenuItem::Exit => "Exit",
        }
    }
}

pub const MAIN_MENU: [MenuItem; 6] = [
    MenuItem::MakeCall,
    MenuItem::CallHistory,
    MenuItem::Contracts,
    MenuItem::Dashboard,
    MenuItem::ResetState,
    MenuItem::Exit,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
    ttl: Duration,
}

/// Which list the selected log index points into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogSource {
    #[default]
    LastResult,
    History,
    Transaction,
}

/// Cursor per list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursors {
    pub main_menu: ListCursor,
    pub params: ListCursor,
    pub call_type: ListCursor,
    pub history: ListCursor,
    pub contracts: ListCursor,
    pub accounts: ListCursor,
    pub blocks: ListCursor,
    pub transactions: ListCursor,
    pub block_txs: ListCursor,
    pub logs: ListCursor,
    pub instructions: ListCursor,
}

/// Entities that scope the detail screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub history_id: Option<u64>,
    pub contract: Option<Address>,
    pub account: Option<Address>,
    pub block: Option<u64>,
    pub transaction: Option<String>,
    pub log_index: Option<usize>,
    pub log_source: LogSource,
}

/// Field being edited and its raw buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub field: CallField,
    pub input: TextInput,
}

/// Long-lived collaborators shared with background commands.
#[derive(Clone)]
pub struct Services {
    pub evm: Arc<dyn EvmBackend>,
    pub evm_factory: BackendFactory,
    pub chain: Arc<Chain>,
    pub accounts: Arc<AccountManager>,
    pub history: Arc<HistoryManager>,
    pub inspector: StateInspector,
    pub store: Option<Arc<dyn CallStore>>,
    pub clipboard: Arc<dyn Clipboard>,
    pub export_dir: Option<PathBuf>,
}

impl Services {
    pub fn new(
        evm_factory: BackendFactory,
        chain: Arc<Chain>,
        accounts: Arc<AccountManager>,
    ) -> anyhow::Result<Self> {
        let evm = evm_factory()?;
        let history = Arc::new(HistoryManager::new());
        let inspector = StateInspector::new(accounts.clone(), history.clone());
        Ok(Self {
            evm,
            evm_factory,
            chain,
            accounts,
            history,
            inspector,
            store: None,
            clipboard: Arc::new(SystemClipboard),
            export_dir: None,
        })
    }

    pub fn with_store(mut self, store: Arc<dyn CallStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clipboard(mut self, clipboard: Arc<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn with_export_dir(mut self, dir: PathBuf) -> Self {
        self.export_dir = Some(dir);
        self
    }

    /// Append an executed call to history and the chain. Returns the history id.
    pub fn record_call(
        &self,
        params: &CallParams,
        result: &CallResult,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let id = self.history.add_call(params.clone(), result.clone(), timestamp);
        let tx = self.chain.record_call(params, result, timestamp);
        if result.success {
            if let Some(address) = result.deployed_address {
                self.accounts.set_code(address, result.return_data.clone());
            }
        }
        tracing::info!(
            id,
            tx = %tx.id,
            block = tx.block_number,
            success = result.success,
            "call recorded"
        );
        id
    }
}

pub struct App {
    pub screen: Screen,
    pub nav: NavigationStack,
    pub cursors: Cursors,
    pub selection: Selection,
    pub params: CallParams,
    /// Configured defaults restored by reset and reset-all.
    pub defaults: CallParams,
    pub edit: Option<EditState>,
    /// Empty when there is no error.
    pub validation_error: String,
    pub last_result: Option<CallResult>,
    pub disassembly: Option<Disassembly>,
    pub disassembly_error: Option<String>,
    pub block_index: usize,
    pub regenerate_confirm: Confirmation,
    pub private_key_confirm: Confirmation,
    pub show_private_key: bool,
    pub auto_refresh: bool,
    pub reset_pending: bool,
    pub quitting: bool,
    pub status: Option<StatusMessage>,
    pub stats: ChainStats,
    pub inspector_input: TextInput,
    pub inspector_result: Option<Result<AccountState, String>>,
    pub services: Services,
}

impl App {
    pub fn new(services: Services, defaults: CallParams) -> Self {
        let stats = services.chain.get_stats();
        Self {
            screen: Screen::MainMenu,
            nav: NavigationStack::new(),
            cursors: Cursors::default(),
            selection: Selection::default(),
            params: defaults.clone(),
            defaults,
            edit: None,
            validation_error: String::new(),
            last_result: None,
            disassembly: None,
            disassembly_error: None,
            block_index: 0,
            regenerate_confirm: Confirmation::Idle,
            private_key_confirm: Confirmation::Idle,
            show_private_key: false,
            auto_refresh: true,
            reset_pending: false,
            quitting: false,
            status: None,
            stats,
            inspector_input: TextInput::new(),
            inspector_result: None,
            services,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.set_status_for(text, level, STATUS_TTL);
    }

    fn set_status_for(&mut self, text: impl Into<String>, level: StatusLevel, ttl: Duration) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
            ttl,
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > status.ttl {
                self.status = None;
            }
        }
        if self.auto_refresh {
            self.refresh_stats();
        }
    }

    pub fn refresh_stats(&mut self) {
        self.stats = self.services.chain.get_stats();
    }

    pub fn quit(&mut self) {
        if !self.quitting {
            tracing::info!(screen = ?self.screen, "quit requested");
        }
        self.quitting = true;
    }

    /// Release the backend. Called once after the event loop exits.
    pub fn shutdown(&mut self) {
        self.quitting = true;
        self.services.evm.close();
    }

    // === Navigation ===

    /// Push the current screen with its selection context, then enter `target`.
    pub fn drill_down(&mut self, target: Screen) {
        let context = self.origin_context();
        self.nav.push(self.screen, context);
        self.screen = target;
    }

    /// Pop the navigation stack, or go to `fallback` when it is empty.
    pub fn go_back(&mut self, fallback: Screen) {
        match self.nav.pop() {
            Some(entry) => {
                if let Some(context) = entry.context {
                    self.restore_context(context);
                }
                self.screen = entry.screen;
            }
            None => self.screen = fallback,
        }
    }

    pub fn switch_tab(&mut self, forward: bool) {
        self.nav.clear();
        self.regenerate_confirm.clear();
        self.private_key_confirm.clear();
        self.show_private_key = false;
        self.screen = self.screen.cycle_tab(forward);
        if self.screen == Screen::Dashboard {
            self.refresh_stats();
        }
    }

    fn origin_context(&self) -> Option<NavContext> {
        match self.screen {
            Screen::BlockDetail => self.selection.block.map(NavContext::Block),
            Screen::TransactionDetail => {
                self.selection.transaction.clone().map(NavContext::Transaction)
            }
            Screen::CallHistoryDetail => self.selection.history_id.map(NavContext::History),
            Screen::AccountDetail => self.selection.account.map(NavContext::Account),
            _ => None,
        }
    }

    fn restore_context(&mut self, context: NavContext) {
        match context {
            NavContext::Block(number) => self.selection.block = Some(number),
            NavContext::Transaction(id) => self.selection.transaction = Some(id),
            NavContext::History(id) => self.selection.history_id = Some(id),
            NavContext::Account(address) => self.selection.account = Some(address),
        }
    }

    // === Lists and selected entities ===

    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.services.history.get_all_calls()
    }

    pub fn contracts(&self) -> Vec<Contract> {
        self.services.history.get_contracts()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.services.accounts.get_all_accounts()
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.services.chain.get_all_blocks()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.services.chain.get_all_transactions()
    }

    pub fn selected_history(&self) -> Option<HistoryEntry> {
        self.selection
            .history_id
            .and_then(|id| self.services.history.get_call(id))
    }

    pub fn selected_contract(&self) -> Option<Contract> {
        self.selection
            .contract
            .and_then(|address| self.services.history.get_contract(&address))
    }

    pub fn selected_account(&self) -> Option<Account> {
        self.selection
            .account
            .map(|address| self.services.accounts.get_account(&address))
    }

    pub fn selected_block(&self) -> Option<Block> {
        self.selection
            .block
            .and_then(|number| self.services.chain.get_block(number).ok())
    }

    pub fn selected_transaction(&self) -> Option<Transaction> {
        self.selection
            .transaction
            .as_deref()
            .and_then(|id| self.services.chain.get_transaction(id).ok())
    }

    pub fn block_transactions(&self) -> Vec<Transaction> {
        self.selection
            .block
            .map(|number| self.services.chain.get_transactions_by_block(number))
            .unwrap_or_default()
    }

    /// Logs listed on the current screen.
    pub fn visible_logs(&self) -> Vec<LogEntry> {
        let source = match self.screen {
            Screen::CallResult => LogSource::LastResult,
            Screen::CallHistoryDetail => LogSource::History,
            Screen::TransactionDetail => LogSource::Transaction,
            Screen::LogDetail => self.selection.log_source,
            _ => return Vec::new(),
        };
        self.logs_from(source)
    }

    fn logs_from(&self, source: LogSource) -> Vec<LogEntry> {
        match source {
            LogSource::LastResult => self
                .last_result
                .as_ref()
                .map(|result| result.logs.clone())
                .unwrap_or_default(),
            LogSource::History => self
                .selected_history()
                .map(|entry| entry.result.logs)
                .unwrap_or_default(),
            LogSource::Transaction => self
                .selected_transaction()
                .map(|tx| tx.logs)
                .unwrap_or_default(),
        }
    }

    pub fn selected_log(&self) -> Option<LogEntry> {
        let index = self.selection.log_index?;
        self.logs_from(self.selection.log_source).into_iter().nth(index)
    }

    /// Instructions of the current basic block.
    pub fn current_block_instructions(&self) -> &[Instruction] {
        self.disassembly
            .as_ref()
            .and_then(|dis| dis.instructions_for_block(self.block_index))
            .unwrap_or(&[])
    }

    /// Text copied by Ctrl+Y on the current screen.
    pub fn copy_target(&self) -> Option<String> {
        match self.screen {
            Screen::ContractDetail => self.selected_contract().map(|c| c.address.to_string()),
            Screen::TransactionDetail => self.selected_transaction().map(|tx| tx.hash.to_string()),
            Screen::AccountDetail => self.selection.account.map(|address| address.to_string()),
            Screen::BlockDetail => self.selected_block().map(|block| block.hash.to_string()),
            Screen::CallResult => self.last_result.as_ref().and_then(|result| {
                result
                    .deployed_address
                    .map(|address| address.to_string())
                    .or_else(|| {
                        (!result.return_data.is_empty()).then(|| result.return_data.to_string())
                    })
            }),
            Screen::LogDetail => self.selected_log().map(|log| log.data.to_string()),
            _ => None,
        }
    }

    pub(crate) fn copy_to_clipboard(&mut self) {
        let Some(text) = self.copy_target() else {
            self.set_status("Nothing to copy", StatusLevel::Warn);
            return;
        };
        match self.services.clipboard.write_with_feedback(&text) {
            Ok(feedback) => self.set_status_for(feedback, StatusLevel::Info, COPY_FEEDBACK_TTL),
            Err(err) => {
                tracing::warn!(error = %err, "clipboard write failed");
                self.set_status(err.to_string(), StatusLevel::Error);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::chain::Chain;
    use crate::clipboard::MemoryClipboard;
    use crate::evm::{BlockEnv, Hardfork, LocalEvm};

    pub fn app() -> App {
        let accounts = Arc::new(AccountManager::with_seed([9u8; 32], 3, 100));
        let alloc = accounts.genesis_alloc();
        let factory: BackendFactory = Arc::new(move || {
            let evm = LocalEvm::new(Hardfork::default(), BlockEnv::default())
                .with_genesis(alloc.clone());
            Ok(Arc::new(evm) as Arc<dyn EvmBackend>)
        });
        let services = Services::new(factory, Arc::new(Chain::default()), accounts)
            .unwrap()
            .with_clipboard(Arc::new(MemoryClipboard::new()));
        App::new(services, CallParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::app;
    use super::*;

    #[test]
    fn test_drill_down_restores_context() {
        let mut app = app();
        app.screen = Screen::TransactionDetail;
        app.selection.transaction = Some("tx-1".into());
        app.drill_down(Screen::BlockDetail);
        app.selection.transaction = Some("tx-2".into());
        app.go_back(Screen::TransactionsList);
        assert_eq!(app.screen, Screen::TransactionDetail);
        assert_eq!(app.selection.transaction.as_deref(), Some("tx-1"));
        app.go_back(Screen::TransactionsList);
        assert_eq!(app.screen, Screen::TransactionsList);
    }

    #[test]
    fn test_switch_tab_clears_stack() {
        let mut app = app();
        app.screen = Screen::AccountsList;
        app.drill_down(Screen::AccountDetail);
        app.switch_tab(true);
        assert_eq!(app.screen, Screen::BlocksList);
        assert!(app.nav.is_empty());
    }

    #[test]
    fn test_status_expires() {
        let mut app = app();
        app.set_status("hello", StatusLevel::Info);
        assert_eq!(app.status_text().map(|(t, _)| t), Some("hello"));
        if let Some(status) = app.status.as_mut() {
            status.since = Instant::now() - Duration::from_secs(10);
        }
        app.on_tick();
        assert!(app.status.is_none());
    }

    #[test]
    fn test_tick_refreshes_stats_only_when_enabled() {
        let mut app = app();
        let chain = app.services.chain.clone();
        let record = || {
            chain.record_call(
                &CallParams::default(),
                &crate::domain::CallResult::default(),
                chrono::Utc::now(),
            )
        };
        app.auto_refresh = false;
        record();
        app.on_tick();
        assert_eq!(app.stats.total_transactions, 0);

        app.auto_refresh = true;
        record();
        app.on_tick();
        assert_eq!(app.stats.total_transactions, 2);
    }
}
