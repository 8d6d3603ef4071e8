//! Shared fixtures: stub collaborators behind the production traits

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use chop::accounts::AccountManager;
use chop::app::{App, Services};
use chop::chain::Chain;
use chop::clipboard::MemoryClipboard;
use chop::domain::{CallParams, CallResult};
use chop::evm::{BackendFactory, BlockEnv, EvmBackend, EvmError, Hardfork, LocalEvm};
use chop::store::{CallStore, PersistedCall, StoreError};

/// Backend that returns a canned result and remembers what it executed.
#[derive(Default)]
pub struct StubBackend {
    pub result: CallResult,
    pub fail: bool,
    pub executed: Mutex<Vec<CallParams>>,
    closed: AtomicBool,
}

impl StubBackend {
    pub fn succeeding() -> Self {
        Self {
            result: CallResult {
                success: true,
                gas_used: 21_000,
                ..CallResult::default()
            },
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl EvmBackend for StubBackend {
    fn execute(&self, params: &CallParams) -> Result<CallResult, EvmError> {
        if self.fail || self.is_closed() {
            return Err(EvmError::Closed);
        }
        self.executed.lock().push(params.clone());
        Ok(self.result.clone())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Store that reports every append on a channel.
pub struct ChannelStore {
    calls: Mutex<Vec<PersistedCall>>,
    appended: mpsc::UnboundedSender<PersistedCall>,
}

impl ChannelStore {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PersistedCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                calls: Mutex::new(Vec::new()),
                appended: tx,
            },
            rx,
        )
    }
}

#[async_trait::async_trait]
impl CallStore for ChannelStore {
    async fn append_call(&self, call: PersistedCall) -> Result<(), StoreError> {
        self.calls.lock().push(call.clone());
        let _ = self.appended.send(call);
        Ok(())
    }

    async fn load_calls(&self) -> Result<Vec<PersistedCall>, StoreError> {
        Ok(self.calls.lock().clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.calls.lock().clear();
        Ok(())
    }
}

pub fn accounts() -> Arc<AccountManager> {
    Arc::new(AccountManager::with_seed([1u8; 32], 3, 100))
}

pub fn stub_factory(backend: Arc<StubBackend>) -> BackendFactory {
    Arc::new(move || Ok(backend.clone() as Arc<dyn EvmBackend>))
}

pub fn local_factory(accounts: Arc<AccountManager>) -> BackendFactory {
    Arc::new(move || {
        let evm = LocalEvm::new(Hardfork::default(), BlockEnv::default())
            .with_genesis(accounts.genesis_alloc());
        Ok(Arc::new(evm) as Arc<dyn EvmBackend>)
    })
}

pub fn app_with(factory: BackendFactory, accounts: Arc<AccountManager>) -> App {
    let services = Services::new(factory, Arc::new(Chain::default()), accounts)
        .expect("backend")
        .with_clipboard(Arc::new(MemoryClipboard::new()));
    App::new(services, CallParams::default())
}

/// App over the real local EVM.
pub fn local_app() -> App {
    let accounts = accounts();
    app_with(local_factory(accounts.clone()), accounts)
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn ch(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

pub fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}
