//! Address lookup across test accounts and deployed contracts

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;
use thiserror::Error;

use crate::accounts::AccountManager;
use crate::domain::validate::parse_address;
use crate::history::HistoryManager;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InspectError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountState {
    pub address: Address,
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub code_size: usize,
    pub storage_slots: usize,
    pub is_contract: bool,
}

#[derive(Debug, Clone)]
pub struct StateInspector {
    accounts: Arc<AccountManager>,
    history: Arc<HistoryManager>,
}

impl StateInspector {
    pub fn new(accounts: Arc<AccountManager>, history: Arc<HistoryManager>) -> Self {
        Self { accounts, history }
    }

    pub fn inspect_address(&self, raw: &str) -> Result<AccountState, InspectError> {
        let address =
            parse_address(raw).map_err(|_| InspectError::InvalidAddress(raw.trim().to_string()))?;
        let account = self.accounts.get_account(&address);
        let code = self
            .history
            .get_contract(&address)
            .map(|contract| contract.code)
            .filter(|code| !code.is_empty())
            .unwrap_or(account.code);

        Ok(AccountState {
            address,
            balance: account.balance,
            nonce: account.nonce,
            code_size: code.len(),
            is_contract: !code.is_empty(),
            storage_slots: 0,
            code,
        })
    }
}

/// Render wei as ETH with two decimals, or a whole number when exact.
pub fn format_balance(wei: U256) -> String {
    let unit = U256::from(1_000_000_000_000_000_000u64);
    let whole = wei / unit;
    let remainder = wei % unit;
    if remainder.is_zero() {
        return format!("{whole} ETH");
    }
    let cents = u64::try_from(remainder / U256::from(10_000_000_000_000_000u64)).unwrap_or(0);
    format!("{whole}.{cents:02} ETH")
}
