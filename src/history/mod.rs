//! In-memory call history and the contracts deployed by it

use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{CallParams, CallResult, Contract, HistoryEntry};

#[derive(Debug, Default)]
struct HistoryState {
    calls: Vec<HistoryEntry>,
    contracts: Vec<Contract>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct HistoryManager {
    state: RwLock<HistoryState>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its id. Ids start at 1.
    pub fn add_call(
        &self,
        params: CallParams,
        result: CallResult,
        timestamp: DateTime<Utc>,
    ) -> u64 {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = state.next_id;

        if result.success && params.call_type.is_create() {
            if let Some(address) = result.deployed_address {
                state.contracts.retain(|contract| contract.address != address);
                state.contracts.push(Contract {
                    address,
                    code: result.return_data.clone(),
                    timestamp,
                });
            }
        }

        state.calls.push(HistoryEntry {
            id,
            params,
            result,
            timestamp,
        });
        id
    }

    pub fn get_call(&self, id: u64) -> Option<HistoryEntry> {
        self.state.read().calls.iter().find(|entry| entry.id == id).cloned()
    }

    /// Newest first.
    pub fn get_all_calls(&self) -> Vec<HistoryEntry> {
        self.state.read().calls.iter().rev().cloned().collect()
    }

    /// Newest first.
    pub fn get_contracts(&self) -> Vec<Contract> {
        self.state.read().contracts.iter().rev().cloned().collect()
    }

    pub fn get_contract(&self, address: &Address) -> Option<Contract> {
        self.state
            .read()
            .contracts
            .iter()
            .find(|contract| contract.address == *address)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        *self.state.write() = HistoryState::default();
    }
}
