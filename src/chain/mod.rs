//! Local chain: blocks and the transactions executed through the app

use std::collections::HashMap;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::RlpEncodable;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::domain::validate::{parse_address, parse_gas, parse_hex_bytes, parse_u256};
use crate::domain::{CallParams, CallResult, CallType, LogEntry};

pub const DEFAULT_GAS_LIMIT: u64 = 30_000_000;
const BLOCK_BASE_SIZE: u64 = 500;
const BLOCK_TX_SIZE: u64 = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("transaction {0} not found")]
    TransactionNotFound(String),
    #[error("block {0} not found")]
    BlockNotFound(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: DateTime<Utc>,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub transactions: Vec<String>,
    pub miner: Address,
    pub state_root: B256,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: String,
    pub hash: B256,
    pub block_number: u64,
    pub call_type: CallType,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub status: bool,
    pub error: Option<String>,
    pub logs: Vec<LogEntry>,
    pub contract_address: Option<Address>,
    pub timestamp: DateTime<Utc>,
}

/// Transaction fields known before it is assigned an id and mined.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub call_type: CallType,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub status: bool,
    pub error: Option<String>,
    pub logs: Vec<LogEntry>,
    pub contract_address: Option<Address>,
    pub timestamp: DateTime<Utc>,
}

impl TransactionDraft {
    /// Lenient conversion: fields that fail to parse fall back to zero values.
    pub fn from_call(params: &CallParams, result: &CallResult, timestamp: DateTime<Utc>) -> Self {
        let to = if params.call_type.is_create() {
            None
        } else {
            parse_address(&params.target).ok()
        };
        Self {
            call_type: params.call_type,
            from: parse_address(&params.caller).unwrap_or_default(),
            to,
            value: parse_u256(&params.value).unwrap_or_default(),
            input: parse_hex_bytes(&params.input_data).unwrap_or_default(),
            gas_limit: parse_gas(&params.gas_limit).unwrap_or_default(),
            gas_used: result.gas_used,
            status: result.success,
            error: result.error.clone(),
            logs: result.logs.clone(),
            contract_address: result.deployed_address,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainStats {
    pub block_height: u64,
    pub total_blocks: u64,
    pub total_transactions: u64,
    pub successful_txs: u64,
    pub failed_txs: u64,
    pub total_gas_used: u64,
    pub last_block_time: Option<DateTime<Utc>>,
}

#[derive(RlpEncodable)]
struct TxHashFields {
    sequence: u64,
    from: Address,
    to: Address,
    value: U256,
    input: Bytes,
    gas_limit: u64,
    timestamp: u64,
}

#[derive(RlpEncodable)]
struct HeaderFields {
    parent_hash: B256,
    number: u64,
    timestamp: u64,
    gas_used: u64,
    gas_limit: u64,
    miner: Address,
    state_root: B256,
    tx_root: B256,
}

#[derive(Debug)]
struct ChainState {
    blocks: Vec<Block>,
    transactions: HashMap<String, Transaction>,
    next_tx: u64,
    gas_limit: u64,
}

impl ChainState {
    fn genesis(gas_limit: u64) -> Self {
        Self {
            blocks: vec![build_block(
                0,
                B256::ZERO,
                Vec::new(),
                &[],
                0,
                gas_limit,
                Address::ZERO,
                Utc::now(),
            )],
            transactions: HashMap::new(),
            next_tx: 1,
            gas_limit,
        }
    }
}

/// Internally synchronized chain shared by the UI loop, commands, and the server.
#[derive(Debug)]
pub struct Chain {
    state: RwLock<ChainState>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_LIMIT)
    }
}

impl Chain {
    pub fn new(gas_limit: u64) -> Self {
        Self {
            state: RwLock::new(ChainState::genesis(gas_limit)),
        }
    }

    pub fn add_transaction(&self, draft: TransactionDraft) -> Transaction {
        let mut state = self.state.write();
        let sequence = state.next_tx;
        state.next_tx += 1;
        let fields = TxHashFields {
            sequence,
            from: draft.from,
            to: draft.to.unwrap_or_default(),
            value: draft.value,
            input: draft.input.clone(),
            gas_limit: draft.gas_limit,
            timestamp: draft.timestamp.timestamp_millis().max(0) as u64,
        };
        let tx = Transaction {
            id: format!("tx-{sequence}"),
            hash: keccak256(alloy_rlp::encode(&fields)),
            block_number: 0,
            call_type: draft.call_type,
            from: draft.from,
            to: draft.to,
            value: draft.value,
            input: draft.input,
            gas_limit: draft.gas_limit,
            gas_used: draft.gas_used,
            status: draft.status,
            error: draft.error,
            logs: draft.logs,
            contract_address: draft.contract_address,
            timestamp: draft.timestamp,
        };
        state.transactions.insert(tx.id.clone(), tx.clone());
        tx
    }

    /// Mine a block holding `tx_ids` on top of the latest block.
    pub fn add_block(
        &self,
        tx_ids: Vec<String>,
        gas_used: u64,
        miner: Address,
        timestamp: DateTime<Utc>,
    ) -> Block {
        let mut state = self.state.write();
        let (number, parent_hash) = state
            .blocks
            .last()
            .map(|latest| (latest.number + 1, latest.hash))
            .unwrap_or((0, B256::ZERO));
        let hashes: Vec<B256> = tx_ids
            .iter()
            .filter_map(|id| state.transactions.get(id).map(|tx| tx.hash))
            .collect();
        let block = build_block(
            number,
            parent_hash,
            tx_ids,
            &hashes,
            gas_used,
            state.gas_limit,
            miner,
            timestamp,
        );
        for id in &block.transactions {
            if let Some(tx) = state.transactions.get_mut(id) {
                tx.block_number = number;
            }
        }
        state.blocks.push(block.clone());
        block
    }

    /// Add the transaction for an executed call and mine it into its own block.
    pub fn record_call(
        &self,
        params: &CallParams,
        result: &CallResult,
        timestamp: DateTime<Utc>,
    ) -> Transaction {
        let tx = self.add_transaction(TransactionDraft::from_call(params, result, timestamp));
        let block = self.add_block(vec![tx.id.clone()], tx.gas_used, Address::ZERO, timestamp);
        Transaction {
            block_number: block.number,
            ..tx
        }
    }

    pub fn get_transaction(&self, id: &str) -> Result<Transaction, ChainError> {
        self.state
            .read()
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| ChainError::TransactionNotFound(id.to_string()))
    }

    pub fn get_transaction_by_hash(&self, hash: &B256) -> Result<Transaction, ChainError> {
        self.state
            .read()
            .transactions
            .values()
            .find(|tx| tx.hash == *hash)
            .cloned()
            .ok_or_else(|| ChainError::TransactionNotFound(hash.to_string()))
    }

    /// Newest first.
    pub fn get_all_transactions(&self) -> Vec<Transaction> {
        let state = self.state.read();
        let mut txs: Vec<Transaction> = state.transactions.values().cloned().collect();
        txs.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| tx_sequence(&b.id).cmp(&tx_sequence(&a.id)))
        });
        txs
    }

    pub fn get_transactions_by_block(&self, number: u64) -> Vec<Transaction> {
        let state = self.state.read();
        let Some(block) = state.blocks.get(number as usize) else {
            return Vec::new();
        };
        block
            .transactions
            .iter()
            .filter_map(|id| state.transactions.get(id).cloned())
            .collect()
    }

    pub fn get_block(&self, number: u64) -> Result<Block, ChainError> {
        self.state
            .read()
            .blocks
            .get(number as usize)
            .cloned()
            .ok_or(ChainError::BlockNotFound(number))
    }

    pub fn get_latest_block(&self) -> Option<Block> {
        self.state.read().blocks.last().cloned()
    }

    /// Newest first.
    pub fn get_all_blocks(&self) -> Vec<Block> {
        self.state.read().blocks.iter().rev().cloned().collect()
    }

    pub fn block_height(&self) -> u64 {
        self.state.read().blocks.len().saturating_sub(1) as u64
    }

    pub fn get_stats(&self) -> ChainStats {
        let state = self.state.read();
        let mut stats = ChainStats {
            block_height: state.blocks.len().saturating_sub(1) as u64,
            total_blocks: state.blocks.len() as u64,
            total_transactions: state.transactions.len() as u64,
            last_block_time: state.blocks.last().map(|block| block.timestamp),
            ..ChainStats::default()
        };
        for tx in state.transactions.values() {
            if tx.status {
                stats.successful_txs += 1;
            } else {
                stats.failed_txs += 1;
            }
            stats.total_gas_used += tx.gas_used;
        }
        stats
    }

    pub fn get_gas_limit(&self) -> u64 {
        self.state.read().gas_limit
    }

    pub fn set_gas_limit(&self, gas_limit: u64) {
        self.state.write().gas_limit = gas_limit;
    }

    /// Back to a fresh genesis block. The configured gas limit is kept.
    pub fn reset(&self) {
        let mut state = self.state.write();
        let gas_limit = state.gas_limit;
        *state = ChainState::genesis(gas_limit);
    }
}

#[allow(clippy::too_many_arguments)]
fn build_block(
    number: u64,
    parent_hash: B256,
    transactions: Vec<String>,
    tx_hashes: &[B256],
    gas_used: u64,
    gas_limit: u64,
    miner: Address,
    timestamp: DateTime<Utc>,
) -> Block {
    let tx_root = keccak256(tx_hashes.concat());
    let fields = HeaderFields {
        parent_hash,
        number,
        timestamp: timestamp.timestamp().max(0) as u64,
        gas_used,
        gas_limit,
        miner,
        state_root: B256::ZERO,
        tx_root,
    };
    let size = BLOCK_BASE_SIZE + BLOCK_TX_SIZE * transactions.len() as u64;
    Block {
        number,
        hash: keccak256(alloy_rlp::encode(&fields)),
        parent_hash,
        timestamp,
        gas_used,
        gas_limit,
        transactions,
        miner,
        state_root: B256::ZERO,
        size,
    }
}

fn tx_sequence(id: &str) -> u64 {
    id.strip_prefix("tx-")
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}
