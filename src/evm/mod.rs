//! EVM execution backend
//!
//! The application talks to execution only through [`EvmBackend`]. The bundled
//! [`LocalEvm`] runs transactions on the `evm` crate's stack executor against an
//! in-memory world.

mod local;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use thiserror::Error;

use crate::domain::{CallParams, CallResult, InputParamError};

pub use local::{AccountInfo, LocalEvm};

#[derive(Debug, Error)]
pub enum EvmError {
    #[error(transparent)]
    InvalidParams(#[from] InputParamError),
    #[error("insufficient balance for transfer: have {have}, need {need}")]
    InsufficientBalance { have: U256, need: U256 },
    #[error("backend is closed")]
    Closed,
}

/// Execution engine consumed by the application.
///
/// Implementations are internally synchronized: the event loop may read while a
/// background task executes.
pub trait EvmBackend: Send + Sync {
    fn execute(&self, params: &CallParams) -> Result<CallResult, EvmError>;

    /// Release resources. Later calls to `execute` fail with [`EvmError::Closed`].
    fn close(&self);
}

/// Creates a fresh backend, used at startup and on state reset.
pub type BackendFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn EvmBackend>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Hardfork {
    Berlin,
    London,
    Paris,
    Shanghai,
    Cancun,
    Prague,
}

impl Hardfork {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hardfork::Berlin => "berlin",
            Hardfork::London => "london",
            Hardfork::Paris => "paris",
            Hardfork::Shanghai => "shanghai",
            Hardfork::Cancun => "cancun",
            Hardfork::Prague => "prague",
        }
    }
}

impl Default for Hardfork {
    fn default() -> Self {
        Hardfork::Cancun
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hardfork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "berlin" => Ok(Hardfork::Berlin),
            "london" => Ok(Hardfork::London),
            "paris" | "merge" => Ok(Hardfork::Paris),
            "shanghai" => Ok(Hardfork::Shanghai),
            "cancun" => Ok(Hardfork::Cancun),
            "prague" => Ok(Hardfork::Prague),
            other => Err(format!("unknown hardfork '{other}'")),
        }
    }
}

/// Block context visible to executing code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEnv {
    pub chain_id: u64,
    pub number: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    pub gas_limit: u64,
    pub base_fee: U256,
    pub prevrandao: B256,
    pub difficulty: U256,
    pub blob_base_fee: U256,
}

impl Default for BlockEnv {
    fn default() -> Self {
        Self {
            chain_id: 1,
            number: 1,
            timestamp: 1_234_567_890,
            coinbase: Address::ZERO,
            gas_limit: 30_000_000,
            base_fee: U256::ZERO,
            prevrandao: B256::ZERO,
            difficulty: U256::ZERO,
            blob_base_fee: U256::from(1),
        }
    }
}
