//! JSON-RPC 2.0 endpoint over the local chain and test accounts

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_primitives::{Address, B256};
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::accounts::AccountManager;
use crate::chain::{Block, Chain, Transaction};

pub const CLIENT_VERSION: &str = concat!("chop/v", env!("CARGO_PKG_VERSION"));

const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Clone)]
pub struct RpcState {
    pub chain: Arc<Chain>,
    pub accounts: Arc<AccountManager>,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    fn new(id: Value, outcome: Result<Value, RpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(err) => (None, Some(err)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
            error,
        }
    }
}

pub fn router(state: RpcState) -> Router {
    Router::new().route("/", post(handle_rpc)).with_state(state)
}

pub async fn serve(addr: SocketAddr, state: RpcState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "json-rpc server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn handle_rpc(
    State(state): State<RpcState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(dispatch(&state, request))
}

pub fn dispatch(state: &RpcState, request: RpcRequest) -> RpcResponse {
    tracing::debug!(method = %request.method, "rpc request");
    let outcome = match request.method.as_str() {
        "web3_clientVersion" => Ok(json!(CLIENT_VERSION)),
        "net_version" => Ok(json!(state.chain_id.to_string())),
        "eth_chainId" => Ok(json!(quantity(state.chain_id))),
        "eth_blockNumber" => Ok(json!(quantity(state.chain.block_height()))),
        "eth_gasLimit" => Ok(json!(quantity(state.chain.get_gas_limit()))),
        "eth_accounts" => Ok(json!(state
            .accounts
            .get_all_accounts()
            .into_iter()
            .filter(|account| account.index > 0)
            .map(|account| account.address.to_string())
            .collect::<Vec<_>>())),
        "eth_getBalance" => address_param(&request.params)
            .map(|address| json!(format!("{:#x}", state.accounts.get_account(&address).balance))),
        "eth_getTransactionCount" => address_param(&request.params)
            .map(|address| json!(quantity(state.accounts.get_account(&address).nonce))),
        "eth_getCode" => address_param(&request.params)
            .map(|address| json!(state.accounts.get_account(&address).code.to_string())),
        "eth_getBlockByNumber" => block_param(state, &request.params).map(|number| {
            state
                .chain
                .get_block(number)
                .map(|block| block_json(&block))
                .unwrap_or(Value::Null)
        }),
        "eth_getTransactionByHash" => hash_param(&request.params).map(|hash| {
            state
                .chain
                .get_transaction_by_hash(&hash)
                .map(|tx| transaction_json(&tx))
                .unwrap_or(Value::Null)
        }),
        other => Err(RpcError {
            code: METHOD_NOT_FOUND,
            message: format!("the method {other} does not exist/is not available"),
        }),
    };
    if let Err(err) = &outcome {
        tracing::debug!(method = %request.method, code = err.code, "rpc error");
    }
    RpcResponse::new(request.id, outcome)
}

fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

fn invalid_params(message: impl Into<String>) -> RpcError {
    RpcError {
        code: INVALID_PARAMS,
        message: message.into(),
    }
}

fn first_param(params: &Value) -> Result<&str, RpcError> {
    params
        .get(0)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid_params("missing first parameter"))
}

fn address_param(params: &Value) -> Result<Address, RpcError> {
    first_param(params)?
        .parse::<Address>()
        .map_err(|err| invalid_params(format!("invalid address: {err}")))
}

fn hash_param(params: &Value) -> Result<B256, RpcError> {
    first_param(params)?
        .parse::<B256>()
        .map_err(|err| invalid_params(format!("invalid hash: {err}")))
}

fn block_param(state: &RpcState, params: &Value) -> Result<u64, RpcError> {
    match first_param(params)? {
        "latest" | "pending" | "safe" | "finalized" => Ok(state.chain.block_height()),
        "earliest" => Ok(0),
        tag => {
            let digits = tag
                .strip_prefix("0x")
                .ok_or_else(|| invalid_params(format!("invalid block tag: {tag}")))?;
            u64::from_str_radix(digits, 16).map_err(|err| invalid_params(err.to_string()))
        }
    }
}

fn block_json(block: &Block) -> Value {
    json!({
        "number": quantity(block.number),
        "hash": block.hash,
        "parentHash": block.parent_hash,
        "timestamp": quantity(block.timestamp.timestamp().max(0) as u64),
        "gasUsed": quantity(block.gas_used),
        "gasLimit": quantity(block.gas_limit),
        "miner": block.miner,
        "stateRoot": block.state_root,
        "size": quantity(block.size),
        "transactions": block.transactions,
    })
}

fn transaction_json(tx: &Transaction) -> Value {
    json!({
        "hash": tx.hash,
        "blockNumber": quantity(tx.block_number),
        "from": tx.from,
        "to": tx.to,
        "value": format!("{:#x}", tx.value),
        "input": tx.input,
        "gas": quantity(tx.gas_limit),
        "gasUsed": quantity(tx.gas_used),
        "status": if tx.status { "0x1" } else { "0x0" },
        "contractAddress": tx.contract_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RpcState {
        RpcState {
            chain: Arc::new(Chain::default()),
            accounts: Arc::new(AccountManager::with_seed([5u8; 32], 2, 1)),
            chain_id: 1,
        }
    }

    fn call(state: &RpcState, method: &str, params: Value) -> RpcResponse {
        dispatch(
            state,
            RpcRequest {
                id: json!(1),
                method: method.to_string(),
                params,
            },
        )
    }

    #[test]
    fn test_basic_methods() {
        let state = state();
        assert_eq!(call(&state, "eth_chainId", Value::Null).result, Some(json!("0x1")));
        assert_eq!(call(&state, "eth_blockNumber", Value::Null).result, Some(json!("0x0")));
        assert_eq!(
            call(&state, "eth_gasLimit", Value::Null).result,
            Some(json!("0x1c9c380"))
        );
        let accounts = call(&state, "eth_accounts", Value::Null).result.unwrap();
        assert_eq!(accounts.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_balance_of_test_account() {
        let state = state();
        let address = state.accounts.get_all_accounts()[0].address;
        let response = call(&state, "eth_getBalance", json!([address.to_string(), "latest"]));
        assert_eq!(response.result, Some(json!("0xde0b6b3a7640000")));
    }

    #[test]
    fn test_unknown_method_and_bad_params() {
        let state = state();
        let response = call(&state, "eth_sendTransaction", json!([]));
        assert_eq!(response.error.map(|e| e.code), Some(METHOD_NOT_FOUND));
        let response = call(&state, "eth_getBalance", json!(["nope"]));
        assert_eq!(response.error.map(|e| e.code), Some(INVALID_PARAMS));
    }

    #[test]
    fn test_genesis_block_lookup() {
        let state = state();
        let block = call(&state, "eth_getBlockByNumber", json!(["earliest", false]))
            .result
            .unwrap();
        assert_eq!(block["number"], json!("0x0"));
        let missing = call(&state, "eth_getBlockByNumber", json!(["0x10", false]));
        assert_eq!(missing.result, Some(Value::Null));
    }
}
