use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use alloy_primitives::{address, keccak256, Address, Bytes, B256, U256};
use evm::backend::{ApplyBackend, Log, MemoryAccount, MemoryBackend, MemoryVicinity};
use evm::executor::stack::{MemoryStackState, StackExecutor, StackSubstateMetadata};
use evm::{Config, ExitError, ExitReason};
use parking_lot::Mutex;
use primitive_types::{H160, H256, U256 as Word};

use super::{BlockEnv, EvmBackend, EvmError, Hardfork};
use crate::domain::{CallParams, CallRequest, CallResult, CallType, LogEntry};

/// Scratch account holding the forwarder used for top-level STATICCALL.
const STATIC_FORWARDER: Address = address!("0x00000000000000000000000000000000000057a7");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountInfo {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: HashMap<U256, U256>,
}

type World = BTreeMap<H160, MemoryAccount>;

/// In-process backend over the `evm` stack executor with its own world state.
pub struct LocalEvm {
    hardfork: Hardfork,
    config: Config,
    vicinity: MemoryVicinity,
    world: Mutex<World>,
    closed: AtomicBool,
}

impl std::fmt::Debug for LocalEvm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEvm")
            .field("hardfork", &self.hardfork)
            .field("accounts", &self.world.lock().len())
            .finish()
    }
}

impl LocalEvm {
    pub fn new(hardfork: Hardfork, block: BlockEnv) -> Self {
        Self {
            hardfork,
            config: engine_config(hardfork),
            vicinity: vicinity(hardfork, &block),
            world: Mutex::new(World::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Fund accounts before the first execution.
    pub fn with_genesis(self, alloc: impl IntoIterator<Item = (Address, U256)>) -> Self {
        {
            let mut world = self.world.lock();
            for (address, balance) in alloc {
                account_mut(&mut world, address).balance = to_word(balance);
            }
        }
        self
    }

    pub fn hardfork(&self) -> Hardfork {
        self.hardfork
    }

    pub fn set_code(&self, address: Address, code: Bytes) {
        account_mut(&mut self.world.lock(), address).code = code.to_vec();
    }

    pub fn set_balance(&self, address: Address, balance: U256) {
        account_mut(&mut self.world.lock(), address).balance = to_word(balance);
    }

    pub fn account(&self, address: &Address) -> Option<AccountInfo> {
        let world = self.world.lock();
        let account = world.get(&to_h160(*address))?;
        Some(AccountInfo {
            balance: from_word(account.balance),
            nonce: account.nonce.low_u64(),
            code: Bytes::from(account.code.clone()),
            storage: account
                .storage
                .iter()
                .map(|(slot, value)| {
                    (
                        U256::from_be_bytes(slot.to_fixed_bytes()),
                        U256::from_be_bytes(value.to_fixed_bytes()),
                    )
                })
                .collect(),
        })
    }

    /// Execute a validated request as a top-level transaction.
    pub fn run(&self, request: &CallRequest) -> Result<CallResult, EvmError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EvmError::Closed);
        }

        let mut world = self.world.lock();
        let caller = to_h160(request.caller);
        let have = world
            .get(&caller)
            .map(|account| from_word(account.balance))
            .unwrap_or_default();
        if have < request.value {
            return Err(EvmError::InsufficientBalance {
                have,
                need: request.value,
            });
        }
        let nonce = world
            .get(&caller)
            .map(|account| account.nonce.low_u64())
            .unwrap_or(0);

        let mut state = world.clone();
        let target = to_h160(request.target.unwrap_or_default());
        let caller_code = state.get(&caller).map(|account| account.code.clone());
        match request.kind {
            CallType::StaticCall => {
                account_mut(&mut state, STATIC_FORWARDER).code =
                    static_forwarder(request.target.unwrap_or_default());
            }
            CallType::DelegateCall => {
                let code = state
                    .get(&target)
                    .map(|account| account.code.clone())
                    .unwrap_or_default();
                account_mut(&mut state, request.caller).code = code;
            }
            _ => {}
        }

        let vicinity = MemoryVicinity {
            origin: caller,
            ..self.vicinity.clone()
        };
        let mut backend = MemoryBackend::new(&vicinity, state);
        let metadata = StackSubstateMetadata::new(request.gas_limit, &self.config);
        let stack = MemoryStackState::new(metadata, &mut backend);
        let mut executor = StackExecutor::new_with_precompiles(stack, &self.config, &());

        let value = to_word(request.value);
        let input = request.input.to_vec();
        let gas_limit = request.gas_limit;
        let (reason, output) = match request.kind {
            CallType::Call => {
                executor.transact_call(caller, target, value, input, gas_limit, Vec::new())
            }
            CallType::StaticCall => executor.transact_call(
                caller,
                to_h160(STATIC_FORWARDER),
                Word::zero(),
                input,
                gas_limit,
                Vec::new(),
            ),
            // target code runs in the caller's own account
            CallType::DelegateCall => {
                executor.transact_call(caller, caller, Word::zero(), input, gas_limit, Vec::new())
            }
            CallType::Create => {
                executor.transact_create(caller, value, input, gas_limit, Vec::new())
            }
            CallType::Create2 => executor.transact_create2(
                caller,
                value,
                input,
                H256::from_slice(request.salt.as_slice()),
                gas_limit,
                Vec::new(),
            ),
        };
        let gas_used = executor.used_gas().min(gas_limit);
        let (applies, logs) = executor.into_state().deconstruct();
        let logs: Vec<Log> = logs.into_iter().collect();
        let entries: Vec<LogEntry> = logs.iter().map(log_entry).collect();
        backend.apply(applies, logs, true);

        let mut state = backend.state().clone();
        match request.kind {
            CallType::StaticCall => {
                state.remove(&to_h160(STATIC_FORWARDER));
            }
            CallType::DelegateCall => {
                account_mut(&mut state, request.caller).code = caller_code.unwrap_or_default();
            }
            _ => {}
        }

        let created = match request.kind {
            CallType::Create => Some(request.caller.create(nonce)),
            CallType::Create2 => {
                Some(request.caller.create2(request.salt, keccak256(&request.input)))
            }
            _ => None,
        };
        let gas_left = gas_limit - gas_used;
        let result = match reason {
            ExitReason::Succeed(_) => {
                let (return_data, deployed_address) = match created {
                    Some(address) => {
                        let code = state
                            .get(&to_h160(address))
                            .map(|account| Bytes::from(account.code.clone()))
                            .unwrap_or_default();
                        (code, Some(address))
                    }
                    None => (Bytes::from(output), None),
                };
                CallResult {
                    success: true,
                    return_data,
                    gas_used,
                    gas_left,
                    error: None,
                    logs: entries,
                    deployed_address,
                }
            }
            ExitReason::Revert(_) => {
                let reason = alloy_sol_types::decode_revert_reason(&output)
                    .map(|reason| format!("execution reverted: {reason}"))
                    .unwrap_or_else(|| "execution reverted".to_string());
                CallResult {
                    success: false,
                    return_data: Bytes::from(output),
                    gas_used,
                    gas_left,
                    error: Some(reason),
                    ..CallResult::default()
                }
            }
            ExitReason::Error(err) => CallResult {
                success: false,
                gas_used,
                gas_left,
                error: Some(describe_error(&err)),
                ..CallResult::default()
            },
            ExitReason::Fatal(fatal) => CallResult {
                success: false,
                gas_used,
                gas_left,
                error: Some(format!("fatal: {fatal:?}")),
                ..CallResult::default()
            },
        };
        *world = state;
        tracing::debug!(
            kind = ?request.kind,
            success = result.success,
            gas_used = result.gas_used,
            "transaction executed"
        );
        Ok(result)
    }
}

impl EvmBackend for LocalEvm {
    fn execute(&self, params: &CallParams) -> Result<CallResult, EvmError> {
        let request = CallRequest::try_from(params)?;
        self.run(&request)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

fn engine_config(hardfork: Hardfork) -> Config {
    match hardfork {
        Hardfork::Berlin => Config::berlin(),
        Hardfork::London => Config::london(),
        Hardfork::Paris => Config::merge(),
        // newest rule set the executor ships
        Hardfork::Shanghai | Hardfork::Cancun | Hardfork::Prague => Config::shanghai(),
    }
}

fn vicinity(hardfork: Hardfork, block: &BlockEnv) -> MemoryVicinity {
    let randomness =
        (hardfork >= Hardfork::Paris).then(|| H256::from_slice(block.prevrandao.as_slice()));
    MemoryVicinity {
        gas_price: Word::zero(),
        origin: H160::zero(),
        chain_id: Word::from(block.chain_id),
        block_hashes: Vec::new(),
        block_number: Word::from(block.number),
        block_coinbase: to_h160(block.coinbase),
        block_timestamp: Word::from(block.timestamp),
        block_difficulty: to_word(block.difficulty),
        block_randomness: randomness,
        block_gas_limit: Word::from(block.gas_limit),
        block_base_fee_per_gas: to_word(block.base_fee),
    }
}

fn account_mut(world: &mut World, address: Address) -> &mut MemoryAccount {
    world
        .entry(to_h160(address))
        .or_insert_with(|| MemoryAccount {
            nonce: Word::zero(),
            balance: Word::zero(),
            storage: BTreeMap::new(),
            code: Vec::new(),
        })
}

/// Runtime code that forwards its calldata to `target` with STATICCALL and
/// returns or reverts with the callee's output.
fn static_forwarder(target: Address) -> Vec<u8> {
    // CALLDATASIZE 0 0 CALLDATACOPY, then STATICCALL(gas, target, 0, size, 0, 0)
    let mut code = vec![
        0x36, 0x60, 0x00, 0x60, 0x00, 0x37, 0x60, 0x00, 0x60, 0x00, 0x36, 0x60, 0x00, 0x73,
    ];
    code.extend_from_slice(target.as_slice());
    // copy return data to memory 0, then RETURN at 0x31 on success else REVERT
    code.extend_from_slice(&[
        0x5a, 0xfa, 0x3d, 0x60, 0x00, 0x60, 0x00, 0x3e, 0x60, 0x31, 0x57, 0x3d, 0x60, 0x00, 0xfd,
        0x5b, 0x3d, 0x60, 0x00, 0xf3,
    ]);
    code
}

fn describe_error(err: &ExitError) -> String {
    match err {
        ExitError::OutOfGas => "out of gas".to_string(),
        ExitError::InvalidJump => "invalid jump destination".to_string(),
        ExitError::StackUnderflow => "stack underflow".to_string(),
        ExitError::StackOverflow => "stack overflow".to_string(),
        ExitError::DesignatedInvalid => "invalid opcode".to_string(),
        ExitError::CreateCollision => "contract address collision".to_string(),
        ExitError::OutOfFund => "insufficient balance for transfer".to_string(),
        ExitError::Other(reason) => reason.to_string(),
        other => format!("{other:?}"),
    }
}

fn log_entry(log: &Log) -> LogEntry {
    LogEntry {
        address: Address::from_slice(log.address.as_bytes()),
        topics: log
            .topics
            .iter()
            .map(|topic| B256::from_slice(topic.as_bytes()))
            .collect(),
        data: Bytes::from(log.data.to_vec()),
    }
}

fn to_h160(address: Address) -> H160 {
    H160::from_slice(address.as_slice())
}

fn to_word(value: U256) -> Word {
    Word::from_big_endian(&value.to_be_bytes::<32>())
}

fn from_word(value: Word) -> U256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    U256::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CallParams;

    fn evm() -> LocalEvm {
        LocalEvm::new(Hardfork::Cancun, BlockEnv::default())
    }

    fn target() -> Address {
        "0x0000000000000000000000000000000000000002".parse().unwrap()
    }

    fn caller() -> Address {
        CallParams::default().caller.parse().unwrap()
    }

    // PUSH1 0x2a PUSH1 0x00 SSTORE STOP
    const STORE_42: [u8; 6] = [0x60, 0x2a, 0x60, 0x00, 0x55, 0x00];

    #[test]
    fn test_sstore_persists_on_success() {
        let evm = evm();
        evm.set_code(target(), Bytes::from_static(&STORE_42));
        let result = evm.execute(&CallParams::default()).unwrap();
        assert!(result.success, "{:?}", result.error);
        assert!(result.gas_used > 21_000);
        assert_eq!(result.gas_used + result.gas_left, 30_000_000);
        let account = evm.account(&target()).unwrap();
        assert_eq!(account.storage.get(&U256::ZERO), Some(&U256::from(0x2a)));
        assert_eq!(evm.account(&caller()).unwrap().nonce, 1);
    }

    #[test]
    fn test_return_data_and_arithmetic() {
        let evm = evm();
        // PUSH1 2 PUSH1 3 MUL PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code = vec![
            0x60, 0x02, 0x60, 0x03, 0x02, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
        ];
        evm.set_code(target(), Bytes::from(code));
        let result = evm.execute(&CallParams::default()).unwrap();
        assert!(result.success);
        assert_eq!(U256::from_be_slice(&result.return_data), U256::from(6));
    }

    #[test]
    fn test_revert_discards_storage() {
        let evm = evm();
        // PUSH1 1 PUSH1 0 SSTORE PUSH1 0 PUSH1 0 REVERT
        let code = vec![0x60, 0x01, 0x60, 0x00, 0x55, 0x60, 0x00, 0x60, 0x00, 0xfd];
        evm.set_code(target(), Bytes::from(code));
        let result = evm.execute(&CallParams::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("execution reverted"));
        assert!(evm.account(&target()).unwrap().storage.is_empty());
    }

    #[test]
    fn test_static_call_rejects_sstore() {
        let evm = evm();
        evm.set_code(target(), Bytes::from_static(&STORE_42));
        let params = CallParams {
            call_type: CallType::StaticCall,
            ..CallParams::default()
        };
        let result = evm.execute(&params).unwrap();
        assert!(!result.success);
        assert!(evm.account(&target()).unwrap().storage.is_empty());
        assert!(evm.account(&STATIC_FORWARDER).is_none());
    }

    #[test]
    fn test_static_call_returns_output() {
        let evm = evm();
        // PUSH1 7 PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let code = vec![0x60, 0x07, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3];
        evm.set_code(target(), Bytes::from(code));
        let params = CallParams {
            call_type: CallType::StaticCall,
            ..CallParams::default()
        };
        let result = evm.execute(&params).unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(U256::from_be_slice(&result.return_data), U256::from(7));
    }

    #[test]
    fn test_delegate_call_writes_caller_storage() {
        let evm = evm();
        evm.set_code(target(), Bytes::from_static(&STORE_42));
        let params = CallParams {
            call_type: CallType::DelegateCall,
            ..CallParams::default()
        };
        let result = evm.execute(&params).unwrap();
        assert!(result.success, "{:?}", result.error);
        let own = evm.account(&caller()).unwrap();
        assert_eq!(own.storage.get(&U256::ZERO), Some(&U256::from(0x2a)));
        assert!(own.code.is_empty());
        assert!(evm.account(&target()).unwrap().storage.is_empty());
    }

    #[test]
    fn test_create_deploys_runtime_code() {
        let evm = evm();
        // PUSH1 0x00 PUSH1 0x00 MSTORE8 PUSH1 0x01 PUSH1 0x00 RETURN
        let params = CallParams {
            call_type: CallType::Create,
            input_data: "0x600060005360016000f3".to_string(),
            ..CallParams::default()
        };
        let result = evm.execute(&params).unwrap();
        assert!(result.success, "{:?}", result.error);
        let expected = caller().create(0);
        assert_eq!(result.deployed_address, Some(expected));
        assert_eq!(result.return_data, Bytes::from(vec![0x00]));
        assert_eq!(evm.account(&expected).unwrap().code, Bytes::from(vec![0x00]));

        // second deployment uses the next nonce
        let again = evm.execute(&params).unwrap();
        assert_eq!(again.deployed_address, Some(caller().create(1)));
    }

    #[test]
    fn test_create2_address_uses_salt() {
        let evm = evm();
        let init = "0x600060005360016000f3";
        let params = CallParams {
            call_type: CallType::Create2,
            input_data: init.to_string(),
            salt: format!("0x{}", "11".repeat(32)),
            ..CallParams::default()
        };
        let result = evm.execute(&params).unwrap();
        assert!(result.success, "{:?}", result.error);
        let init_code = hex::decode(&init[2..]).unwrap();
        let expected = caller().create2(B256::repeat_byte(0x11), keccak256(&init_code));
        assert_eq!(result.deployed_address, Some(expected));
    }

    #[test]
    fn test_push0_gated_by_hardfork() {
        let paris = LocalEvm::new(Hardfork::Paris, BlockEnv::default());
        paris.set_code(target(), Bytes::from_static(&[0x5f, 0x00]));
        assert!(!paris.execute(&CallParams::default()).unwrap().success);

        let shanghai = LocalEvm::new(Hardfork::Shanghai, BlockEnv::default());
        shanghai.set_code(target(), Bytes::from_static(&[0x5f, 0x00]));
        assert!(shanghai.execute(&CallParams::default()).unwrap().success);
    }

    #[test]
    fn test_invalid_jump_halts() {
        let evm = evm();
        // PUSH1 0x05 JUMP
        evm.set_code(target(), Bytes::from_static(&[0x60, 0x05, 0x56]));
        let result = evm.execute(&CallParams::default()).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("invalid jump destination"));
    }

    #[test]
    fn test_log_emitted() {
        let evm = evm();
        // PUSH1 0xaa PUSH1 0 PUSH1 0 LOG1 STOP
        let code = vec![0x60, 0xaa, 0x60, 0x00, 0x60, 0x00, 0xa1, 0x00];
        evm.set_code(target(), Bytes::from(code));
        let result = evm.execute(&CallParams::default()).unwrap();
        assert!(result.success);
        assert_eq!(result.logs.len(), 1);
        assert_eq!(result.logs[0].address, target());
        assert_eq!(result.logs[0].topics[0], B256::with_last_byte(0xaa));
    }

    #[test]
    fn test_value_requires_balance() {
        let evm = evm();
        let params = CallParams {
            value: "1".into(),
            ..CallParams::default()
        };
        assert!(matches!(
            evm.execute(&params),
            Err(EvmError::InsufficientBalance { .. })
        ));

        evm.set_balance(caller(), U256::from(10));
        assert!(evm.execute(&params).unwrap().success);
        assert_eq!(evm.account(&target()).unwrap().balance, U256::from(1));
        assert_eq!(evm.account(&caller()).unwrap().balance, U256::from(9));
    }

    #[test]
    fn test_closed_backend_rejects() {
        let evm = evm();
        evm.close();
        assert!(matches!(
            evm.execute(&CallParams::default()),
            Err(EvmError::Closed)
        ));
    }

    #[test]
    fn test_word_conversion() {
        let value = U256::from(0x1234_5678_9abc_def0u64) << 100;
        assert_eq!(from_word(to_word(value)), value);
        assert_eq!(from_word(Word::from(7u64)), U256::from(7));
    }
}
