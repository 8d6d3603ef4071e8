//! Deterministic test accounts derived from a random seed

use std::collections::BTreeMap;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use parking_lot::RwLock;
use rand::RngCore;
use serde::Serialize;

pub const DEFAULT_ACCOUNT_COUNT: usize = 10;
pub const DEFAULT_BALANCE_ETH: u64 = 100;

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// 1-based position. Zero for addresses the manager does not own.
    pub index: usize,
    pub address: Address,
    pub private_key: B256,
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
}

impl Account {
    fn empty(address: Address) -> Self {
        Self {
            index: 0,
            address,
            private_key: B256::ZERO,
            balance: U256::ZERO,
            nonce: 0,
            code: Bytes::new(),
        }
    }

    pub fn is_contract(&self) -> bool {
        !self.code.is_empty()
    }
}

#[derive(Debug)]
struct AccountState {
    seed: [u8; 32],
    accounts: BTreeMap<Address, Account>,
    generation: u64,
}

#[derive(Debug)]
pub struct AccountManager {
    count: usize,
    initial_balance: U256,
    state: RwLock<AccountState>,
}

impl Default for AccountManager {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT_COUNT, DEFAULT_BALANCE_ETH)
    }
}

impl AccountManager {
    pub fn new(count: usize, initial_balance_eth: u64) -> Self {
        Self::with_seed(random_seed(), count, initial_balance_eth)
    }

    pub fn with_seed(seed: [u8; 32], count: usize, initial_balance_eth: u64) -> Self {
        let initial_balance = U256::from(initial_balance_eth) * U256::from(WEI_PER_ETH);
        Self {
            count,
            initial_balance,
            state: RwLock::new(AccountState {
                seed,
                accounts: derive_accounts(&seed, count, initial_balance),
                generation: 0,
            }),
        }
    }

    /// Known account, or a synthetic empty one for any other address.
    pub fn get_account(&self, address: &Address) -> Account {
        self.state
            .read()
            .accounts
            .get(address)
            .cloned()
            .unwrap_or_else(|| Account::empty(*address))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.state.read().accounts.contains_key(address)
    }

    /// Sorted by index.
    pub fn get_all_accounts(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.state.read().accounts.values().cloned().collect();
        accounts.sort_by_key(|account| (account.index == 0, account.index));
        accounts
    }

    pub fn get_seed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.state.read().seed))
    }

    pub fn get_account_count(&self) -> usize {
        self.state
            .read()
            .accounts
            .values()
            .filter(|account| account.index > 0)
            .count()
    }

    /// Attach deployed code, creating an entry for addresses not yet tracked.
    pub fn set_code(&self, address: Address, code: Bytes) {
        let mut state = self.state.write();
        state
            .accounts
            .entry(address)
            .or_insert_with(|| Account::empty(address))
            .code = code;
    }

    /// Forget deployed contracts: untracked entries go and owned accounts lose their code.
    pub fn clear_contracts(&self) {
        let mut state = self.state.write();
        state.accounts.retain(|_, account| account.index > 0);
        for account in state.accounts.values_mut() {
            account.code = Bytes::new();
        }
    }

    /// Balances seeded into a fresh backend.
    pub fn genesis_alloc(&self) -> Vec<(Address, U256)> {
        self.state
            .read()
            .accounts
            .values()
            .filter(|account| account.index > 0)
            .map(|account| (account.address, account.balance))
            .collect()
    }

    /// Replace the seed and derive a fresh account set.
    pub fn regenerate(&self) {
        let seed = random_seed();
        let mut state = self.state.write();
        state.seed = seed;
        state.accounts = derive_accounts(&seed, self.count, self.initial_balance);
        state.generation += 1;
        tracing::info!(generation = state.generation, "accounts regenerated");
    }

    /// Number of completed regenerations.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }
}

fn random_seed() -> [u8; 32] {
    let mut seed = [0u8; 32];
    rand::rng().fill_bytes(&mut seed);
    seed
}

fn derive_accounts(seed: &[u8; 32], count: usize, balance: U256) -> BTreeMap<Address, Account> {
    (1..=count)
        .map(|index| {
            let private_key = derive_private_key(seed, index);
            let address = address_from_key(&private_key);
            (
                address,
                Account {
                    index,
                    address,
                    private_key,
                    balance,
                    nonce: 0,
                    code: Bytes::new(),
                },
            )
        })
        .collect()
}

pub fn derive_private_key(seed: &[u8; 32], index: usize) -> B256 {
    let mut material = seed.to_vec();
    material.extend_from_slice(index.to_string().as_bytes());
    keccak256(material)
}

pub fn address_from_key(private_key: &B256) -> Address {
    Address::from_slice(&keccak256(private_key)[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = AccountManager::with_seed([7u8; 32], 3, 100);
        let b = AccountManager::with_seed([7u8; 32], 3, 100);
        assert_eq!(a.get_all_accounts(), b.get_all_accounts());
        let accounts = a.get_all_accounts();
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0].index, 1);
        assert_eq!(accounts[2].index, 3);
        assert_eq!(
            accounts[0].balance,
            U256::from(100u64) * U256::from(WEI_PER_ETH)
        );
        assert_eq!(accounts[0].address, address_from_key(&accounts[0].private_key));
    }

    #[test]
    fn test_unknown_address_is_synthetic_empty() {
        let manager = AccountManager::with_seed([1u8; 32], 2, 1);
        let account = manager.get_account(&Address::repeat_byte(0xaa));
        assert_eq!(account.index, 0);
        assert_eq!(account.balance, U256::ZERO);
        assert!(!account.is_contract());
    }

    #[test]
    fn test_set_code_does_not_change_count() {
        let manager = AccountManager::with_seed([1u8; 32], 2, 1);
        let contract = Address::repeat_byte(0x42);
        manager.set_code(contract, Bytes::from_static(&[0x00]));
        assert!(manager.get_account(&contract).is_contract());
        assert_eq!(manager.get_account_count(), 2);
        assert_eq!(manager.get_all_accounts().last().map(|a| a.address), Some(contract));
    }

    #[test]
    fn test_clear_contracts_keeps_owned_accounts() {
        let manager = AccountManager::with_seed([1u8; 32], 2, 1);
        let owned = manager.get_all_accounts()[0].address;
        let contract = Address::repeat_byte(0x42);
        manager.set_code(contract, Bytes::from_static(&[0x00]));
        manager.set_code(owned, Bytes::from_static(&[0x00]));

        manager.clear_contracts();

        assert!(!manager.contains(&contract));
        assert!(!manager.get_account(&owned).is_contract());
        assert_eq!(manager.get_all_accounts().len(), 2);
    }

    #[test]
    fn test_regenerate_changes_seed() {
        let manager = AccountManager::with_seed([0u8; 32], 2, 1);
        let before = manager.get_seed_hex();
        manager.regenerate();
        assert_ne!(manager.get_seed_hex(), before);
        assert_eq!(manager.generation(), 1);
        assert_eq!(manager.get_account_count(), 2);
        assert_eq!(before.len(), 66);
    }
}
