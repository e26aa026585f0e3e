//! # In-Memory Account Store
//!
//! The only `AccountStore` adapter this simulator ships: a plain
//! `HashMap` with no interior synchronization. The simulator is
//! single-threaded, so there is no concurrent access to defend
//! against.

use crate::domain::account::Account;
use crate::domain::value_objects::AccountId;
use crate::errors::AccountError;
use crate::ports::AccountStore;
use std::collections::HashMap;
use std::path::PathBuf;

/// In-process account storage.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: HashMap<AccountId, Account>,
}

impl InMemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for InMemoryAccountStore {
    fn new_account(
        &mut self,
        id: AccountId,
        contract_image: Option<PathBuf>,
    ) -> Result<(), AccountError> {
        let account = Account::new(id.clone(), contract_image)?;
        self.accounts.insert(id, account);
        Ok(())
    }

    fn get_or_create(&mut self, id: &AccountId) -> &mut Account {
        self.accounts
            .entry(id.clone())
            .or_insert_with(|| Account::new(id.clone(), None).expect("plain accounts never fail"))
    }

    fn get(&self, id: &AccountId) -> Result<&Account, AccountError> {
        self.accounts
            .get(id)
            .ok_or_else(|| AccountError::UnknownAccount(id.clone()))
    }

    fn get_mut(&mut self, id: &AccountId) -> Result<&mut Account, AccountError> {
        self.accounts
            .get_mut(id)
            .ok_or_else(|| AccountError::UnknownAccount(id.clone()))
    }

    fn reset_all(&mut self) {
        for account in self.accounts.values_mut() {
            account.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_account_lookup_fails() {
        let store = InMemoryAccountStore::new();
        let err = store.get(&AccountId::new("ghost")).unwrap_err();
        assert!(matches!(err, AccountError::UnknownAccount(_)));
    }

    #[test]
    fn test_get_or_create_materializes_defaults() {
        let mut store = InMemoryAccountStore::new();
        let account = store.get_or_create(&AccountId::new("alice"));
        assert_eq!(account.balance, crate::config::DEFAULT_BALANCE);
        // Second call returns the same account, not a fresh one.
        account.balance = 5;
        assert_eq!(store.get(&AccountId::new("alice")).unwrap().balance, 5);
    }

    #[test]
    fn test_missing_contract_image_rejects_new_account() {
        let mut store = InMemoryAccountStore::new();
        let err = store
            .new_account(
                AccountId::new("alice"),
                Some(PathBuf::from("/no/such/contract.wasm")),
            )
            .unwrap_err();
        assert!(matches!(err, AccountError::MissingContract { .. }));
        assert!(store.get(&AccountId::new("alice")).is_err());
    }

    #[test]
    fn test_reset_all_preserves_accounts_but_clears_state() {
        let mut store = InMemoryAccountStore::new();
        let account = store.get_or_create(&AccountId::new("alice"));
        account.balance = 1;
        account.locked_balance = 2;
        account.storage_usage = 3;

        store.reset_all();

        let account = store.get(&AccountId::new("alice")).unwrap();
        assert_eq!(account.balance, crate::config::DEFAULT_BALANCE);
        assert_eq!(account.locked_balance, 0);
        assert_eq!(account.storage_usage, crate::config::DEFAULT_STORAGE_USAGE);
    }
}
