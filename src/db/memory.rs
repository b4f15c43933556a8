//! In-memory account store.

use super::{Account, AccountStore, DbError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Process-local [`AccountStore`].
///
/// [`set_failing`](Self::set_failing) makes every operation return
/// [`DbError::Unavailable`] until switched back, and
/// [`calls`](Self::calls) counts operations so callers can assert that a
/// code path never reached storage.
#[derive(Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<String, Account>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure injection.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of store operations attempted so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of stored accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn enter(&self) -> Result<(), DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn fetch_account(&self, username: &str) -> Result<Option<Account>, DbError> {
        self.enter()?;
        Ok(self.accounts.read().get(username).cloned())
    }

    async fn upsert_account(&self, account: &Account) -> Result<(), DbError> {
        self.enter()?;
        self.accounts
            .write()
            .insert(account.username.clone(), account.clone());
        Ok(())
    }

    async fn delete_account(&self, username: &str) -> Result<(), DbError> {
        self.enter()?;
        self.accounts.write().remove(username);
        Ok(())
    }
}
