//! Locally remembered accounts.
//!
//! Every successful popup sign-in is recorded so the login page can offer the
//! most recently used accounts. The list is keyed by email, newest first, and
//! capped at [`DEFAULT_ACCOUNT_LIMIT`] entries.

use std::sync::{Arc, Mutex};

use crate::auth::error::AuthResult;
use crate::auth::model::UserProfile;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
mod file;

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub use file::FileAccountPersistence;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
mod web;

#[cfg(all(target_arch = "wasm32", feature = "wasm-web"))]
pub use web::WebStorageAccountPersistence;

/// Storage key used by the browser implementation.
pub const ACCOUNTS_STORAGE_KEY: &str = "aiva_accounts";
pub const DEFAULT_ACCOUNT_LIMIT: usize = 5;

/// Storage backend for the serialized account list.
pub trait AccountPersistence: Send + Sync {
    fn load(&self) -> AuthResult<Vec<UserProfile>>;
    fn save(&self, accounts: &[UserProfile]) -> AuthResult<()>;
}

#[derive(Default)]
pub struct InMemoryAccountPersistence {
    accounts: Mutex<Vec<UserProfile>>,
}

impl AccountPersistence for InMemoryAccountPersistence {
    fn load(&self) -> AuthResult<Vec<UserProfile>> {
        Ok(self
            .accounts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone())
    }

    fn save(&self, accounts: &[UserProfile]) -> AuthResult<()> {
        *self
            .accounts
            .lock()
            .unwrap_or_else(|poison| poison.into_inner()) = accounts.to_vec();
        Ok(())
    }
}

#[derive(Clone)]
pub struct AccountStore {
    persistence: Arc<dyn AccountPersistence>,
    limit: usize,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl AccountStore {
    pub fn new(persistence: Arc<dyn AccountPersistence>) -> Self {
        Self {
            persistence,
            limit: DEFAULT_ACCOUNT_LIMIT,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryAccountPersistence::default()))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records `profile` as the most recent account.
    ///
    /// Returns `false` when nothing changed: the profile has no email or an
    /// account with the same email is already remembered.
    pub fn remember(&self, profile: &UserProfile) -> AuthResult<bool> {
        let Some(email) = profile.email.as_deref().filter(|email| !email.is_empty()) else {
            return Ok(false);
        };
        let mut accounts = self.load_accounts()?;
        if accounts.iter().any(|account| same_email(account, email)) {
            return Ok(false);
        }
        accounts.insert(0, profile.clone());
        accounts.truncate(self.limit);
        self.persistence.save(&accounts)?;
        Ok(true)
    }

    pub fn accounts(&self) -> AuthResult<Vec<UserProfile>> {
        self.load_accounts()
    }

    pub fn find_by_email(&self, email: &str) -> AuthResult<Option<UserProfile>> {
        Ok(self
            .load_accounts()?
            .into_iter()
            .find(|account| same_email(account, email)))
    }

    /// Removes the account with `email`; returns whether one was removed.
    pub fn forget(&self, email: &str) -> AuthResult<bool> {
        let mut accounts = self.load_accounts()?;
        let before = accounts.len();
        accounts.retain(|account| !same_email(account, email));
        if accounts.len() == before {
            return Ok(false);
        }
        self.persistence.save(&accounts)?;
        Ok(true)
    }

    pub fn clear(&self) -> AuthResult<()> {
        self.persistence.save(&[])
    }

    fn load_accounts(&self) -> AuthResult<Vec<UserProfile>> {
        let mut accounts = self.persistence.load()?;
        accounts.truncate(self.limit);
        Ok(accounts)
    }
}

fn same_email(account: &UserProfile, email: &str) -> bool {
    account
        .email
        .as_deref()
        .is_some_and(|existing| existing.eq_ignore_ascii_case(email))
}
