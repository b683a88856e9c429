use std::sync::Arc;

use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

use crate::auth::accounts::{AccountPersistence, ACCOUNTS_STORAGE_KEY};
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::UserProfile;

/// Keeps the account list in `localStorage` as a JSON array.
#[derive(Debug, Clone)]
pub struct WebStorageAccountPersistence {
    key: Arc<String>,
}

impl Default for WebStorageAccountPersistence {
    fn default() -> Self {
        Self::with_key(ACCOUNTS_STORAGE_KEY)
    }
}

impl WebStorageAccountPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Arc::new(key.into()),
        }
    }

    fn window() -> Result<Window, AuthError> {
        web_sys::window().ok_or_else(|| {
            AuthError::Persistence("window object is not available in this environment".into())
        })
    }

    fn storage() -> Result<Storage, AuthError> {
        Self::window()?
            .local_storage()
            .map_err(map_js_error)?
            .ok_or_else(|| AuthError::Persistence("localStorage is unavailable".into()))
    }
}

impl AccountPersistence for WebStorageAccountPersistence {
    fn load(&self) -> AuthResult<Vec<UserProfile>> {
        let value = Self::storage()?
            .get_item(self.key.as_ref())
            .map_err(map_js_error)?;
        // An unreadable entry is treated as no accounts, like a fresh browser.
        Ok(value
            .filter(|text| !text.is_empty())
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default())
    }

    fn save(&self, accounts: &[UserProfile]) -> AuthResult<()> {
        let storage = Self::storage()?;
        if accounts.is_empty() {
            return storage
                .remove_item(self.key.as_ref())
                .map_err(map_js_error);
        }
        let serialized = serde_json::to_string(accounts).map_err(|err| {
            AuthError::Persistence(format!("Failed to serialize account list: {err}"))
        })?;
        storage
            .set_item(self.key.as_ref(), &serialized)
            .map_err(map_js_error)
    }
}

fn map_js_error(err: JsValue) -> AuthError {
    AuthError::Persistence(format!(
        "Web storage error: {}",
        crate::platform::browser::stringify_js_error(&err)
    ))
}
