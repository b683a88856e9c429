use std::fs::{remove_file, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{from_str as deserialize_accounts, to_string as serialize_accounts};

use crate::auth::accounts::AccountPersistence;
use crate::auth::error::{AuthError, AuthResult};
use crate::auth::model::UserProfile;

/// Keeps the account list in a JSON file, for native hosts and tooling.
#[derive(Debug, Clone)]
pub struct FileAccountPersistence {
    path: Arc<PathBuf>,
}

impl FileAccountPersistence {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccountPersistence for FileAccountPersistence {
    fn load(&self) -> AuthResult<Vec<UserProfile>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut file = File::open(&*self.path).map_err(|err| {
            AuthError::Persistence(format!("Failed to open account list file: {err}"))
        })?;
        let mut buffer = String::new();
        file.read_to_string(&mut buffer).map_err(|err| {
            AuthError::Persistence(format!("Failed to read account list file: {err}"))
        })?;

        if buffer.trim().is_empty() {
            return Ok(Vec::new());
        }

        deserialize_accounts(&buffer).map_err(|err| {
            AuthError::Persistence(format!("Failed to parse account list payload: {err}"))
        })
    }

    fn save(&self, accounts: &[UserProfile]) -> AuthResult<()> {
        if accounts.is_empty() {
            if self.path.exists() {
                remove_file(&*self.path).map_err(|err| {
                    AuthError::Persistence(format!("Failed to remove account list file: {err}"))
                })?;
            }
            return Ok(());
        }

        let serialized = serialize_accounts(accounts).map_err(|err| {
            AuthError::Persistence(format!("Failed to serialize account list: {err}"))
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| {
                AuthError::Persistence(format!("Failed to create account list directory: {err}"))
            })?;
        }
        let mut file = File::create(&*self.path).map_err(|err| {
            AuthError::Persistence(format!("Failed to create account list file: {err}"))
        })?;
        file.write_all(serialized.as_bytes()).map_err(|err| {
            AuthError::Persistence(format!("Failed to write account list file: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::accounts::AccountStore;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("aiva-accounts-test-{}-{}.json", name, std::process::id()));
        path
    }

    #[test]
    fn accounts_survive_a_new_store() {
        let path = temp_path("reload");
        let persistence = Arc::new(FileAccountPersistence::new(&path));
        AccountStore::new(persistence.clone())
            .remember(&UserProfile::with_email("ada@example.com"))
            .unwrap();

        let reloaded = AccountStore::new(Arc::new(FileAccountPersistence::new(&path)));
        let accounts = reloaded.accounts().unwrap();
        assert_eq!(accounts, vec![UserProfile::with_email("ada@example.com")]);

        reloaded.clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_a_persistence_error() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "{not json").unwrap();
        let err = FileAccountPersistence::new(&path).load().unwrap_err();
        assert!(matches!(err, AuthError::Persistence(_)));
        let _ = remove_file(path);
    }
}
