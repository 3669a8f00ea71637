use crate::core::error::CredentialError;
use crate::utils::auth::constant_time_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Flat JSON file mapping username to password.
///
/// Passwords are stored in cleartext. Every registration rewrites the
/// whole file; the mutex only serializes writers inside this process, two
/// processes sharing the file still race and the last rewrite wins.
pub struct CredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every credential record, creating an empty file first if none exists
    pub fn load_all(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        let _guard = self.guard();
        self.read()
    }

    /// Insert a new user. Returns false, leaving the file untouched, when
    /// the username is already taken.
    pub fn register(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let _guard = self.guard();

        let mut users = self.read()?;
        if users.contains_key(username) {
            return Ok(false);
        }

        users.insert(username.to_string(), password.to_string());
        self.write(&users)?;

        Ok(true)
    }

    /// True iff the user exists and the password matches exactly
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        let _guard = self.guard();

        let users = self.read()?;
        Ok(users
            .get(username)
            .is_some_and(|stored| constant_time_eq(password, stored)))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), a panicked writer leaves nothing to repair
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read(&self) -> Result<BTreeMap<String, String>, CredentialError> {
        if !self.path.exists() {
            self.write(&BTreeMap::new())?;
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, users: &BTreeMap<String, String>) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec(users)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
