//! # Credential Store
//!
//! Where the signed-in session survives a restart.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key            value                                                  │
//! │  ─────────────  ─────────────────────────────────────────────────────  │
//! │  auth_token     opaque bearer token                                    │
//! │  user_profile   {"id":"c-7","name":"Ravi","phoneNumber":"98765..."}    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The token and the profile are written together and removed together.
//! A store holding only one of them is treated as signed out by the
//! session manager. An empty value reads back as absent; the session
//! manager blanks both keys when it cannot remove them.
//!
//! Two implementations:
//! - [`SqliteCredentialStore`] for the device
//! - [`MemoryCredentialStore`] for tests, with switchable failures

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::credentials::CredentialRepository;

/// Key for the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Key for the courier profile JSON.
pub const PROFILE_KEY: &str = "user_profile";

// =============================================================================
// CredentialStore Trait
// =============================================================================

/// Durable key/value storage for the session.
///
/// Profiles are passed as raw JSON so this crate stays ignorant of the
/// profile schema.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The persisted bearer token, if any. Empty counts as none.
    async fn load_token(&self) -> DbResult<Option<String>>;

    /// The persisted profile JSON, if any. Empty counts as none.
    async fn load_profile(&self) -> DbResult<Option<String>>;

    /// Persists a freshly created session atomically.
    async fn save_session(&self, token: &str, profile_json: &str) -> DbResult<()>;

    /// Replaces the persisted profile, leaving the token alone.
    async fn save_profile(&self, profile_json: &str) -> DbResult<()>;

    /// Removes both keys.
    async fn clear(&self) -> DbResult<()>;
}

/// Drops blanked values.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// =============================================================================
// SQLite Implementation
// =============================================================================

/// Credential store backed by the `credentials` table.
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    repo: CredentialRepository,
}

impl SqliteCredentialStore {
    pub fn new(db: &Database) -> Self {
        SqliteCredentialStore {
            repo: db.credentials(),
        }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load_token(&self) -> DbResult<Option<String>> {
        self.repo.get(TOKEN_KEY).await.map(present)
    }

    async fn load_profile(&self) -> DbResult<Option<String>> {
        self.repo.get(PROFILE_KEY).await.map(present)
    }

    async fn save_session(&self, token: &str, profile_json: &str) -> DbResult<()> {
        self.repo
            .put_many(&[(TOKEN_KEY, token), (PROFILE_KEY, profile_json)])
            .await
    }

    async fn save_profile(&self, profile_json: &str) -> DbResult<()> {
        self.repo.put(PROFILE_KEY, profile_json).await
    }

    async fn clear(&self) -> DbResult<()> {
        let removed = self.repo.remove_many(&[TOKEN_KEY, PROFILE_KEY]).await?;
        debug!(removed, "Credential store cleared");
        Ok(())
    }
}

// =============================================================================
// In-Memory Implementation
// =============================================================================

/// Credential store held in process memory.
///
/// Each operation class can be made to fail, to exercise the error paths
/// of the session manager.
///
/// ## Example
/// ```rust,ignore
/// let store = MemoryCredentialStore::with_session("T1", profile_json);
/// store.fail_removals(true);
/// assert!(store.clear().await.is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_removals: AtomicBool,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a session.
    pub fn with_session(token: &str, profile_json: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(TOKEN_KEY.to_string(), token.to_string());
            entries.insert(PROFILE_KEY.to_string(), profile_json.to_string());
        }
        store
    }

    /// Makes `load_*` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `save_*` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `clear` fail.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// Raw read that bypasses fault injection.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Raw write that bypasses fault injection.
    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn check(flag: &AtomicBool, operation: &str) -> DbResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable(format!("{} failed", operation)));
        }
        Ok(())
    }

    fn entries(&self) -> DbResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| DbError::Internal("credential map poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load_token(&self) -> DbResult<Option<String>> {
        Self::check(&self.fail_reads, "read")?;
        Ok(present(self.entries()?.get(TOKEN_KEY).cloned()))
    }

    async fn load_profile(&self) -> DbResult<Option<String>> {
        Self::check(&self.fail_reads, "read")?;
        Ok(present(self.entries()?.get(PROFILE_KEY).cloned()))
    }

    async fn save_session(&self, token: &str, profile_json: &str) -> DbResult<()> {
        Self::check(&self.fail_writes, "write")?;
        let mut entries = self.entries()?;
        entries.insert(TOKEN_KEY.to_string(), token.to_string());
        entries.insert(PROFILE_KEY.to_string(), profile_json.to_string());
        Ok(())
    }

    async fn save_profile(&self, profile_json: &str) -> DbResult<()> {
        Self::check(&self.fail_writes, "write")?;
        self.entries()?
            .insert(PROFILE_KEY.to_string(), profile_json.to_string());
        Ok(())
    }

    async fn clear(&self) -> DbResult<()> {
        Self::check(&self.fail_removals, "remove")?;
        let mut entries = self.entries()?;
        entries.remove(TOKEN_KEY);
        entries.remove(PROFILE_KEY);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
