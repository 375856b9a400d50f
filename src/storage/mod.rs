//! Credential storage: the single durable slot holding the session token.
//!
//! Backends:
//! - [`MemoryCredentialStore`]: process-local, for tests and throwaway sessions
//! - [`file::FileCredentialStore`]: JSON file on disk (default)
//! - [`kv::RedisCredentialStore`]: Redis key namespaced per client instance
//!
//! The [`CredentialStore`] contract is synchronous and total. Backend errors
//! are logged and absorbed: a failed read is "no token", a failed write
//! leaves whatever was there.

pub mod file;
pub mod kv;

use crate::config::Config;
use crate::models::Token;
use std::sync::{Arc, Mutex};

/// Durable slot holding at most one token.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Token>;

    /// Replace any stored token with `token`.
    fn set(&self, token: Token);

    fn clear(&self);
}

/// Error type for storage backends. Never crosses the [`CredentialStore`] boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// In-memory credential slot.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Token>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<Token>) -> Self {
        MemoryCredentialStore {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Token> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set(&self, token: Token) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    fn clear(&self) {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}

/// Open the backend selected by `config`.
///
/// Redis when `CREDENTIAL_REDIS_URL` is set, otherwise the credential file.
pub fn open_store(config: &Config) -> Result<Arc<dyn CredentialStore>, StoreError> {
    match &config.redis_url {
        Some(url) => {
            let store = kv::RedisCredentialStore::open(url, &config.client_id, &config.credential_key)?;
            tracing::debug!(client_id = %config.client_id, "Using Redis credential store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::debug!(path = %config.credential_path.display(), "Using file credential store");
            Ok(Arc::new(file::FileCredentialStore::new(
                config.credential_path.clone(),
                config.credential_key.clone(),
            )))
        }
    }
}
