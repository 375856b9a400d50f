//! Redis-backed credential store.
//!
//! Redis key pattern:
//! - `sweetspot:{client_id}:{credential_key}`: the session token (STRING)
//!
//! Each client instance uses its own `client_id`, so isolated clients never
//! share a slot even when they share a Redis server.

use super::{CredentialStore, StoreError};
use crate::models::Token;
use redis::Commands;
use zeroize::Zeroizing;

pub struct RedisCredentialStore {
    client: redis::Client,
    key: String,
}

/// Build the Redis key for a client's credential slot.
pub fn credential_key(client_id: &str, key: &str) -> String {
    format!("sweetspot:{}:{}", client_id, key)
}

impl RedisCredentialStore {
    /// Parse `redis_url` and bind the store to one client's slot.
    ///
    /// No connection is made here; each operation opens its own.
    pub fn open(redis_url: &str, client_id: &str, key: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)?;
        Ok(RedisCredentialStore {
            client,
            key: credential_key(client_id, key),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn connection(&self) -> Result<redis::Connection, StoreError> {
        Ok(self.client.get_connection()?)
    }
}

/// Read the token under `key`. Empty values count as absent.
pub fn read_token<C>(con: &mut C, key: &str) -> Result<Option<Token>, redis::RedisError>
where
    C: Commands,
{
    let value: Option<String> = con.get(key)?;
    Ok(value
        .map(Zeroizing::new)
        .filter(|v| !v.is_empty())
        .map(|v| Token::new(v.as_str())))
}

/// Replace the token under `key` (single SET, so readers never see a partial value).
pub fn write_token<C>(con: &mut C, key: &str, token: &Token) -> Result<(), redis::RedisError>
where
    C: Commands,
{
    con.set::<_, _, ()>(key, token.as_str())
}

/// Delete the token. Returns true if a token was removed.
pub fn delete_token<C>(con: &mut C, key: &str) -> Result<bool, redis::RedisError>
where
    C: Commands,
{
    let deleted: i32 = con.del(key)?;
    Ok(deleted > 0)
}

impl CredentialStore for RedisCredentialStore {
    fn get(&self) -> Option<Token> {
        let result = self
            .connection()
            .and_then(|mut con| Ok(read_token(&mut con, &self.key)?));
        match result {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read credential from Redis");
                None
            }
        }
    }

    fn set(&self, token: Token) {
        let result = self
            .connection()
            .and_then(|mut con| Ok(write_token(&mut con, &self.key, &token)?));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write credential to Redis");
        }
    }

    fn clear(&self) {
        let result = self
            .connection()
            .and_then(|mut con| Ok(delete_token(&mut con, &self.key)?));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to clear credential in Redis");
        }
    }
}
