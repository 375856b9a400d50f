//! File-backed credential store.
//!
//! File structure: a JSON object, `{ "<credential_key>": "<token>" }`.
//! Keys other than the credential key are preserved on write.

use super::{CredentialStore, StoreError};
use crate::models::Token;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

pub struct FileCredentialStore {
    path: PathBuf,
    key: String,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf, key: String) -> Self {
        FileCredentialStore { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Option<Map<String, Value>>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => {
                let data = Zeroizing::new(data);
                let entries: Map<String, Value> = serde_json::from_str(&data)?;
                Ok(Some(entries))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn read_token(&self) -> Result<Option<Token>, StoreError> {
        let Some(entries) = self.read_entries()? else {
            return Ok(None);
        };
        Ok(entries
            .get(&self.key)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(Token::new))
    }

    fn write_token(&self, token: &Token) -> Result<(), StoreError> {
        // A corrupt file is replaced rather than merged
        let mut entries = self.read_entries().unwrap_or_default().unwrap_or_default();
        entries.insert(self.key.clone(), Value::String(token.as_str().to_string()));
        self.write_entries(&entries)
    }

    fn remove_token(&self) -> Result<(), StoreError> {
        let mut entries = match self.read_entries() {
            Ok(Some(entries)) => entries,
            Ok(None) => return Ok(()),
            // Unreadable content can't hold a usable token; drop the file
            Err(StoreError::Json(_)) => Map::new(),
            Err(e) => return Err(e),
        };
        entries.remove(&self.key);

        if entries.is_empty() {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StoreError::Io(e)),
            }
        } else {
            self.write_entries(&entries)
        }
    }

    /// Atomic write: temp file, fsync, rename.
    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = Zeroizing::new(serde_json::to_string(entries)?);
        let temp_path = self.path.with_extension("tmp");

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Token> {
        match self.read_token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read credential file");
                None
            }
        }
    }

    fn set(&self, token: Token) {
        if let Err(e) = self.write_token(&token) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write credential file");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.remove_token() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to clear credential file");
        }
    }
}
