//! Token persistence module
//!
//! This module stores the bearer token of a session in the system's
//! standard cache directory, so that consecutive command line invocations
//! can reuse it instead of logging in again every time.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting session tokens
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// The platform offers no cache directory to keep tokens in
    #[error("No cache directory available for storing session tokens")]
    NoCacheDirectory,

    #[error("Cannot create token directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot read stored token {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot save token to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot discard stored token {path}: {source}")]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A token file exists but does not hold a stored token
    #[error("Stored token {path} is corrupted: {source}")]
    Corrupted {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// A persisted session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    language: String,
}

/// File based storage of session tokens
///
/// Tokens are stored as small JSON files, one per API key and user name,
/// so that switching accounts never picks up a foreign token.
#[derive(Debug)]
pub struct TokenStore {
    /// The directory where tokens are stored
    store_dir: PathBuf,
}

impl TokenStore {
    /// Opens or creates the token store in the system cache directory
    ///
    /// Platform specific locations:
    /// - Linux: ~/.cache/tvdb_client/tokens/
    /// - macOS: ~/Library/Caches/de.westhoffswelt.tvdb_client/tokens/
    /// - Windows: %LOCALAPPDATA%\westhoffswelt\tvdb_client\cache\tokens\
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be determined or created.
    pub fn open() -> Result<Self, TokenStoreError> {
        let proj_dirs = directories::ProjectDirs::from("de", "westhoffswelt", "tvdb_client")
            .ok_or(TokenStoreError::NoCacheDirectory)?;

        Self::open_in(proj_dirs.cache_dir().join("tokens"))
    }

    /// Opens or creates the token store in the given directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_in(store_dir: impl Into<PathBuf>) -> Result<Self, TokenStoreError> {
        let store_dir = store_dir.into();

        fs::create_dir_all(&store_dir).map_err(|e| TokenStoreError::CreateDirectory {
            path: store_dir.clone(),
            source: e,
        })?;

        Ok(Self { store_dir })
    }

    /// Loads the token and language stored for the given account
    ///
    /// # Returns
    ///
    /// `None` if nothing has been stored for this account yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored file exists but cannot be read.
    pub fn load(
        &self,
        api_key: &str,
        user_name: Option<&str>,
    ) -> Result<Option<(String, String)>, TokenStoreError> {
        let file_path = self.token_path(api_key, user_name);

        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path).map_err(|e| TokenStoreError::Read {
            path: file_path.clone(),
            source: e,
        })?;

        let stored: StoredToken = serde_json::from_str(&content).map_err(|e| {
            TokenStoreError::Corrupted {
                path: file_path,
                source: e,
            }
        })?;

        Ok(Some((stored.token, stored.language)))
    }

    /// Stores the token and language for the given account
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written.
    pub fn store(
        &self,
        api_key: &str,
        user_name: Option<&str>,
        token: &str,
        language: &str,
    ) -> Result<(), TokenStoreError> {
        let file_path = self.token_path(api_key, user_name);

        let stored = StoredToken {
            token: token.to_string(),
            language: language.to_string(),
        };

        // Encoding two strings only fails on I/O
        serde_json::to_vec_pretty(&stored)
            .map_err(std::io::Error::from)
            .and_then(|content| fs::write(&file_path, content))
            .map_err(|e| TokenStoreError::Write {
                path: file_path,
                source: e,
            })?;

        Ok(())
    }

    /// Removes the token stored for the given account, if any
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn remove(&self, api_key: &str, user_name: Option<&str>) -> Result<(), TokenStoreError> {
        let file_path = self.token_path(api_key, user_name);

        if file_path.exists() {
            fs::remove_file(&file_path).map_err(|e| TokenStoreError::Remove {
                path: file_path,
                source: e,
            })?;
        }

        Ok(())
    }

    /// Returns the path to the store directory
    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    fn token_path(&self, api_key: &str, user_name: Option<&str>) -> PathBuf {
        let identifier = match user_name {
            Some(user) => format!("{}_{}", fingerprint(api_key), user),
            None => fingerprint(api_key),
        };
        self.store_dir
            .join(format!("{}.json", sanitize_name(&identifier)))
    }
}

/// Short, non-reversible identifier of an API key for use in file names
fn fingerprint(api_key: &str) -> String {
    // FNV-1a, stable across runs and platforms
    let hash = api_key.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    });
    format!("{:016x}", hash)
}

/// Sanitizes a name for use in file paths
///
/// Converts to lowercase and replaces all characters that are not
/// a-z, 0-9, or hyphen with underscores.
fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
