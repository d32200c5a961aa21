//! Durable storage for the credential pair.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{error::StorageError, session::Credentials};

/// Where the credential pair survives restarts.
///
/// Both tokens are written and cleared together; an absent pair means "no
/// session".
pub trait CredentialStorage: Send + Sync {
    fn load(&self) -> Result<Credentials, StorageError>;
    fn save(&self, credentials: &Credentials) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPair {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

impl From<&Credentials> for StoredPair {
    fn from(credentials: &Credentials) -> Self {
        Self {
            access_token: credentials.access_token().map(str::to_string),
            refresh_token: credentials.refresh_token().map(str::to_string),
        }
    }
}

impl From<StoredPair> for Credentials {
    fn from(stored: StoredPair) -> Self {
        Credentials::from_parts(stored.access_token, stored.refresh_token)
    }
}

/// JSON file holding the `accessToken` and `refreshToken` keys.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Credentials, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Credentials::empty());
            }
            Err(err) => return Err(err.into()),
        };
        let stored: StoredPair = serde_json::from_str(&content)?;
        Ok(stored.into())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(&StoredPair::from(credentials))?;

        // Write the pair in one rename so a crash never leaves half of it.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, payload)?;
        match fs::rename(&tmp, &self.path) {
            Ok(()) => Ok(()),
            Err(_) => {
                fs::copy(&tmp, &self.path)?;
                let _ = fs::remove_file(&tmp);
                Ok(())
            }
        }
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local storage, for tests and sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<Credentials>,
}

impl MemoryStorage {
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: Mutex::new(credentials),
        }
    }
}

impl CredentialStorage for MemoryStorage {
    fn load(&self) -> Result<Credentials, StorageError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, credentials: &Credentials) -> Result<(), StorageError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = credentials.clone();
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Credentials::empty();
        Ok(())
    }
}
