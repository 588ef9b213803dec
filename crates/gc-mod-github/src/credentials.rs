//! Persisted GitHub access token.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretBox};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("corrupt credential file {path}: {source}")]
    Corrupt { path: PathBuf, source: serde_json::Error },
}

#[derive(Serialize, Deserialize)]
struct StoredCredential {
    github_access_token: String,
}

pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(data_dir: &Path) -> Self {
        Self { path: data_dir.join(CREDENTIALS_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored token, or `None` when the user never logged in.
    pub fn load(&self) -> Result<Option<Arc<SecretBox<String>>>, CredentialError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CredentialError::Io { path: self.path.clone(), source }),
        };
        let stored: StoredCredential =
            serde_json::from_str(&raw).map_err(|source| CredentialError::Corrupt { path: self.path.clone(), source })?;
        if stored.github_access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(SecretBox::new(Box::new(stored.github_access_token)))))
    }

    pub fn save(&self, token: &SecretBox<String>) -> Result<(), CredentialError> {
        let io_err = |source: std::io::Error| CredentialError::Io { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let stored = StoredCredential { github_access_token: token.expose_secret().clone() };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|source| CredentialError::Corrupt { path: self.path.clone(), source })?;

        let mut options = fs::OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        Ok(())
    }
}
