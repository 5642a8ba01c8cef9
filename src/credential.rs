//! Persisted bridge credentials.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// The token a bridge issued to this client during pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCredential {
    #[serde(alias = "bridge_ip")]
    pub bridge_address: String,
    #[serde(alias = "username")]
    pub auth_token: String,
}

impl DeviceCredential {
    pub fn new(bridge_address: &str, auth_token: &str) -> Self {
        DeviceCredential {
            bridge_address: bridge_address.to_string(),
            auth_token: auth_token.to_string(),
        }
    }
}

/// Durable storage for the credential of one bridge.
///
/// Implementations replace the stored record wholesale on [`save`](Self::save);
/// records are never patched in place.
pub trait CredentialStore {
    /// Returns the stored credential if it belongs to `bridge_address`.
    fn load(&self, bridge_address: &str) -> Result<Option<DeviceCredential>>;

    /// Replaces whatever is stored with `credential`.
    fn save(&self, credential: &DeviceCredential) -> Result<()>;
}

/// A credential kept as a small JSON document on disk.
///
/// Writes go to a temporary file in the same directory that is then renamed
/// over the target, so a reader never observes a half-written record. Only
/// one process should own a given path.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, bridge_address: &str) -> Result<Option<DeviceCredential>> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no stored bridge credential in {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(Error::credential_io("read", &self.path, e)),
        };

        let credential: DeviceCredential =
            serde_json::from_slice(&raw).map_err(|err| Error::CredentialCorrupt {
                path: self.path.clone(),
                err,
            })?;

        if credential.bridge_address != bridge_address {
            info!(
                "stored credential is for bridge {}, not {}",
                credential.bridge_address, bridge_address
            );
            return Ok(None);
        }
        Ok(Some(credential))
    }

    fn save(&self, credential: &DeviceCredential) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| Error::credential_io("create_dir", dir, e))?;

        let body = serde_json::to_vec_pretty(credential).map_err(Error::JsonDump)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| Error::credential_io("create", &self.path, e))?;
        file.write_all(&body)
            .map_err(|e| Error::credential_io("write", &self.path, e))?;
        file.persist(&self.path)
            .map_err(|e| Error::credential_io("persist", &self.path, e.error))?;

        info!("bridge credential saved to {}", self.path.display());
        Ok(())
    }
}

/// A credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<DeviceCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: DeviceCredential) -> Self {
        MemoryCredentialStore {
            credential: Mutex::new(Some(credential)),
        }
    }

    /// The currently stored credential regardless of bridge address.
    pub fn current(&self) -> Option<DeviceCredential> {
        self.credential
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, bridge_address: &str) -> Result<Option<DeviceCredential>> {
        Ok(self
            .current()
            .filter(|c| c.bridge_address == bridge_address))
    }

    fn save(&self, credential: &DeviceCredential) -> Result<()> {
        debug!("storing credential for bridge {} in memory", credential.bridge_address);
        *self.credential.lock().unwrap_or_else(|e| e.into_inner()) = Some(credential.clone());
        Ok(())
    }
}
