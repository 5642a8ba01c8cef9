use std::path::PathBuf;
use std::time::Duration;

/// All error types that can occur while driving a light from the calendar.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// An HTTP round-trip to the bridge or the calendar failed.
    #[error("http {action} error: {err}")]
    Http { action: String, err: reqwest::Error },

    /// A round-trip did not complete within the configured bound.
    #[error("{action} timed out after {after:?}")]
    Timeout { action: String, after: Duration },

    /// The bridge answered with an API error object.
    #[error("bridge error {kind} at {address}: {description}")]
    Bridge {
        kind: u16,
        address: String,
        description: String,
    },

    /// The bridge refused pairing because its link button was not pressed.
    #[error("link button not pressed")]
    LinkButtonNotPressed,

    /// The bridge answered with something that is neither success nor error.
    #[error("unexpected bridge response: {0}")]
    UnexpectedResponse(String),

    /// No light with the given name is currently reported by the bridge.
    #[error("light '{name}' not found; available lights: {available:?}")]
    LightNotFound {
        name: String,
        available: Vec<String>,
    },

    /// Reading or writing the persisted credential failed.
    #[error("credential store {action} error at {path:?}: {err:?}")]
    CredentialIo {
        action: String,
        path: PathBuf,
        err: std::io::Error,
    },

    /// The persisted credential file is not valid JSON.
    #[error("credential store at {path:?} is corrupt: {err:?}")]
    CredentialCorrupt {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Pairing was interrupted through the cancellation token.
    #[error("pairing cancelled")]
    PairingCancelled,

    /// Pairing gave up after the configured maximum number of attempts.
    #[error("pairing gave up after {0} attempts")]
    PairingExhausted(u32),

    /// The calendar feed could not be interpreted.
    #[error("invalid calendar data: {0}")]
    Calendar(String),

    /// Failed to parse a [`crate::Color`] from a string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),

    /// Configuration sources could not be merged or extracted.
    #[error("config loading failed: {0}")]
    Config(Box<figment::Error>),

    /// A configuration value is present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The `.env` file exists but could not be read.
    #[error("env file error: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

impl Error {
    /// Create a new HTTP error
    pub fn http(action: &str, err: reqwest::Error) -> Self {
        Error::Http {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new timeout error
    pub fn timeout(action: &str, after: Duration) -> Self {
        Error::Timeout {
            action: action.to_string(),
            after,
        }
    }

    /// Create a new light not found error
    pub fn light_not_found(name: &str, available: Vec<String>) -> Self {
        Error::LightNotFound {
            name: name.to_string(),
            available,
        }
    }

    /// Create a new credential I/O error
    pub fn credential_io(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        Error::CredentialIo {
            action: action.to_string(),
            path: path.to_path_buf(),
            err,
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for per-round-trip failures that the next poll may not see.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Http { .. } | Error::Timeout { .. } | Error::LightNotFound { .. }
        )
    }

    /// Returns `true` if the bridge is still waiting for the operator to confirm pairing.
    pub fn is_pairing_pending(&self) -> bool {
        matches!(self, Error::LinkButtonNotPressed)
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
