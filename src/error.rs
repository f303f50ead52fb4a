use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Preferences not initialized. Run `idleprefs init` first.")]
    NotInitialized,

    #[error("Preference store could not be initialized: {0}")]
    Initialization(String),

    #[error("Failed to encrypt password: {0}")]
    Encryption(String),

    #[error("Stored password could not be decrypted. Please log in again.")]
    Decryption,

    #[error("Could not parse stored value: {0}")]
    Deserialization(String),

    #[error("Preference store is corrupted: {0}")]
    CorruptStore(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown setting '{0}'. Run `idleprefs list` to see all keys.")]
    UnknownSetting(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, PrefsError>;
