use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::backend::FileBackend;
use crate::cipher::{random_hex, AesGcmCipher, Cipher, KdfParams, UnavailableCipher};
use crate::error::PrefsError;
use crate::settings::Settings;

const CONFIG_DIR: &str = ".idleprefs";
const CONFIG_FILE: &str = "config.toml";
const STORE_FILE: &str = "prefs.json";
const DEVICE_KEY_FILE: &str = "device.key";
const KDF_NAME: &str = "argon2id";
const CONFIG_VERSION: u32 = 1;

pub const SALT_LEN: usize = 32;
pub const DEVICE_KEY_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub backend: String,
    pub version: u32,
    pub kdf: String,
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
    /// Hex-encoded 32-byte salt for Argon2id.
    pub salt: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    pub fn default_new(salt_hex: String) -> Self {
        let kdf = KdfParams::default();
        Self {
            backend: "file".into(),
            version: CONFIG_VERSION,
            kdf: KDF_NAME.into(),
            m_cost: kdf.m_cost,
            t_cost: kdf.t_cost,
            p_cost: kdf.p_cost,
            salt: salt_hex,
            log_level: default_log_level(),
        }
    }

    pub fn kdf_params(&self) -> KdfParams {
        KdfParams {
            m_cost: self.m_cost,
            t_cost: self.t_cost,
            p_cost: self.p_cost,
        }
    }

    pub fn salt_bytes(&self) -> Result<Vec<u8>, PrefsError> {
        hex::decode(&self.salt)
            .map_err(|_| PrefsError::Config("Invalid salt hex in config.toml".into()))
    }
}

/// Returns the `.idleprefs` directory for a given project root.
pub fn prefs_dir(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR)
}

/// Returns the config file path for a given project root.
pub fn config_path(project_root: &Path) -> PathBuf {
    prefs_dir(project_root).join(CONFIG_FILE)
}

/// Returns the preference store path for a given project root.
pub fn store_path(project_root: &Path) -> PathBuf {
    prefs_dir(project_root).join(STORE_FILE)
}

pub fn device_key_path(project_root: &Path) -> PathBuf {
    prefs_dir(project_root).join(DEVICE_KEY_FILE)
}

/// Read and parse config from the given project root. Returns an error if not initialized.
pub fn read(project_root: &Path) -> Result<Config, PrefsError> {
    let path = config_path(project_root);
    if !path.exists() {
        return Err(PrefsError::NotInitialized);
    }
    let raw = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&raw).map_err(|e| PrefsError::Config(e.to_string()))?;
    if config.backend != "file" {
        return Err(PrefsError::Config(format!(
            "Unsupported backend '{}' in config.toml",
            config.backend
        )));
    }
    if config.kdf != KDF_NAME {
        return Err(PrefsError::Config(format!(
            "Unsupported kdf '{}' in config.toml",
            config.kdf
        )));
    }
    if config.version != CONFIG_VERSION {
        return Err(PrefsError::Config(format!(
            "Unsupported config version {} in config.toml",
            config.version
        )));
    }
    debug!(path = ?path, "Config loaded");
    Ok(config)
}

/// Write config to the given project root. Creates the `.idleprefs` directory if needed.
pub fn write(project_root: &Path, config: &Config) -> Result<(), PrefsError> {
    let dir = prefs_dir(project_root);
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(CONFIG_FILE);
    let raw = toml::to_string(config).map_err(|e| PrefsError::Config(e.to_string()))?;
    std::fs::write(path, raw)?;
    Ok(())
}

/// Generate and store a fresh device key, replacing any existing one.
pub fn write_device_key(project_root: &Path) -> Result<(), PrefsError> {
    let dir = prefs_dir(project_root);
    std::fs::create_dir_all(&dir)?;
    let mut key_hex = random_hex(DEVICE_KEY_LEN);
    let result = write_private(&dir.join(DEVICE_KEY_FILE), key_hex.as_bytes());
    key_hex.zeroize();
    result
}

/// Build the password cipher from the device key and the configured salt.
pub fn load_cipher(project_root: &Path, config: &Config) -> Result<AesGcmCipher, PrefsError> {
    let path = device_key_path(project_root);
    if !path.exists() {
        return Err(PrefsError::Encryption(
            "Device key is missing; stored passwords cannot be used.".into(),
        ));
    }
    let mut raw = std::fs::read_to_string(&path)?;
    let key = hex::decode(raw.trim());
    raw.zeroize();
    let mut key = key.map_err(|_| PrefsError::Encryption("Device key is not valid hex.".into()))?;

    let cipher = AesGcmCipher::derive(&key, &config.salt_bytes()?, &config.kdf_params());
    key.zeroize();
    cipher
}

/// Open the preference store under `project_root`, running pending migrations.
///
/// A missing or unreadable device key does not block the plain settings: the
/// store opens with a cipher that refuses every password operation.
pub fn open_settings(project_root: &Path) -> Result<Settings<FileBackend>, PrefsError> {
    let config = read(project_root)?;
    let cipher: Box<dyn Cipher> = match load_cipher(project_root, &config) {
        Ok(cipher) => Box::new(cipher),
        Err(PrefsError::Encryption(reason)) => {
            warn!(%reason, "Device key unavailable, password operations disabled");
            Box::new(UnavailableCipher::new(reason))
        }
        Err(e) => return Err(e),
    };
    Settings::open_file(&store_path(project_root), cipher)
}

/// Returns the current project root (cwd).
pub fn project_root() -> Result<PathBuf, PrefsError> {
    std::env::current_dir().map_err(PrefsError::Io)
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), PrefsError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), PrefsError> {
    std::fs::write(path, bytes)?;
    Ok(())
}
