use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PrefsError, Result};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;

/// Encryption capability for sensitive settings.
pub trait Cipher {
    /// Encrypt `plaintext` into a printable ciphertext suitable for a string slot.
    fn encrypt(&self, plaintext: &SecretString) -> Result<String>;

    /// Reverse [`Cipher::encrypt`]. Never returns partially decrypted output.
    fn decrypt(&self, ciphertext: &str) -> Result<SecretString>;
}

#[derive(Clone, Debug)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536, // 64 MB
            t_cost: 3,
            p_cost: 4,
        }
    }
}

/// AES-256-GCM with an Argon2id-derived key.
///
/// Ciphertext layout is hex(`nonce || ciphertext || tag`).
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesGcmCipher {
    key: [u8; KEY_LEN],
}

impl AesGcmCipher {
    /// Derive the cipher key from device key material and the configured salt.
    pub fn derive(key_material: &[u8], salt: &[u8], params: &KdfParams) -> Result<Self> {
        let mut key = derive_key(key_material, salt, params)?;
        let cipher = Self { key };
        key.zeroize();
        Ok(cipher)
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &SecretString) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|_| PrefsError::Encryption("Invalid key length.".into()))?;
        let ciphertext = cipher
            .encrypt(nonce, plaintext.expose_secret().as_bytes())
            .map_err(|_| PrefsError::Encryption("AES-GCM seal failed.".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<SecretString> {
        let bytes = hex::decode(ciphertext).map_err(|_| PrefsError::Decryption)?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(PrefsError::Decryption);
        }

        let (nonce_bytes, sealed) = bytes.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| PrefsError::Decryption)?;
        let mut plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| PrefsError::Decryption)?;

        let result = String::from_utf8(plaintext.clone())
            .map(SecretString::new)
            .map_err(|_| PrefsError::Decryption);
        plaintext.zeroize();
        result
    }
}

/// Stand-in used when no device key can be loaded.
///
/// Every encryption fails with the stored reason and every decryption fails,
/// so the plain settings stay usable while the password slot does not.
#[derive(Debug, Clone)]
pub struct UnavailableCipher {
    reason: String,
}

impl UnavailableCipher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Cipher for UnavailableCipher {
    fn encrypt(&self, _plaintext: &SecretString) -> Result<String> {
        Err(PrefsError::Encryption(self.reason.clone()))
    }

    fn decrypt(&self, _ciphertext: &str) -> Result<SecretString> {
        Err(PrefsError::Decryption)
    }
}

/// Derive a 32-byte AES key from the given material and salt using Argon2id.
fn derive_key(material: &[u8], salt: &[u8], params: &KdfParams) -> Result<[u8; KEY_LEN]> {
    let argon2_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| PrefsError::Config(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let mut key = [0u8; KEY_LEN];
    argon2
        .hash_password_into(material, salt, &mut key)
        .map_err(|e| PrefsError::Encryption(e.to_string()))?;

    Ok(key)
}

/// Generate `len` random bytes, hex-encoded. Used for salts and device keys.
pub fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    let encoded = hex::encode(&bytes);
    bytes.zeroize();
    encoded
}
