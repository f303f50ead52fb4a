//! Versioned preference store for a Steam card idler.
//!
//! [`Settings`] wraps a [`Backend`], runs schema migrations when opened and
//! encrypts the account password through a [`Cipher`].

pub mod backend;
pub mod cipher;
pub mod config;
pub mod error;
pub mod game;
pub mod logging;
pub mod migration;
pub mod schema;
pub mod settings;

pub use backend::{Backend, Editor, FileBackend, MemoryBackend};
pub use cipher::{AesGcmCipher, Cipher, KdfParams, UnavailableCipher};
pub use error::{PrefsError, Result};
pub use game::Game;
pub use settings::Settings;
