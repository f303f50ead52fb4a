use std::path::Path;

use secrecy::SecretString;
use tracing::{info, warn};

use crate::backend::{Backend, Editor, FileBackend};
use crate::cipher::Cipher;
use crate::error::{PrefsError, Result};
use crate::game::Game;
use crate::migration;
use crate::schema::{self, Literal, Scalar, Setting, Value};

/// Separator for the blacklist. Ids are not escaped, so an id containing it
/// splits into two entries on the next read.
pub const BLACKLIST_DELIMITER: &str = ",";

/// Generates a typed getter and setter pair per plain setting.
macro_rules! accessors {
    ($($getter:ident / $setter:ident: $setting:expr => $ty:ty;)*) => {
        $(
            pub fn $getter(&self) -> $ty {
                self.get($setting)
            }

            pub fn $setter(&mut self, value: impl Into<$ty>) -> Result<()> {
                self.set($setting, value.into())
            }
        )*
    };
}

/// Typed facade over a backing store. Construct one per process and pass it
/// to whatever needs preferences.
pub struct Settings<B: Backend> {
    backend: B,
    cipher: Box<dyn Cipher>,
}

impl Settings<FileBackend> {
    /// Open the JSON store at `path` and bring it to the current schema.
    pub fn open_file(path: &Path, cipher: Box<dyn Cipher>) -> Result<Self> {
        let backend =
            FileBackend::open(path).map_err(|e| PrefsError::Initialization(e.to_string()))?;
        Self::open(backend, cipher)
    }
}

impl<B: Backend> Settings<B> {
    /// Wrap an opened backend and run any pending migrations.
    pub fn open(backend: B, cipher: Box<dyn Cipher>) -> Result<Self> {
        let mut settings = Self { backend, cipher };
        settings.initialize()?;
        Ok(settings)
    }

    /// Re-check the schema version. A no-op once the store is current.
    pub fn initialize(&mut self) -> Result<bool> {
        migration::initialize(&mut self.backend)
    }

    /// Raw read access to the backing store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get<T: Scalar>(&self, setting: Setting<T>) -> T::Owned {
        T::read(&self.backend, setting.key, setting.default)
    }

    pub fn set<T: Scalar>(&mut self, setting: Setting<T>, value: T::Owned) -> Result<()> {
        self.backend
            .apply(Editor::new().put(setting.key, T::into_value(value)))
    }

    accessors! {
        username / set_username: schema::USERNAME => String;
        login_key / set_login_key: schema::LOGIN_KEY => String;
        sentry_hash / set_sentry_hash: schema::SENTRY_HASH => String;
        shared_secret / set_shared_secret: schema::SHARED_SECRET => String;
        offline / set_offline: schema::OFFLINE => bool;
        stay_awake / set_stay_awake: schema::STAY_AWAKE => bool;
        minimize_data / set_minimize_data: schema::MINIMIZE_DATA => bool;
        parental_pin / set_parental_pin: schema::PARENTAL_PIN => String;
        hours_until_drops / set_hours_until_drops: schema::HOURS_UNTIL_DROPS => i32;
        include_free_games / set_include_free_games: schema::INCLUDE_FREE_GAMES => bool;
        persona_name / set_persona_name: schema::PERSONA_NAME => String;
        avatar_hash / set_avatar_hash: schema::AVATAR_HASH => String;
        api_key / set_api_key: schema::API_KEY => String;
        language / set_language: schema::LANGUAGE => String;
        version / set_version: schema::VERSION => i32;
    }

    /// Encrypt and store the account password. Nothing is written if
    /// encryption fails.
    pub fn write_password(&mut self, plaintext: &SecretString) -> Result<()> {
        let sealed = self.cipher.encrypt(plaintext).map_err(as_encryption_error)?;
        self.backend
            .apply(Editor::new().put_string(schema::PASSWORD.key, sealed))
    }

    /// Decrypt the stored password. An unset or cleared password reads as empty.
    pub fn read_password(&self) -> Result<SecretString> {
        let sealed = self.backend.get_string(schema::PASSWORD.key, "");
        if sealed.is_empty() {
            return Ok(SecretString::new(String::new()));
        }
        self.cipher.decrypt(&sealed).map_err(|e| {
            warn!(error = %e, "Stored password could not be decrypted");
            PrefsError::Decryption
        })
    }

    pub fn has_password(&self) -> bool {
        !self.backend.get_string(schema::PASSWORD.key, "").is_empty()
    }

    /// Re-encrypt the stored password under `cipher` and adopt it for later calls.
    pub fn rekey(&mut self, cipher: Box<dyn Cipher>) -> Result<()> {
        if self.has_password() {
            let plaintext = self.read_password()?;
            let sealed = cipher.encrypt(&plaintext).map_err(as_encryption_error)?;
            self.backend
                .apply(Editor::new().put_string(schema::PASSWORD.key, sealed))?;
        }
        self.cipher = cipher;
        info!("Password re-encrypted with new key");
        Ok(())
    }

    /// Store the blacklisted game ids. Ids must not contain [`BLACKLIST_DELIMITER`].
    pub fn write_blacklist<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<()> {
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect();
        if let Some(bad) = ids.iter().find(|id| id.contains(BLACKLIST_DELIMITER)) {
            warn!(id = bad, "Blacklist id contains the delimiter and will be split on read");
        }
        let joined = ids.join(BLACKLIST_DELIMITER);
        self.set(schema::BLACKLIST, joined)
    }

    /// The stored ids in order. An empty blacklist reads as a single empty id.
    pub fn read_blacklist(&self) -> Vec<String> {
        self.get(schema::BLACKLIST)
            .split(BLACKLIST_DELIMITER)
            .map(str::to_string)
            .collect()
    }

    pub fn is_blacklisted(&self, id: &str) -> bool {
        !id.is_empty() && self.read_blacklist().iter().any(|b| b == id)
    }

    /// Store the games idled in this run. Nothing is written if any game
    /// cannot be represented in JSON.
    pub fn write_last_session(&mut self, games: &[Game]) -> Result<()> {
        if let Some(game) = games.iter().find(|g| !g.hours_played.is_finite()) {
            return Err(PrefsError::Serialization(format!(
                "Game {} has non-finite hours_played {}",
                game.appid, game.hours_played
            )));
        }
        let json =
            serde_json::to_string(games).map_err(|e| PrefsError::Serialization(e.to_string()))?;
        self.set(schema::LAST_SESSION, json)
    }

    /// Games idled in the last run. Unreadable or missing data reads as empty.
    pub fn read_last_session(&self) -> Vec<Game> {
        let raw = self.get(schema::LAST_SESSION);
        if raw.trim().is_empty() {
            return Vec::new();
        }
        parse_games(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable last session");
            Vec::new()
        })
    }

    /// Reset every credential and identity field. Device preferences are kept.
    pub fn clear_user(&mut self) -> Result<()> {
        let editor = schema::USER_SCOPED
            .iter()
            .fold(Editor::new(), |editor, key| editor.put_string(key, ""));
        self.backend.apply(editor)?;
        info!("User preferences cleared");
        Ok(())
    }

    /// Read any plain setting by key.
    pub fn get_value(&self, key: &str) -> Result<Value> {
        let desc = plain_descriptor(key)?;
        let value = match desc.default {
            Literal::Str(d) => Value::Str(self.backend.get_string(desc.key, d)),
            Literal::Int(d) => Value::Int(self.backend.get_int(desc.key, d)),
            Literal::Bool(d) => Value::Bool(self.backend.get_bool(desc.key, d)),
        };
        Ok(value)
    }

    /// Parse `raw` according to the setting's kind and store it.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let desc = plain_descriptor(key)?;
        if desc.key == schema::BLACKLIST.key {
            let ids: Vec<&str> = raw.split(BLACKLIST_DELIMITER).collect();
            return self.write_blacklist(&ids);
        }
        if desc.key == schema::LAST_SESSION.key {
            let games = parse_games(raw)?;
            return self.write_last_session(&games);
        }
        let value = desc.kind().parse(desc.key, raw)?;
        self.backend.apply(Editor::new().put(desc.key, value))
    }
}

/// Decode a serialized game list. `null` decodes as empty.
pub fn parse_games(raw: &str) -> Result<Vec<Game>> {
    serde_json::from_str::<Option<Vec<Game>>>(raw)
        .map(Option::unwrap_or_default)
        .map_err(|e| PrefsError::Deserialization(e.to_string()))
}

fn plain_descriptor(key: &str) -> Result<&'static schema::Descriptor> {
    let desc = schema::lookup(key).ok_or_else(|| PrefsError::UnknownSetting(key.to_string()))?;
    if desc.sensitive {
        return Err(PrefsError::InvalidValue {
            key: key.to_string(),
            reason: "stored encrypted; use the password commands".into(),
        });
    }
    Ok(desc)
}

fn as_encryption_error(e: PrefsError) -> PrefsError {
    match e {
        PrefsError::Encryption(_) => e,
        other => PrefsError::Encryption(other.to_string()),
    }
}
