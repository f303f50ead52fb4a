//! The registry of every recognized preference key.
//!
//! Each setting is declared once as a typed constant. Accessors, the
//! migration table and the CLI all refer to these constants, so renaming a
//! key is a one-line change here (plus a `RenameKey` migration step).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::error::{PrefsError, Result};

/// A primitive value as held by the backing store.
///
/// Anything that is not a bool, an `i32` or a string (floats, out-of-range
/// integers, nested JSON) lands in `Other`. It is kept as written and every
/// typed read of it yields the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Str(String),
    Other(serde_json::Value),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
            Value::Other(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Str,
    Int,
    Bool,
}

impl Kind {
    /// Parse a raw command-line string into a value of this kind.
    pub fn parse(self, key: &str, raw: &str) -> Result<Value> {
        match self {
            Kind::Str => Ok(Value::Str(raw.to_string())),
            Kind::Int => raw
                .trim()
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|e| PrefsError::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            Kind::Bool => raw
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| PrefsError::InvalidValue {
                    key: key.to_string(),
                    reason: "expected `true` or `false`".into(),
                }),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Str => "string",
            Kind::Int => "int",
            Kind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// A compile-time constant value, used for defaults and migration resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Str(&'static str),
    Int(i32),
    Bool(bool),
}

impl Literal {
    pub fn kind(self) -> Kind {
        match self {
            Literal::Str(_) => Kind::Str,
            Literal::Int(_) => Kind::Int,
            Literal::Bool(_) => Kind::Bool,
        }
    }

    pub fn to_value(self) -> Value {
        match self {
            Literal::Str(s) => Value::Str(s.to_string()),
            Literal::Int(i) => Value::Int(i),
            Literal::Bool(b) => Value::Bool(b),
        }
    }
}

/// A plain (unencrypted) setting holding a `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setting<T> {
    pub key: &'static str,
    pub default: T,
}

impl<T> Setting<T> {
    pub const fn new(key: &'static str, default: T) -> Self {
        Self { key, default }
    }
}

impl Setting<&'static str> {
    pub const fn describe(&self) -> Descriptor {
        Descriptor {
            key: self.key,
            default: Literal::Str(self.default),
            sensitive: false,
        }
    }
}

impl Setting<i32> {
    pub const fn describe(&self) -> Descriptor {
        Descriptor {
            key: self.key,
            default: Literal::Int(self.default),
            sensitive: false,
        }
    }
}

impl Setting<bool> {
    pub const fn describe(&self) -> Descriptor {
        Descriptor {
            key: self.key,
            default: Literal::Bool(self.default),
            sensitive: false,
        }
    }
}

/// A string setting that is only ever stored encrypted.
///
/// Not a `Setting<T>`, so the generic accessors cannot reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretSetting {
    pub key: &'static str,
}

impl SecretSetting {
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }

    pub const fn describe(&self) -> Descriptor {
        Descriptor {
            key: self.key,
            default: Literal::Str(""),
            sensitive: true,
        }
    }
}

/// Untyped view of a setting, for lookups by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub key: &'static str,
    pub default: Literal,
    pub sensitive: bool,
}

impl Descriptor {
    pub fn kind(&self) -> Kind {
        self.default.kind()
    }
}

/// Primitive types a `Setting` can hold, and how each is read from a backend.
pub trait Scalar: Copy {
    type Owned;

    fn read(backend: &dyn Backend, key: &str, default: Self) -> Self::Owned;

    fn into_value(value: Self::Owned) -> Value;
}

impl Scalar for &'static str {
    type Owned = String;

    fn read(backend: &dyn Backend, key: &str, default: Self) -> String {
        backend.get_string(key, default)
    }

    fn into_value(value: String) -> Value {
        Value::Str(value)
    }
}

impl Scalar for i32 {
    type Owned = i32;

    fn read(backend: &dyn Backend, key: &str, default: Self) -> i32 {
        backend.get_int(key, default)
    }

    fn into_value(value: i32) -> Value {
        Value::Int(value)
    }
}

impl Scalar for bool {
    type Owned = bool;

    fn read(backend: &dyn Backend, key: &str, default: Self) -> bool {
        backend.get_bool(key, default)
    }

    fn into_value(value: bool) -> Value {
        Value::Bool(value)
    }
}

pub const USERNAME: Setting<&str> = Setting::new("username", "");
pub const PASSWORD: SecretSetting = SecretSetting::new("password");
pub const LOGIN_KEY: Setting<&str> = Setting::new("login_key", "");
pub const SENTRY_HASH: Setting<&str> = Setting::new("sentry_hash", "");
pub const SHARED_SECRET: Setting<&str> = Setting::new("shared_secret", "");
pub const OFFLINE: Setting<bool> = Setting::new("offline", false);
pub const STAY_AWAKE: Setting<bool> = Setting::new("stay_awake", false);
pub const MINIMIZE_DATA: Setting<bool> = Setting::new("minimize_data", false);
pub const PARENTAL_PIN: Setting<&str> = Setting::new("parental_pin", "");
/// Comma-separated game ids. Ids must not contain a comma themselves.
pub const BLACKLIST: Setting<&str> = Setting::new("blacklist", "");
/// JSON array of `Game` records.
pub const LAST_SESSION: Setting<&str> = Setting::new("last_session", "");
pub const HOURS_UNTIL_DROPS: Setting<i32> = Setting::new("hours_until_drops", 3);
pub const INCLUDE_FREE_GAMES: Setting<bool> = Setting::new("include_free_games", false);
pub const PERSONA_NAME: Setting<&str> = Setting::new("persona_name", "");
pub const AVATAR_HASH: Setting<&str> = Setting::new("avatar_hash", "");
pub const API_KEY: Setting<&str> = Setting::new("api_key", "");
pub const LANGUAGE: Setting<&str> = Setting::new("language", "");
/// Last fully applied schema version. Stores that predate versioning read as 1.
pub const VERSION: Setting<i32> = Setting::new("version", 1);

pub const ALL: &[Descriptor] = &[
    USERNAME.describe(),
    PASSWORD.describe(),
    LOGIN_KEY.describe(),
    SENTRY_HASH.describe(),
    SHARED_SECRET.describe(),
    OFFLINE.describe(),
    STAY_AWAKE.describe(),
    MINIMIZE_DATA.describe(),
    PARENTAL_PIN.describe(),
    BLACKLIST.describe(),
    LAST_SESSION.describe(),
    HOURS_UNTIL_DROPS.describe(),
    INCLUDE_FREE_GAMES.describe(),
    PERSONA_NAME.describe(),
    AVATAR_HASH.describe(),
    API_KEY.describe(),
    LANGUAGE.describe(),
    VERSION.describe(),
];

/// Credential and identity keys wiped on logout. Device-scoped preferences
/// (offline, stay_awake, minimize_data, language, hours_until_drops,
/// include_free_games) are not listed.
pub const USER_SCOPED: &[&str] = &[
    USERNAME.key,
    PASSWORD.key,
    LOGIN_KEY.key,
    SENTRY_HASH.key,
    BLACKLIST.key,
    LAST_SESSION.key,
    PARENTAL_PIN.key,
    PERSONA_NAME.key,
    AVATAR_HASH.key,
    API_KEY.key,
];

pub fn lookup(key: &str) -> Option<&'static Descriptor> {
    ALL.iter().find(|d| d.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<&str> = ALL.iter().map(|d| d.key).collect();
        assert_eq!(keys.len(), ALL.len());
        assert_eq!(ALL.len(), 18);
    }

    #[test]
    fn test_only_password_is_sensitive() {
        let sensitive: Vec<&str> = ALL.iter().filter(|d| d.sensitive).map(|d| d.key).collect();
        assert_eq!(sensitive, vec!["password"]);
    }

    #[test]
    fn test_user_scoped_keys_are_registered_strings() {
        for key in USER_SCOPED {
            let desc = lookup(key).expect("registered");
            assert_eq!(desc.kind(), Kind::Str, "{} should be a string", key);
        }
        assert!(!USER_SCOPED.contains(&LANGUAGE.key));
        assert!(!USER_SCOPED.contains(&SHARED_SECRET.key));
    }

    #[test]
    fn test_lookup_returns_defaults() {
        let hours = lookup("hours_until_drops").expect("registered");
        assert_eq!(hours.default, Literal::Int(3));
        assert_eq!(hours.kind(), Kind::Int);

        let version = lookup("version").expect("registered");
        assert_eq!(version.default, Literal::Int(1));

        assert_eq!(lookup("offline").unwrap().kind(), Kind::Bool);
        assert!(lookup("no_such_key").is_none());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(Kind::Int.parse("k", " 7 ").unwrap(), Value::Int(7));
        assert_eq!(Kind::Bool.parse("k", "true").unwrap(), Value::Bool(true));
        assert_eq!(
            Kind::Str.parse("k", "a,b").unwrap(),
            Value::Str("a,b".to_string())
        );

        let err = Kind::Int.parse("hours_until_drops", "three").unwrap_err();
        assert!(matches!(err, PrefsError::InvalidValue { ref key, .. } if key == "hours_until_drops"));
        assert!(Kind::Bool.parse("offline", "yes").is_err());
    }

    #[test]
    fn test_value_serializes_as_bare_primitive() {
        let json = r#"{"a":"x","b":4,"c":true}"#;
        let map: std::collections::BTreeMap<String, Value> = serde_json::from_str(json).unwrap();
        assert_eq!(map["a"], Value::Str("x".into()));
        assert_eq!(map["b"], Value::Int(4));
        assert_eq!(map["c"], Value::Bool(true));
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }

    #[test]
    fn test_unexpected_json_is_kept_as_other() {
        let json = r#"{"big":99999999999,"f":2.5,"n":null}"#;
        let map: std::collections::BTreeMap<String, Value> = serde_json::from_str(json).unwrap();
        assert!(matches!(map["f"], Value::Other(_)));
        assert!(matches!(map["big"], Value::Other(_)));
        assert_eq!(map["n"], Value::Other(serde_json::Value::Null));
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }
}
