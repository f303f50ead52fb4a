use serde::{Deserialize, Serialize};

/// A game being idled. Opaque to the preference store beyond being serializable.
///
/// Unknown fields are ignored on decode and missing optional fields take
/// their defaults, so snapshots written by other releases still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub appid: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(default)]
    pub hours_played: f32,
    #[serde(default)]
    pub drops_remaining: u32,
}

impl Game {
    pub fn new(appid: u32, name: impl Into<String>) -> Self {
        Self {
            appid,
            name: name.into(),
            icon_url: String::new(),
            hours_played: 0.0,
            drops_remaining: 0,
        }
    }
}
