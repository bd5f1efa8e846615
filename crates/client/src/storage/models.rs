use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum_macros::{AsRefStr, Display, EnumString};
use ts_rs::TS;

pub const MAX_SAVED_NOTES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Store {
    Preferences,
    Notes,
    Settings,
    Flags,
}

/// A stored value together with its write counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub revision: i64,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub relationship: Option<String>,
    pub zodiac: Option<String>,
    pub mbti: Option<String>,
    pub nickname: Option<String>,
    pub language: String,
    pub theme: String,
    pub font_size: u32,
    pub background: String,
    pub savage_mode: bool,
    /// Fields this version does not model (onboarding markers, app version,
    /// ...) are carried through a save unchanged.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            gender: None,
            age: None,
            relationship: None,
            zodiac: None,
            mbti: None,
            nickname: None,
            language: "zh".to_string(),
            theme: "light".to_string(),
            font_size: 24,
            background: "paper-1".to_string(),
            savage_mode: false,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SavedNote {
    pub id: String,
    pub user_id: String,
    pub content: String,
    /// RFC 3339.
    pub saved_at: String,
    #[serde(default)]
    #[ts(type = "Record<string, unknown>")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct ApiSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Flag {
    OnboardingComplete,
    InviteVerified,
    CommunityPromptShown,
    SavageModeHintShown,
}
