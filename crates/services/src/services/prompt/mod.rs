//! Prompt assembly for note generation: static trait tables, the local
//! time context, the cached horoscope and the final template.

pub mod builder;
pub mod calendar;
pub mod fortune;
pub mod personality;
pub mod theme;
pub mod time;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Western zodiac keys in cache-index order with their Chinese names.
pub const ZODIACS: [(&str, &str); 12] = [
    ("aries", "白羊座"),
    ("taurus", "金牛座"),
    ("gemini", "双子座"),
    ("cancer", "巨蟹座"),
    ("leo", "狮子座"),
    ("virgo", "处女座"),
    ("libra", "天秤座"),
    ("scorpio", "天蝎座"),
    ("sagittarius", "射手座"),
    ("capricorn", "摩羯座"),
    ("aquarius", "水瓶座"),
    ("pisces", "双鱼座"),
];

pub fn zodiac_chinese(key: &str) -> Option<&'static str> {
    ZODIACS.iter().find(|(k, _)| *k == key).map(|(_, zh)| *zh)
}

/// Output style of a note.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    #[default]
    Chat,
    Aphorism,
    Poetry,
    Haiku,
}

impl Theme {
    /// Unknown or missing values select `Chat`.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|r| r.parse().ok()).unwrap_or_default()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FortuneAspect {
    #[default]
    Overall,
    Love,
    Career,
    Wealth,
}

impl FortuneAspect {
    pub fn label(self) -> &'static str {
        match self {
            FortuneAspect::Overall => "整体",
            FortuneAspect::Love => "爱情",
            FortuneAspect::Career => "事业",
            FortuneAspect::Wealth => "财运",
        }
    }
}

/// Body of `POST /api/note/generate`. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteParams {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub relationship: Option<String>,
    pub zodiac: Option<String>,
    pub mbti: Option<String>,
    pub mood: Option<String>,
    pub moods: Vec<String>,
    pub theme: Option<String>,
    pub language: Option<String>,
    pub savage_mode: bool,
    pub enable_fortune: bool,
    pub fortune_aspect: Option<String>,
    pub nickname: Option<String>,
}

impl NoteParams {
    pub fn theme(&self) -> Theme {
        Theme::from_param(self.theme.as_deref())
    }

    pub fn theme_label(&self) -> &str {
        self.theme.as_deref().filter(|t| !t.is_empty()).unwrap_or("chat")
    }

    pub fn bilingual(&self) -> bool {
        self.language.as_deref() == Some("en-zh")
    }

    /// The fortune aspect to include, if fortune is enabled. Unrecognised
    /// aspects read the wealth entry.
    pub fn fortune_aspect(&self) -> Option<FortuneAspect> {
        if !self.enable_fortune {
            return None;
        }
        let raw = self.fortune_aspect.as_deref().filter(|a| !a.is_empty())?;
        Some(raw.parse().unwrap_or(FortuneAspect::Wealth))
    }

    /// Emoji input as one string: all `moods`, else `mood`, else `平静`.
    pub fn mood_input(&self) -> String {
        if !self.moods.is_empty() {
            self.moods.concat()
        } else {
            self.mood
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or("平静")
                .to_string()
        }
    }

    /// Mood as echoed in response metadata.
    pub fn mood_label(&self) -> String {
        match self.mood.as_deref().filter(|m| !m.is_empty()) {
            Some(mood) => mood.to_string(),
            None if !self.moods.is_empty() => self.moods.join(","),
            None => "平静".to_string(),
        }
    }
}

/// Natural-language description of a set of moods.
pub fn mood_phrase(moods: &[String]) -> String {
    match moods {
        [] => "平静的状态".to_string(),
        [one] => format!("{one}的状态"),
        [a, b] => format!("{a}和{b}的混合状态"),
        [init @ .., last] => format!("{}以及{}的复杂情绪状态", init.join("、"), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moods(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn mood_phrases() {
        assert_eq!(mood_phrase(&[]), "平静的状态");
        assert_eq!(mood_phrase(&moods(&["开心"])), "开心的状态");
        assert_eq!(mood_phrase(&moods(&["开心", "疲惫"])), "开心和疲惫的混合状态");
        assert_eq!(
            mood_phrase(&moods(&["开心", "疲惫", "焦虑"])),
            "开心、疲惫以及焦虑的复杂情绪状态"
        );
    }

    #[test]
    fn theme_falls_back_to_chat() {
        assert_eq!(Theme::from_param(Some("haiku")), Theme::Haiku);
        assert_eq!(Theme::from_param(Some("sonnet")), Theme::Chat);
        assert_eq!(Theme::from_param(None), Theme::Chat);
    }

    #[test]
    fn mood_input_prefers_list() {
        let mut params = NoteParams {
            mood: Some("😊".into()),
            ..Default::default()
        };
        assert_eq!(params.mood_input(), "😊");
        params.moods = moods(&["🌧️", "😭"]);
        assert_eq!(params.mood_input(), "🌧️😭");
        assert_eq!(NoteParams::default().mood_input(), "平静");
    }

    #[test]
    fn fortune_aspect_requires_flag() {
        let mut params = NoteParams {
            fortune_aspect: Some("love".into()),
            ..Default::default()
        };
        assert_eq!(params.fortune_aspect(), None);
        params.enable_fortune = true;
        assert_eq!(params.fortune_aspect(), Some(FortuneAspect::Love));
        params.fortune_aspect = None;
        assert_eq!(params.fortune_aspect(), None);
    }

    #[test]
    fn zodiac_lookup() {
        assert_eq!(zodiac_chinese("leo"), Some("狮子座"));
        assert_eq!(zodiac_chinese("dragon"), None);
    }
}
