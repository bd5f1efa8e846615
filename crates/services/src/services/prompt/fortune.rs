//! Daily horoscope lookup from the scraped astro cache.

use std::{collections::HashMap, path::Path};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::{FortuneAspect, ZODIACS};

pub const DEFAULT_RATING: &str = "★★★☆☆";

const PLAIN_OVERALL: &str = "今日运势一般，保持平常心。";
const PLAIN_LOVE: &str = "感情上需要多一些理解和包容。";
const PLAIN_CAREER: &str = "工作中可能会遇到一些挑战，但总体平稳。";
const PLAIN_WEALTH: &str = "财务状况稳定，避免不必要的支出。";

static RATING: Lazy<Regex> = Lazy::new(|| Regex::new(r"[★☆]+").expect("valid rating regex"));

#[derive(Debug, Error)]
pub enum FortuneError {
    #[error("astro cache unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("astro cache is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("astro cache has no entry for zodiac index {0}")]
    Missing(usize),
}

#[derive(Debug, Deserialize)]
struct CacheEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    items: Vec<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FortuneEntry {
    pub rating: String,
    pub content: String,
}

impl FortuneEntry {
    fn new(content: &str) -> Self {
        Self {
            rating: DEFAULT_RATING.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fortune {
    pub title: String,
    pub overall: FortuneEntry,
    pub love: FortuneEntry,
    pub career: FortuneEntry,
    pub wealth: FortuneEntry,
}

impl Fortune {
    fn plain(title: String) -> Self {
        Self {
            title,
            overall: FortuneEntry::new(PLAIN_OVERALL),
            love: FortuneEntry::new(PLAIN_LOVE),
            career: FortuneEntry::new(PLAIN_CAREER),
            wealth: FortuneEntry::new(PLAIN_WEALTH),
        }
    }

    /// What the prompt gets when the cache cannot be used.
    pub fn fallback(zodiac: &str) -> Self {
        let name = ZODIACS
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(zodiac))
            .map(|(_, zh)| *zh)
            .unwrap_or("星座");
        Self {
            title: format!("今日{name}运势"),
            overall: FortuneEntry::new("今日运势一般，宜保持平常心。适合做好规划，避免冲动决策。"),
            love: FortuneEntry::new("感情上需要多一些理解和包容。沟通是关键，耐心倾听对方的想法。"),
            career: FortuneEntry::new(
                "工作中可能会遇到一些挑战，但总体平稳。合理安排任务优先级，避免分心。",
            ),
            wealth: FortuneEntry::new("财务状况稳定，避免不必要的支出。适合做长期投资规划，不宜冲动消费。"),
        }
    }

    pub fn select(&self, aspect: FortuneAspect) -> &FortuneEntry {
        match aspect {
            FortuneAspect::Overall => &self.overall,
            FortuneAspect::Love => &self.love,
            FortuneAspect::Career => &self.career,
            FortuneAspect::Wealth => &self.wealth,
        }
    }

    fn entry_mut(&mut self, aspect: FortuneAspect) -> &mut FortuneEntry {
        match aspect {
            FortuneAspect::Overall => &mut self.overall,
            FortuneAspect::Love => &mut self.love,
            FortuneAspect::Career => &mut self.career,
            FortuneAspect::Wealth => &mut self.wealth,
        }
    }
}

/// Cache index of a zodiac key, aries when unknown.
pub fn zodiac_index(zodiac: &str) -> usize {
    let lower = zodiac.to_ascii_lowercase();
    ZODIACS.iter().position(|(key, _)| *key == lower).unwrap_or(0)
}

fn category(line: &str) -> Option<FortuneAspect> {
    if line.contains("整體運勢") || line.contains("整体运势") {
        Some(FortuneAspect::Overall)
    } else if line.contains("愛情運勢") || line.contains("爱情运势") {
        Some(FortuneAspect::Love)
    } else if line.contains("事業運勢") || line.contains("事业运势") {
        Some(FortuneAspect::Career)
    } else if line.contains("財運運勢") || line.contains("财运运势") {
        Some(FortuneAspect::Wealth)
    } else {
        None
    }
}

fn plain_content(aspect: FortuneAspect) -> &'static str {
    match aspect {
        FortuneAspect::Overall => PLAIN_OVERALL,
        FortuneAspect::Love => PLAIN_LOVE,
        FortuneAspect::Career => PLAIN_CAREER,
        FortuneAspect::Wealth => PLAIN_WEALTH,
    }
}

/// Category lines carry the star rating and optionally the text after the
/// first colon; otherwise the next non-category line is the text.
pub fn parse_items(title: String, items: &[String]) -> Fortune {
    let mut fortune = Fortune::plain(title);
    let mut current: Option<FortuneAspect> = None;

    for item in items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
        if let Some(aspect) = category(item) {
            current = Some(aspect);
            let entry = fortune.entry_mut(aspect);
            if let Some(stars) = RATING.find(item) {
                entry.rating = stars.as_str().to_string();
            }
            if let Some(text) = item.split(['：', ':']).nth(1).map(str::trim)
                && !text.is_empty()
            {
                entry.content = text.to_string();
            }
        } else if let Some(aspect) = current.take() {
            let entry = fortune.entry_mut(aspect);
            if entry.content == plain_content(aspect) {
                entry.content = item.to_string();
            }
        }
    }
    fortune
}

/// Read one sign from the cache. A stale cache date is logged and used.
pub async fn load(path: &Path, zodiac: &str, today: NaiveDate) -> Result<Fortune, FortuneError> {
    let index = zodiac_index(zodiac);
    let raw = tokio::fs::read_to_string(path).await?;
    let mut cache: HashMap<String, CacheEntry> = serde_json::from_str(&raw)?;
    let entry = cache
        .remove(&index.to_string())
        .ok_or(FortuneError::Missing(index))?;

    let today = today.format("%Y-%m-%d").to_string();
    if entry.date.as_deref() != Some(today.as_str()) {
        tracing::warn!(
            cache_date = entry.date.as_deref().unwrap_or("none"),
            today = %today,
            "Astro cache is stale"
        );
    }

    let title = entry
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("今日{}运势", ZODIACS[index].1));
    Ok(parse_items(title, &entry.items))
}

/// Like [`load`], but any failure yields [`Fortune::fallback`].
pub async fn zodiac_fortune(path: &Path, zodiac: &str, today: NaiveDate) -> Fortune {
    match load(path, zodiac, today).await {
        Ok(fortune) => fortune,
        Err(e) => {
            tracing::error!(error = %e, zodiac, "Failed to read zodiac fortune");
            Fortune::fallback(zodiac)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
    }

    #[test]
    fn index_defaults_to_aries() {
        assert_eq!(zodiac_index("leo"), 4);
        assert_eq!(zodiac_index("Pisces"), 11);
        assert_eq!(zodiac_index("dragon"), 0);
    }

    #[test]
    fn parses_inline_and_next_line_content() {
        let fortune = parse_items(
            "今日狮子座运势".into(),
            &lines(&[
                "整體運勢★★★★☆：状态不错",
                "愛情運勢★★☆☆☆",
                "容易因为小事闹别扭",
                "事業運勢★★★☆☆",
                "",
                "按部就班",
                "财运运势★★★★★: 有意外之财",
                "无关的一行",
            ]),
        );
        assert_eq!(fortune.overall.rating, "★★★★☆");
        assert_eq!(fortune.overall.content, "状态不错");
        assert_eq!(fortune.love.rating, "★★☆☆☆");
        assert_eq!(fortune.love.content, "容易因为小事闹别扭");
        assert_eq!(fortune.career.content, "按部就班");
        assert_eq!(fortune.wealth.rating, "★★★★★");
        assert_eq!(fortune.wealth.content, "有意外之财");
    }

    #[test]
    fn inline_content_wins_over_next_line() {
        let fortune = parse_items(
            String::new(),
            &lines(&["整体运势★★★☆☆：已有描述", "下一行"]),
        );
        assert_eq!(fortune.overall.content, "已有描述");
    }

    #[tokio::test]
    async fn reads_cache_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("astro_cache.json");
        tokio::fs::write(
            &path,
            r#"{"4":{"title":"","items":["爱情运势★★★★☆：桃花朵朵"],"date":"2025-03-11"}}"#,
        )
        .await
        .unwrap();

        let leo = zodiac_fortune(&path, "leo", today()).await;
        assert_eq!(leo.title, "今日狮子座运势");
        assert_eq!(leo.select(FortuneAspect::Love).content, "桃花朵朵");
        assert_eq!(leo.select(FortuneAspect::Overall).content, PLAIN_OVERALL);

        let missing = zodiac_fortune(&path, "virgo", today()).await;
        assert_eq!(missing, Fortune::fallback("virgo"));
        assert_eq!(missing.title, "今日处女座运势");

        let absent = zodiac_fortune(&dir.path().join("nope.json"), "leo", today()).await;
        assert_eq!(absent.overall.rating, DEFAULT_RATING);
        assert!(absent.overall.content.starts_with("今日运势一般，宜保持平常心"));
    }
}
