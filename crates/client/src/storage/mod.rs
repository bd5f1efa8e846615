//! Per-user persistence written to two backends. Each record carries a
//! revision; reads prefer the newer copy and repair the other one.

use std::{path::Path, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub mod backend;
pub mod models;

pub use backend::{JsonFileBackend, MemoryBackend, SqliteBackend, StorageBackend, StorageError};
pub use models::{ApiSettings, Flag, MAX_SAVED_NOTES, Record, SavedNote, Store, UserPreferences};

#[derive(Clone)]
pub struct StorageService {
    user_id: String,
    primary: Arc<dyn StorageBackend>,
    mirror: Arc<dyn StorageBackend>,
}

impl StorageService {
    pub fn new(
        user_id: impl Into<String>,
        primary: Arc<dyn StorageBackend>,
        mirror: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            primary,
            mirror,
        }
    }

    /// SQLite at `db_path` mirrored to JSON files in `mirror_dir`. If the
    /// database cannot be opened the service runs on the mirror alone.
    pub async fn open(user_id: impl Into<String>, db_path: &Path, mirror_dir: &Path) -> Self {
        let mirror: Arc<dyn StorageBackend> = Arc::new(JsonFileBackend::new(mirror_dir));
        let primary: Arc<dyn StorageBackend> = match SqliteBackend::open(db_path).await {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                warn!(path = %db_path.display(), error = %e, "Client database unavailable, using memory");
                Arc::new(MemoryBackend::new())
            }
        };
        Self::new(user_id, primary, mirror)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn read(&self, store: Store) -> Option<Record> {
        let key = self.user_id.as_str();
        let (primary, mirror) = tokio::join!(
            self.primary.get(store, key),
            self.mirror.get(store, key)
        );
        let primary = primary
            .inspect_err(|e| warn!(%store, backend = self.primary.name(), error = %e, "Read failed"))
            .ok();
        let mirror = mirror
            .inspect_err(|e| warn!(%store, backend = self.mirror.name(), error = %e, "Read failed"))
            .ok();

        match (primary, mirror) {
            (None, None) => None,
            (Some(p), None) => p,
            (None, Some(m)) => m,
            (Some(p), Some(m)) => {
                let p_rev = p.as_ref().map(|r| r.revision);
                let m_rev = m.as_ref().map(|r| r.revision);
                if p_rev > m_rev {
                    let record = p?;
                    self.heal(&*self.mirror, store, &record).await;
                    Some(record)
                } else if m_rev > p_rev {
                    let record = m?;
                    self.heal(&*self.primary, store, &record).await;
                    Some(record)
                } else {
                    p
                }
            }
        }
    }

    async fn heal(&self, backend: &dyn StorageBackend, store: Store, record: &Record) {
        debug!(%store, backend = backend.name(), revision = record.revision, "Repairing stale copy");
        if let Err(e) = backend.put(store, &self.user_id, record).await {
            warn!(%store, backend = backend.name(), error = %e, "Repair failed");
        }
    }

    async fn write(&self, store: Store, value: Value) -> bool {
        let revision = self.read(store).await.map_or(0, |r| r.revision) + 1;
        let record = Record { revision, value };

        if let Err(e) = self.primary.put(store, &self.user_id, &record).await {
            warn!(%store, backend = self.primary.name(), error = %e, "Write failed, using mirror only");
            return match self.mirror.put(store, &self.user_id, &record).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(%store, backend = self.mirror.name(), error = %e, "Mirror write failed");
                    false
                }
            };
        }
        if let Err(e) = self.mirror.put(store, &self.user_id, &record).await {
            warn!(%store, backend = self.mirror.name(), error = %e, "Mirror write failed");
        }
        true
    }

    async fn read_as<T: DeserializeOwned>(&self, store: Store) -> Option<T> {
        let record = self.read(store).await?;
        serde_json::from_value(record.value)
            .inspect_err(|e| warn!(%store, error = %e, "Stored value has unexpected shape"))
            .ok()
    }

    async fn write_as<T: Serialize>(&self, store: Store, value: &T) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.write(store, value).await,
            Err(e) => {
                warn!(%store, error = %e, "Failed to serialize value");
                false
            }
        }
    }

    pub async fn get_preferences(&self) -> UserPreferences {
        self.read_as(Store::Preferences).await.unwrap_or_default()
    }

    pub async fn save_preferences(&self, preferences: &UserPreferences) -> bool {
        self.write_as(Store::Preferences, preferences).await
    }

    pub async fn get_api_settings(&self) -> Option<ApiSettings> {
        self.read_as(Store::Settings).await
    }

    pub async fn save_api_settings(&self, settings: &ApiSettings) -> bool {
        self.write_as(Store::Settings, settings).await
    }

    pub async fn get_flag(&self, flag: Flag) -> bool {
        self.read_as::<Map<String, Value>>(Store::Flags)
            .await
            .and_then(|flags| flags.get(flag.as_ref()).and_then(Value::as_bool))
            .unwrap_or(false)
    }

    pub async fn set_flag(&self, flag: Flag, value: bool) -> bool {
        let mut flags = self
            .read_as::<Map<String, Value>>(Store::Flags)
            .await
            .unwrap_or_default();
        flags.insert(flag.to_string(), Value::Bool(value));
        self.write(Store::Flags, Value::Object(flags)).await
    }

    /// Newest first.
    pub async fn get_saved_notes(&self) -> Vec<SavedNote> {
        self.read_as(Store::Notes).await.unwrap_or_default()
    }

    /// Prepend a note, evicting the oldest beyond [`MAX_SAVED_NOTES`].
    pub async fn save_note(&self, content: &str, metadata: Value) -> Option<SavedNote> {
        let mut notes = self.get_saved_notes().await;
        let now = chrono::Utc::now();

        let base = now.timestamp_millis().to_string();
        let mut id = base.clone();
        let mut suffix = 1;
        while notes.iter().any(|n| n.id == id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }

        let note = SavedNote {
            id,
            user_id: self.user_id.clone(),
            content: content.to_string(),
            saved_at: now.to_rfc3339(),
            metadata,
        };
        notes.insert(0, note.clone());
        notes.truncate(MAX_SAVED_NOTES);
        self.write_as(Store::Notes, &notes).await.then_some(note)
    }

    /// Replace the note with the same id.
    pub async fn update_saved_note(&self, note: &SavedNote) -> bool {
        let mut notes = self.get_saved_notes().await;
        let Some(slot) = notes.iter_mut().find(|n| n.id == note.id) else {
            return false;
        };
        *slot = note.clone();
        self.write_as(Store::Notes, &notes).await
    }

    pub async fn delete_note(&self, id: &str) -> bool {
        let mut notes = self.get_saved_notes().await;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return false;
        }
        self.write_as(Store::Notes, &notes).await
    }

    pub async fn clear_saved_notes(&self) -> bool {
        self.write_as(Store::Notes, &Vec::<SavedNote>::new()).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;

    struct Offline;

    #[async_trait]
    impl StorageBackend for Offline {
        fn name(&self) -> &'static str {
            "offline"
        }
        async fn get(&self, _: Store, _: &str) -> Result<Option<Record>, StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        async fn put(&self, _: Store, _: &str, _: &Record) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
        async fn delete(&self, _: Store, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    fn memory_service() -> (StorageService, MemoryBackend, MemoryBackend) {
        let primary = MemoryBackend::new();
        let mirror = MemoryBackend::new();
        let service = StorageService::new("u1", Arc::new(primary.clone()), Arc::new(mirror.clone()));
        (service, primary, mirror)
    }

    #[tokio::test]
    async fn preferences_default_until_saved() {
        let (service, _, _) = memory_service();
        let prefs = service.get_preferences().await;
        assert_eq!(prefs.language, "zh");
        assert_eq!(prefs.font_size, 24);
        assert_eq!(prefs.background, "paper-1");

        let dark = UserPreferences {
            theme: "dark".into(),
            ..prefs
        };
        assert!(service.save_preferences(&dark).await);
        assert_eq!(service.get_preferences().await, dark);
    }

    #[tokio::test]
    async fn preferences_keep_profile_fields() {
        let (service, primary, _) = memory_service();
        let mut prefs = UserPreferences {
            zodiac: Some("leo".into()),
            mbti: Some("INTJ".into()),
            gender: Some("female".into()),
            nickname: Some("小星".into()),
            savage_mode: true,
            ..UserPreferences::default()
        };
        prefs.extra.insert("onboardingVersion".into(), json!("1.2.0"));
        assert!(service.save_preferences(&prefs).await);

        let stored = primary.get(Store::Preferences, "u1").await.unwrap().unwrap();
        assert_eq!(stored.value["zodiac"], "leo");
        assert_eq!(stored.value["savageMode"], true);
        assert_eq!(stored.value["onboardingVersion"], "1.2.0");

        let read = service.get_preferences().await;
        assert_eq!(read, prefs);
        assert_eq!(read.age, None);
    }

    #[tokio::test]
    async fn notes_are_capped_newest_first() {
        let (service, _, _) = memory_service();
        for i in 0..(MAX_SAVED_NOTES + 3) {
            service.save_note(&format!("note {i}"), json!({})).await.unwrap();
        }
        let notes = service.get_saved_notes().await;
        assert_eq!(notes.len(), MAX_SAVED_NOTES);
        assert_eq!(notes[0].content, format!("note {}", MAX_SAVED_NOTES + 2));
        assert_eq!(notes.last().unwrap().content, "note 3");

        let mut ids: Vec<_> = notes.iter().map(|n| n.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), MAX_SAVED_NOTES);
    }

    #[tokio::test]
    async fn update_and_delete_by_id() {
        let (service, _, _) = memory_service();
        let mut note = service.save_note("first", json!({"theme": "daily"})).await.unwrap();
        note.content = "edited".into();
        assert!(service.update_saved_note(&note).await);
        assert_eq!(service.get_saved_notes().await[0].content, "edited");

        assert!(!service.delete_note("missing").await);
        assert!(service.delete_note(&note.id).await);
        assert!(service.get_saved_notes().await.is_empty());

        service.save_note("again", json!({})).await.unwrap();
        assert!(service.clear_saved_notes().await);
        assert!(service.get_saved_notes().await.is_empty());
    }

    #[tokio::test]
    async fn newer_mirror_wins_and_heals_primary() {
        let (service, primary, mirror) = memory_service();
        primary
            .put(Store::Flags, "u1", &Record { revision: 1, value: json!({"invite-verified": false}) })
            .await
            .unwrap();
        mirror
            .put(Store::Flags, "u1", &Record { revision: 4, value: json!({"invite-verified": true}) })
            .await
            .unwrap();

        assert!(service.get_flag(Flag::InviteVerified).await);
        assert_eq!(primary.get(Store::Flags, "u1").await.unwrap().unwrap().revision, 4);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_to_mirror() {
        let mirror = MemoryBackend::new();
        let service = StorageService::new("u1", Arc::new(Offline), Arc::new(mirror.clone()));

        assert!(service.set_flag(Flag::OnboardingComplete, true).await);
        assert!(service.get_flag(Flag::OnboardingComplete).await);
        assert!(mirror.get(Store::Flags, "u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn everything_offline_degrades_quietly() {
        let service = StorageService::new("u1", Arc::new(Offline), Arc::new(Offline));
        assert!(!service.save_preferences(&UserPreferences::default()).await);
        assert!(service.save_note("x", json!({})).await.is_none());
        assert!(service.get_saved_notes().await.is_empty());
        assert!(service.get_api_settings().await.is_none());
        assert!(!service.get_flag(Flag::InviteVerified).await);
    }

    #[tokio::test]
    async fn sqlite_with_json_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            StorageService::open("u1", &dir.path().join("client.db"), &dir.path().join("mirror")).await;
        let settings = ApiSettings {
            api_url: "http://localhost:4000".into(),
            api_key: "k".into(),
            model: "deepseek-chat".into(),
        };
        assert!(service.save_api_settings(&settings).await);
        assert!(dir.path().join("mirror").join("settings.json").exists());

        let reopened =
            StorageService::open("u1", &dir.path().join("client.db"), &dir.path().join("mirror")).await;
        assert_eq!(reopened.get_api_settings().await, Some(settings));
    }
}
