//! Anonymous, stable per-device user ids spread over several key/value media
//! so that clearing one of them does not lose the identity.

use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const USER_ID_KEY: &str = "soul-note-user-id";
pub const COOKIE_KEY: &str = "snuid";
pub const SESSION_BACKUP_KEY: &str = "soul-note-backup-id";
pub const STORAGE_PREFIX: &str = "soul-note-user-";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("medium unavailable: {0}")]
    Unavailable(String),
}

/// A browser-like string store (local storage, session storage, cookies).
#[async_trait]
pub trait KeyValueMedium: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), IdentityError>;
    async fn remove(&self, key: &str) -> Result<(), IdentityError>;
    async fn keys(&self) -> Result<Vec<String>, IdentityError>;
}

/// Process-lifetime medium, used for "session" storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryMedium {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueMedium for MemoryMedium {
    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), IdentityError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), IdentityError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, IdentityError> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }
}

/// Durable medium backed by a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileMedium {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, IdentityError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, map: &BTreeMap<String, String>) -> Result<(), IdentityError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(map)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| IdentityError::Io(e.error))?;
            Ok::<_, IdentityError>(())
        })
        .await?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KeyValueMedium for FileMedium {
    async fn get(&self, key: &str) -> Result<Option<String>, IdentityError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), IdentityError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), IdentityError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load().await?;
        if map.remove(key).is_some() {
            self.save(&map).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, IdentityError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_keys().collect())
    }
}

/// Render like JavaScript's `Number.prototype.toString(36)`.
pub fn to_base36(n: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let negative = n < 0;
    let mut value = n.unsigned_abs();
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// 32-bit `h = (h << 5) - h + c` over the UTF-16 units of `agent`.
pub fn agent_hash(agent: &str) -> String {
    let hash = agent
        .encode_utf16()
        .fold(0i32, |h, c| (h << 5).wrapping_sub(h).wrapping_add(c as i32));
    to_base36(hash as i64)
}

fn random_base36<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    (0..len)
        .map(|_| DIGITS[rng.gen_range(0..DIGITS.len())] as char)
        .collect()
}

pub struct UserIdentifier {
    local: Arc<dyn KeyValueMedium>,
    session: Arc<dyn KeyValueMedium>,
    cookie: Arc<dyn KeyValueMedium>,
    fingerprint: Option<String>,
    user_agent: String,
}

impl UserIdentifier {
    pub fn new(
        local: Arc<dyn KeyValueMedium>,
        session: Arc<dyn KeyValueMedium>,
        cookie: Arc<dyn KeyValueMedium>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            local,
            session,
            cookie,
            fingerprint: None,
            user_agent: user_agent.into(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into()).filter(|f| !f.is_empty());
        self
    }

    fn slots(&self) -> [(&dyn KeyValueMedium, &'static str); 3] {
        [
            (self.local.as_ref(), USER_ID_KEY),
            (self.cookie.as_ref(), COOKIE_KEY),
            (self.session.as_ref(), SESSION_BACKUP_KEY),
        ]
    }

    pub fn generate_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let random = random_base36(&mut rng, 11);
        let timestamp = to_base36(chrono::Utc::now().timestamp_millis());
        let agent = agent_hash(&self.user_agent);
        match &self.fingerprint {
            Some(fp) => format!("{fp}-{random}-{timestamp}-{agent}"),
            None => format!("{random}-{timestamp}-{agent}"),
        }
    }

    /// The stored id from local, cookie or session (in that order), else a
    /// new one. Whatever is found is written back to every medium. When no
    /// medium is readable a throwaway `temp-` id is returned.
    pub async fn get_or_create_user_id(&self) -> String {
        let mut found = None;
        let mut readable = 0;
        for (medium, key) in self.slots() {
            match medium.get(key).await {
                Ok(value) => {
                    readable += 1;
                    if found.is_none() {
                        found = value.filter(|v| !v.is_empty());
                    }
                }
                Err(e) => warn!(key, error = %e, "Failed to read user id"),
            }
        }

        if readable == 0 {
            let temp = format!("temp-{}", random_base36(&mut rand::thread_rng(), 11));
            warn!(user_id = %temp, "No storage medium available, using temporary user id");
            return temp;
        }

        let id = match found {
            Some(id) => id,
            None => {
                let id = self.generate_id();
                debug!(user_id = %id, "Generated new user id");
                id
            }
        };
        for (medium, key) in self.slots() {
            if let Err(e) = medium.set(key, &id).await {
                warn!(key, error = %e, "Failed to persist user id");
            }
        }
        id
    }

    pub async fn user_storage_key(&self, key: &str) -> String {
        let id = self.get_or_create_user_id().await;
        format!("{STORAGE_PREFIX}{id}-{key}")
    }

    /// Remove the user's namespaced local keys and the id from every medium.
    pub async fn reset_user_id(&self) -> bool {
        let mut ok = true;
        match self.local.get(USER_ID_KEY).await {
            Ok(Some(id)) => {
                let prefix = format!("{STORAGE_PREFIX}{id}");
                match self.local.keys().await {
                    Ok(keys) => {
                        for key in keys.iter().filter(|k| k.starts_with(&prefix)) {
                            if let Err(e) = self.local.remove(key).await {
                                warn!(key = %key, error = %e, "Failed to remove user key");
                                ok = false;
                            }
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to list local keys");
                        ok = false;
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read user id");
                ok = false;
            }
        }
        for (medium, key) in self.slots() {
            if let Err(e) = medium.remove(key).await {
                warn!(key, error = %e, "Failed to remove user id");
                ok = false;
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenMedium;

    #[async_trait]
    impl KeyValueMedium for BrokenMedium {
        async fn get(&self, _key: &str) -> Result<Option<String>, IdentityError> {
            Err(IdentityError::Unavailable("disabled".into()))
        }
        async fn set(&self, _key: &str, _value: &str) -> Result<(), IdentityError> {
            Err(IdentityError::Unavailable("disabled".into()))
        }
        async fn remove(&self, _key: &str) -> Result<(), IdentityError> {
            Err(IdentityError::Unavailable("disabled".into()))
        }
        async fn keys(&self) -> Result<Vec<String>, IdentityError> {
            Err(IdentityError::Unavailable("disabled".into()))
        }
    }

    fn identifier(
        local: Arc<dyn KeyValueMedium>,
        session: Arc<dyn KeyValueMedium>,
        cookie: Arc<dyn KeyValueMedium>,
    ) -> UserIdentifier {
        UserIdentifier::new(local, session, cookie, "Mozilla/5.0 test")
    }

    #[test]
    fn base36_matches_javascript() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(-71), "-1z");
    }

    #[test]
    fn agent_hash_wraps_at_32_bits() {
        // "a" -> 97, "ab" -> 97 * 31 + 98 = 3105
        assert_eq!(agent_hash("a"), to_base36(97));
        assert_eq!(agent_hash("ab"), to_base36(3105));
        let long = "x".repeat(1000);
        assert!(agent_hash(&long).len() <= 7);
    }

    #[tokio::test]
    async fn id_is_stable_and_mirrored() {
        let local = Arc::new(MemoryMedium::new());
        let session = Arc::new(MemoryMedium::new());
        let cookie = Arc::new(MemoryMedium::new());
        let ids = identifier(local.clone(), session.clone(), cookie.clone()).with_fingerprint("fp");

        let first = ids.get_or_create_user_id().await;
        assert!(first.starts_with("fp-"));
        assert!(first.split('-').count() >= 4);
        assert_eq!(ids.get_or_create_user_id().await, first);
        assert_eq!(session.get(SESSION_BACKUP_KEY).await.unwrap(), Some(first.clone()));
        assert_eq!(cookie.get(COOKIE_KEY).await.unwrap(), Some(first.clone()));
    }

    #[tokio::test]
    async fn recovers_from_cookie_when_local_is_cleared() {
        let local = Arc::new(MemoryMedium::new());
        let session = Arc::new(MemoryMedium::new());
        let cookie = Arc::new(MemoryMedium::new());
        cookie.set(COOKIE_KEY, "from-cookie").await.unwrap();
        session.set(SESSION_BACKUP_KEY, "from-session").await.unwrap();

        let ids = identifier(local.clone(), session.clone(), cookie);
        assert_eq!(ids.get_or_create_user_id().await, "from-cookie");
        assert_eq!(local.get(USER_ID_KEY).await.unwrap().as_deref(), Some("from-cookie"));
        assert_eq!(
            session.get(SESSION_BACKUP_KEY).await.unwrap().as_deref(),
            Some("from-cookie")
        );
    }

    #[tokio::test]
    async fn all_media_broken_yields_temp_id() {
        let ids = identifier(
            Arc::new(BrokenMedium),
            Arc::new(BrokenMedium),
            Arc::new(BrokenMedium),
        );
        assert!(ids.get_or_create_user_id().await.starts_with("temp-"));
    }

    #[tokio::test]
    async fn reset_clears_namespaced_keys() {
        let dir = tempfile::tempdir().unwrap();
        let local = Arc::new(FileMedium::new(dir.path().join("local.json")));
        let ids = identifier(
            local.clone(),
            Arc::new(MemoryMedium::new()),
            Arc::new(MemoryMedium::new()),
        );

        let key = ids.user_storage_key("notes").await;
        let id = local.get(USER_ID_KEY).await.unwrap().unwrap();
        assert_eq!(key, format!("soul-note-user-{id}-notes"));
        local.set(&key, "[]").await.unwrap();
        local.set("unrelated", "1").await.unwrap();

        assert!(ids.reset_user_id().await);
        assert_eq!(local.keys().await.unwrap(), vec!["unrelated".to_string()]);
        assert_ne!(ids.get_or_create_user_id().await, id);
    }

    #[tokio::test]
    async fn file_medium_replaces_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("local.json");
        let medium = FileMedium::new(&path);
        medium.set("a", "1").await.unwrap();
        medium.set("b", "2").await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let map: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(map.len(), 2);
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("local.json")]);
    }
}
