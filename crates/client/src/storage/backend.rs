use std::{
    collections::BTreeMap,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use sqlx::{
    Pool, Sqlite, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use thiserror::Error;
use tokio::sync::Mutex;

use super::models::{Record, Store};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn get(&self, store: Store, key: &str) -> Result<Option<Record>, StorageError>;
    async fn put(&self, store: Store, key: &str, record: &Record) -> Result<(), StorageError>;
    async fn delete(&self, store: Store, key: &str) -> Result<(), StorageError>;
}

#[derive(Clone)]
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
}

impl SqliteBackend {
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let url = format!("sqlite://{}", path.to_string_lossy());
        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, store: Store, key: &str) -> Result<Option<Record>, StorageError> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT revision, value FROM kv WHERE store = ? AND key = ?",
        )
        .bind(store.as_ref())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(revision, value)| {
            Ok(Record {
                revision,
                value: serde_json::from_str(&value)?,
            })
        })
        .transpose()
    }

    async fn put(&self, store: Store, key: &str, record: &Record) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv (store, key, revision, value) VALUES (?, ?, ?, ?)
             ON CONFLICT(store, key) DO UPDATE SET revision = excluded.revision, value = excluded.value",
        )
        .bind(store.as_ref())
        .bind(key)
        .bind(record.revision)
        .bind(serde_json::to_string(&record.value)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, store: Store, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv WHERE store = ? AND key = ?")
            .bind(store.as_ref())
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// One `<dir>/<store>.json` object per store, keyed by record key.
#[derive(Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    fn path(&self, store: Store) -> PathBuf {
        self.dir.join(format!("{store}.json"))
    }

    async fn load(&self, store: Store) -> Result<BTreeMap<String, Record>, StorageError> {
        match tokio::fs::read(self.path(store)).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, store: Store, map: &BTreeMap<String, Record>) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let body = serde_json::to_vec_pretty(map)?;
        let path = self.path(store);
        tokio::task::spawn_blocking(move || {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&body)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
            Ok::<_, StorageError>(())
        })
        .await?
    }
}

#[async_trait]
impl StorageBackend for JsonFileBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn get(&self, store: Store, key: &str) -> Result<Option<Record>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.load(store).await?.remove(key))
    }

    async fn put(&self, store: Store, key: &str, record: &Record) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load(store).await?;
        map.insert(key.to_string(), record.clone());
        self.save(store, &map).await
    }

    async fn delete(&self, store: Store, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut map = self.load(store).await?;
        if map.remove(key).is_some() {
            self.save(store, &map).await?;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    records: Arc<DashMap<(Store, String), Record>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, store: Store, key: &str) -> Result<Option<Record>, StorageError> {
        Ok(self
            .records
            .get(&(store, key.to_string()))
            .map(|r| r.value().clone()))
    }

    async fn put(&self, store: Store, key: &str, record: &Record) -> Result<(), StorageError> {
        self.records.insert((store, key.to_string()), record.clone());
        Ok(())
    }

    async fn delete(&self, store: Store, key: &str) -> Result<(), StorageError> {
        self.records.remove(&(store, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn sqlite_upserts_by_store_and_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = SqliteBackend::open(&dir.path().join("client.db")).await.unwrap();

        let first = Record { revision: 1, value: json!({"a": 1}) };
        backend.put(Store::Notes, "u1", &first).await.unwrap();
        let second = Record { revision: 2, value: json!([1, 2]) };
        backend.put(Store::Notes, "u1", &second).await.unwrap();

        assert_eq!(backend.get(Store::Notes, "u1").await.unwrap(), Some(second));
        assert_eq!(backend.get(Store::Flags, "u1").await.unwrap(), None);

        backend.delete(Store::Notes, "u1").await.unwrap();
        assert_eq!(backend.get(Store::Notes, "u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn json_files_are_split_per_store() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileBackend::new(dir.path());
        let record = Record { revision: 3, value: json!("dark") };
        backend.put(Store::Settings, "u1", &record).await.unwrap();

        assert!(dir.path().join("settings.json").exists());
        assert!(!dir.path().join("notes.json").exists());
        assert_eq!(backend.get(Store::Settings, "u1").await.unwrap(), Some(record));
    }
}
