//! File-backed bookkeeping kept for compatibility with the existing data
//! directory: `users.json`, `stats.json` and the read-only legacy
//! `invite-codes.json` import.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use ts_rs::TS;

pub const USERS_FILE: &str = "users.json";
pub const STATS_FILE: &str = "stats.json";
pub const LEGACY_INVITE_CODES_FILE: &str = "invite-codes.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// ISO-8601 timestamp in the same shape the front-end already parses.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub ip: String,
    #[serde(default)]
    pub invite_codes: Vec<String>,
    pub first_seen: String,
    pub last_login: String,
    #[serde(default)]
    pub login_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersFile {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    #[serde(default)]
    pub total_verifications: u64,
    #[serde(default)]
    pub total_unique_users: u64,
    #[serde(default)]
    pub total_generated_notes: u64,
    #[serde(default = "iso_now")]
    pub last_updated: String,
}

impl Default for SystemStats {
    fn default() -> Self {
        Self {
            total_verifications: 0,
            total_unique_users: 0,
            total_generated_notes: 0,
            last_updated: iso_now(),
        }
    }
}

/// One entry of the old `invite-codes.json` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyInviteCode {
    pub code: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    #[serde(default, rename = "usedIPs")]
    pub used_ips: Vec<String>,
    #[serde(default)]
    pub last_used: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyInviteCodesFile {
    #[serde(default)]
    codes: Vec<LegacyInviteCode>,
}

/// Outcome of [`JsonStore::record_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserVisit {
    New,
    Returning,
}

#[derive(Clone)]
pub struct JsonStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the data directory and any missing file with its default content.
    pub async fn init(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let _guard = self.lock.lock().await;

        let users = self.dir.join(USERS_FILE);
        if !tokio::fs::try_exists(&users).await? {
            write_atomic(&users, &UsersFile::default()).await?;
            info!(path = %users.display(), "created users file");
        }
        let stats = self.dir.join(STATS_FILE);
        if !tokio::fs::try_exists(&stats).await? {
            write_atomic(&stats, &SystemStats::default()).await?;
            info!(path = %stats.display(), "created stats file");
        }
        Ok(())
    }

    pub async fn load_users(&self) -> UsersFile {
        read_or_default(&self.dir.join(USERS_FILE)).await
    }

    pub async fn load_stats(&self) -> SystemStats {
        read_or_default(&self.dir.join(STATS_FILE)).await
    }

    /// Add or refresh the user keyed by `ip`; a first visit also bumps
    /// `totalUniqueUsers`.
    pub async fn record_user(&self, ip: &str, invite_code: &str) -> Result<UserVisit, StoreError> {
        let _guard = self.lock.lock().await;
        let path = self.dir.join(USERS_FILE);
        let mut users: UsersFile = read_or_default(&path).await;
        let now = iso_now();
        let masked = utils::net::mask_ip(ip);

        let visit = match users.users.iter_mut().find(|u| u.ip == ip) {
            Some(user) => {
                user.last_login = now;
                user.login_count += 1;
                if !user.invite_codes.iter().any(|c| c == invite_code) {
                    user.invite_codes.push(invite_code.to_string());
                    info!(ip = %masked, invite_code, login_count = user.login_count, "added invite code to existing user");
                } else {
                    info!(ip = %masked, login_count = user.login_count, "returning user logged in");
                }
                UserVisit::Returning
            }
            None => {
                users.users.push(UserRecord {
                    ip: ip.to_string(),
                    invite_codes: vec![invite_code.to_string()],
                    first_seen: now.clone(),
                    last_login: now,
                    login_count: 1,
                });
                info!(user_count = users.users.len(), invite_code, "added new user");
                UserVisit::New
            }
        };

        write_atomic(&path, &users).await?;
        if visit == UserVisit::New {
            self.update_stats_locked(|s| s.total_unique_users += 1).await?;
        }
        Ok(visit)
    }

    pub async fn increment_verifications(&self) -> Result<SystemStats, StoreError> {
        let _guard = self.lock.lock().await;
        self.update_stats_locked(|s| s.total_verifications += 1).await
    }

    pub async fn record_generated_note(&self) -> Result<u64, StoreError> {
        let _guard = self.lock.lock().await;
        let stats = self
            .update_stats_locked(|s| s.total_generated_notes += 1)
            .await?;
        debug!(total_notes = stats.total_generated_notes, "recorded generated note");
        Ok(stats.total_generated_notes)
    }

    /// Entries of the old invite-code file, if one is present and readable.
    pub async fn load_legacy_invite_codes(&self) -> Option<Vec<LegacyInviteCode>> {
        let path = self.dir.join(LEGACY_INVITE_CODES_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<LegacyInviteCodesFile>(&raw) {
                Ok(file) => Some(file.codes),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "legacy invite code file is malformed");
                    None
                }
            },
            Err(_) => None,
        }
    }

    // Caller holds `self.lock`.
    async fn update_stats_locked(
        &self,
        f: impl FnOnce(&mut SystemStats),
    ) -> Result<SystemStats, StoreError> {
        let path = self.dir.join(STATS_FILE);
        let mut stats: SystemStats = read_or_default(&path).await;
        f(&mut stats);
        stats.last_updated = iso_now();
        write_atomic(&path, &stats).await?;
        Ok(stats)
    }
}

async fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            error!(path = %path.display(), error = %e, "failed to read data file");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        error!(path = %path.display(), error = %e, "failed to parse data file");
        T::default()
    })
}

async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let body = serde_json::to_vec_pretty(value)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Persist {
            path: path.clone(),
            source: e.error,
        })?;
        Ok::<_, StoreError>(())
    })
    .await?
}
