//! Invite-code lifecycle: redemption at login plus the admin operations.

use db::{
    DBService,
    json_store::JsonStore,
    models::invite_code::{DEFAULT_MAX_USES, InviteCode, InviteCodeWithUsage, Redemption},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use utils::{net::mask_ip, time::millis_to_rfc3339};

pub const DEFAULT_PREFIX: &str = "SN";
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_LEN: usize = 8;
const GENERATE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum InviteError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invite code is required")]
    MissingCode,
    #[error("max uses must be a non-negative integer")]
    InvalidMaxUses,
    #[error("invite code not found")]
    NotFound,
    #[error("could not generate a unique invite code")]
    Exhausted,
}

/// Result of checking a code at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    Unknown,
    LimitReached,
}

/// One row of the admin invite-code table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeStat {
    pub code: String,
    pub used_count: i64,
    pub max_uses: i64,
    #[serde(rename = "uniqueIPs")]
    pub unique_ips: i64,
    /// RFC 3339, or `"Never"`.
    pub last_used: String,
    pub created_at: Option<String>,
}

impl From<InviteCodeWithUsage> for InviteCodeStat {
    fn from(row: InviteCodeWithUsage) -> Self {
        let code = row.invite_code;
        Self {
            last_used: code
                .last_used
                .and_then(millis_to_rfc3339)
                .unwrap_or_else(|| "Never".to_string()),
            created_at: code.created_at.and_then(millis_to_rfc3339),
            code: code.code,
            used_count: code.used_count,
            max_uses: code.max_uses,
            unique_ips: row.unique_ips,
        }
    }
}

pub fn random_code<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let suffix: String = (0..RANDOM_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}{suffix}")
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Clone)]
pub struct InviteService {
    db: DBService,
    store: JsonStore,
}

impl InviteService {
    pub fn new(db: DBService, store: JsonStore) -> Self {
        Self { db, store }
    }

    /// Redeem `code` for `ip`. A successful redemption is also recorded in
    /// the user and stats files; failures there are logged, not returned.
    pub async fn verify(&self, code: &str, ip: &str) -> Result<Verification, InviteError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InviteError::MissingCode);
        }
        info!(code, ip = %mask_ip(ip), "Verifying invite code");

        match InviteCode::redeem(&self.db.pool, code, ip).await? {
            Redemption::NotFound => Ok(Verification::Unknown),
            Redemption::Exhausted => {
                info!(code, "Invite code reached its usage limit");
                Ok(Verification::LimitReached)
            }
            Redemption::Redeemed(updated) => {
                info!(
                    code,
                    used_count = updated.used_count,
                    max_uses = updated.max_uses,
                    "Invite code redeemed"
                );
                if let Err(e) = self.store.record_user(ip, code).await {
                    warn!(error = %e, "Failed to record user");
                }
                if let Err(e) = self.store.increment_verifications().await {
                    warn!(error = %e, "Failed to update verification count");
                }
                Ok(Verification::Valid)
            }
        }
    }

    /// Create a code of `prefix` (default `SN`) plus 8 random `[0-9A-Z]`.
    pub async fn generate(
        &self,
        prefix: Option<&str>,
        max_uses: Option<i64>,
    ) -> Result<InviteCode, InviteError> {
        let max_uses = max_uses.unwrap_or(DEFAULT_MAX_USES);
        if max_uses < 0 {
            return Err(InviteError::InvalidMaxUses);
        }
        let prefix = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PREFIX);

        for _ in 0..GENERATE_ATTEMPTS {
            let candidate = random_code(prefix, &mut rand::thread_rng());
            match InviteCode::create(&self.db.pool, &candidate, max_uses).await {
                Ok(code) => {
                    info!(code = %code.code, max_uses, "Generated invite code");
                    return Ok(code);
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(code = %candidate, "Generated invite code collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(InviteError::Exhausted)
    }

    pub async fn edit(&self, code: &str, new_max_uses: Option<i64>) -> Result<InviteCode, InviteError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InviteError::MissingCode);
        }
        let max_uses = new_max_uses
            .filter(|n| *n >= 0)
            .ok_or(InviteError::InvalidMaxUses)?;
        let updated = InviteCode::update_max_uses(&self.db.pool, code, max_uses)
            .await?
            .ok_or(InviteError::NotFound)?;
        info!(code, max_uses, "Updated invite code");
        Ok(updated)
    }

    pub async fn delete(&self, code: &str) -> Result<(), InviteError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(InviteError::MissingCode);
        }
        if !InviteCode::delete(&self.db.pool, code).await? {
            return Err(InviteError::NotFound);
        }
        info!(code, "Deleted invite code");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<InviteCodeStat>, InviteError> {
        let rows = InviteCode::find_all(&self.db.pool).await?;
        Ok(rows.into_iter().map(InviteCodeStat::from).collect())
    }

    pub async fn codes(&self) -> Result<Vec<String>, InviteError> {
        Ok(InviteCode::find_all(&self.db.pool)
            .await?
            .into_iter()
            .map(|row| row.invite_code.code)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use db::models::invite_code::DEFAULT_INVITE_CODE;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    async fn service() -> (InviteService, JsonStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = DBService::new(dir.path()).await.unwrap();
        let store = JsonStore::new(dir.path());
        store.init().await.unwrap();
        InviteCode::seed_if_empty(&db.pool, None).await.unwrap();
        (InviteService::new(db, store.clone()), store, dir)
    }

    #[test]
    fn random_codes_use_upper_alphanumerics() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = random_code("SN", &mut rng);
        assert_eq!(code.len(), 10);
        assert!(code.starts_with("SN"));
        assert!(
            code[2..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[tokio::test]
    async fn verify_records_user_and_stats() {
        let (svc, store, _dir) = service().await;

        assert_eq!(
            svc.verify(&format!(" {DEFAULT_INVITE_CODE} "), "10.0.0.1").await.unwrap(),
            Verification::Valid
        );
        assert_eq!(svc.verify("NOPE", "10.0.0.1").await.unwrap(), Verification::Unknown);
        assert!(matches!(svc.verify("  ", "10.0.0.1").await, Err(InviteError::MissingCode)));

        let users = store.load_users().await;
        assert_eq!(users.users.len(), 1);
        let stats = store.load_stats().await;
        assert_eq!(stats.total_verifications, 1);
        assert_eq!(stats.total_unique_users, 1);

        let listed = svc.list().await.unwrap();
        assert_eq!(listed[0].used_count, 1);
        assert_eq!(listed[0].unique_ips, 1);
        assert_ne!(listed[0].last_used, "Never");
    }

    #[tokio::test]
    async fn limit_is_enforced() {
        let (svc, _store, _dir) = service().await;
        let code = svc.generate(Some("VIP"), Some(1)).await.unwrap();
        assert!(code.code.starts_with("VIP"));

        assert_eq!(svc.verify(&code.code, "1.1.1.1").await.unwrap(), Verification::Valid);
        assert_eq!(
            svc.verify(&code.code, "2.2.2.2").await.unwrap(),
            Verification::LimitReached
        );

        let zero = svc.generate(None, Some(0)).await.unwrap();
        assert!(zero.code.starts_with(DEFAULT_PREFIX));
        assert_eq!(
            svc.verify(&zero.code, "1.1.1.1").await.unwrap(),
            Verification::LimitReached
        );
    }

    #[tokio::test]
    async fn edit_and_delete() {
        let (svc, _store, _dir) = service().await;
        assert!(matches!(
            svc.edit(DEFAULT_INVITE_CODE, Some(-1)).await,
            Err(InviteError::InvalidMaxUses)
        ));
        assert!(matches!(
            svc.edit(DEFAULT_INVITE_CODE, None).await,
            Err(InviteError::InvalidMaxUses)
        ));
        assert!(matches!(svc.edit("NOPE", Some(3)).await, Err(InviteError::NotFound)));
        assert_eq!(svc.edit(DEFAULT_INVITE_CODE, Some(3)).await.unwrap().max_uses, 3);

        assert!(matches!(svc.delete("NOPE").await, Err(InviteError::NotFound)));
        svc.delete(DEFAULT_INVITE_CODE).await.unwrap();
        assert!(svc.codes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_negative_max_uses() {
        let (svc, _store, _dir) = service().await;
        assert!(matches!(
            svc.generate(None, Some(-5)).await,
            Err(InviteError::InvalidMaxUses)
        ));
    }
}
