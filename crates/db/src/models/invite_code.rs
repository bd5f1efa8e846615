use chrono::DateTime;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};
use ts_rs::TS;

use crate::json_store::LegacyInviteCode;

/// Code seeded into an empty database when there is nothing to import.
pub const DEFAULT_INVITE_CODE: &str = "SOULNOTE2023";
pub const DEFAULT_MAX_USES: i64 = 100;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[sqlx(rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub max_uses: i64,
    pub used_count: i64,
    pub created_at: Option<i64>,
    pub last_used: Option<i64>,
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeWithUsage {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub invite_code: InviteCode,
    #[sqlx(rename = "uniqueIPs")]
    #[serde(rename = "uniqueIPs")]
    pub unique_ips: i64,
}

/// Result of a redemption attempt.
#[derive(Debug, Clone)]
pub enum Redemption {
    Redeemed(InviteCode),
    NotFound,
    Exhausted,
}

impl InviteCode {
    pub async fn find_by_code(pool: &SqlitePool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>("SELECT * FROM invite_codes WHERE code = ?")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// All codes with their distinct-IP count, newest first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<InviteCodeWithUsage>, sqlx::Error> {
        sqlx::query_as::<_, InviteCodeWithUsage>(
            r#"SELECT ic.*,
                      (SELECT COUNT(DISTINCT ipAddress) FROM invite_code_ips WHERE codeId = ic.id) AS uniqueIPs
               FROM invite_codes ic
               ORDER BY ic.createdAt DESC, ic.id DESC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, code: &str, max_uses: i64) -> Result<Self, sqlx::Error> {
        let now = utils::time::now_millis();
        sqlx::query_as::<_, InviteCode>(
            r#"INSERT INTO invite_codes (code, maxUses, usedCount, createdAt)
               VALUES (?, ?, 0, ?)
               RETURNING *"#,
        )
        .bind(code)
        .bind(max_uses)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn update_max_uses(
        pool: &SqlitePool,
        code: &str,
        max_uses: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, InviteCode>(
            "UPDATE invite_codes SET maxUses = ?, updatedAt = ? WHERE code = ? RETURNING *",
        )
        .bind(max_uses)
        .bind(utils::time::now_millis())
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Returns `false` when no such code exists. IP rows cascade.
    pub async fn delete(pool: &SqlitePool, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM invite_codes WHERE code = ?")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Consume one use of `code` on behalf of `ip`.
    ///
    /// The guarded `UPDATE` is the first statement of the transaction, so it
    /// takes SQLite's write lock before anything is read and `usedCount` can
    /// never pass `maxUses`, however many redemptions race.
    pub async fn redeem(pool: &SqlitePool, code: &str, ip: &str) -> Result<Redemption, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let updated = sqlx::query_as::<_, InviteCode>(
            r#"UPDATE invite_codes
               SET usedCount = usedCount + 1, lastUsed = ?
               WHERE code = ? AND usedCount < maxUses
               RETURNING *"#,
        )
        .bind(utils::time::now_millis())
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invite) = updated else {
            let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invite_codes WHERE code = ?")
                .bind(code)
                .fetch_one(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(if exists > 0 {
                Redemption::Exhausted
            } else {
                Redemption::NotFound
            });
        };

        sqlx::query("INSERT OR IGNORE INTO invite_code_ips (codeId, ipAddress) VALUES (?, ?)")
            .bind(invite.id)
            .bind(ip)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Redemption::Redeemed(invite))
    }

    /// Populate an empty table, either from the legacy JSON entries or with
    /// the default code. Returns how many codes were inserted.
    pub async fn seed_if_empty(
        pool: &SqlitePool,
        legacy: Option<Vec<LegacyInviteCode>>,
    ) -> Result<usize, sqlx::Error> {
        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invite_codes")
            .fetch_one(pool)
            .await?;
        if existing > 0 {
            return Ok(0);
        }

        let legacy = legacy.unwrap_or_default();
        if legacy.is_empty() {
            Self::create(pool, DEFAULT_INVITE_CODE, DEFAULT_MAX_USES).await?;
            info!(code = DEFAULT_INVITE_CODE, "seeded default invite code");
            return Ok(1);
        }

        let mut tx = pool.begin().await?;
        let now = utils::time::now_millis();
        for entry in &legacy {
            let max_uses = entry.max_uses.unwrap_or(DEFAULT_MAX_USES);
            let used_count = entry.used_count.clamp(0, max_uses.max(0));
            let created_at = entry.created_at.as_deref().and_then(iso_to_millis).unwrap_or(now);
            let last_used = entry.last_used.as_deref().and_then(iso_to_millis);

            let id = sqlx::query_scalar::<_, i64>(
                r#"INSERT OR IGNORE INTO invite_codes (code, maxUses, usedCount, createdAt, lastUsed)
                   VALUES (?, ?, ?, ?, ?)
                   RETURNING id"#,
            )
            .bind(entry.code.trim())
            .bind(max_uses)
            .bind(used_count)
            .bind(created_at)
            .bind(last_used)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(id) = id else {
                warn!(code = %entry.code, "skipping duplicate legacy invite code");
                continue;
            };
            for ip in &entry.used_ips {
                sqlx::query("INSERT OR IGNORE INTO invite_code_ips (codeId, ipAddress) VALUES (?, ?)")
                    .bind(id)
                    .bind(ip)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;

        info!(count = legacy.len(), "imported legacy invite codes");
        Ok(legacy.len())
    }
}

fn iso_to_millis(raw: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(raw).ok().map(|d| d.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    async fn test_db() -> (DBService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = DBService::new(dir.path()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn default_code_is_seeded_once() {
        let (db, _dir) = test_db().await;
        assert_eq!(InviteCode::seed_if_empty(&db.pool, None).await.unwrap(), 1);
        assert_eq!(InviteCode::seed_if_empty(&db.pool, None).await.unwrap(), 0);

        let code = InviteCode::find_by_code(&db.pool, DEFAULT_INVITE_CODE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(code.max_uses, 100);
        assert_eq!(code.used_count, 0);
    }

    #[tokio::test]
    async fn legacy_entries_are_imported_with_ips() {
        let (db, _dir) = test_db().await;
        let legacy = vec![LegacyInviteCode {
            code: "OLD1".into(),
            created_at: Some("2024-01-01T00:00:00.000Z".into()),
            max_uses: Some(5),
            used_count: 2,
            used_ips: vec!["1.1.1.1".into(), "2.2.2.2".into()],
            last_used: None,
        }];
        assert_eq!(InviteCode::seed_if_empty(&db.pool, Some(legacy)).await.unwrap(), 1);
        assert!(InviteCode::find_by_code(&db.pool, DEFAULT_INVITE_CODE).await.unwrap().is_none());

        let all = InviteCode::find_all(&db.pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].invite_code.used_count, 2);
        assert_eq!(all[0].unique_ips, 2);
        assert_eq!(all[0].invite_code.created_at, Some(1_704_067_200_000));
    }

    #[tokio::test]
    async fn redeem_counts_uses_and_dedups_ips() {
        let (db, _dir) = test_db().await;
        InviteCode::create(&db.pool, "CODE", 3).await.unwrap();

        for ip in ["1.1.1.1", "1.1.1.1", "2.2.2.2"] {
            assert!(matches!(
                InviteCode::redeem(&db.pool, "CODE", ip).await.unwrap(),
                Redemption::Redeemed(_)
            ));
        }
        assert!(matches!(
            InviteCode::redeem(&db.pool, "CODE", "3.3.3.3").await.unwrap(),
            Redemption::Exhausted
        ));
        assert!(matches!(
            InviteCode::redeem(&db.pool, "NOPE", "3.3.3.3").await.unwrap(),
            Redemption::NotFound
        ));

        let all = InviteCode::find_all(&db.pool).await.unwrap();
        assert_eq!(all[0].invite_code.used_count, 3);
        assert_eq!(all[0].unique_ips, 2);
        assert!(all[0].invite_code.last_used.is_some());
    }

    #[tokio::test]
    async fn concurrent_redemptions_never_exceed_max_uses() {
        let (db, _dir) = test_db().await;
        InviteCode::create(&db.pool, "RACE", 2).await.unwrap();
        InviteCode::redeem(&db.pool, "RACE", "0.0.0.0").await.unwrap();

        let (a, b) = tokio::join!(
            InviteCode::redeem(&db.pool, "RACE", "1.1.1.1"),
            InviteCode::redeem(&db.pool, "RACE", "2.2.2.2"),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        let redeemed = outcomes
            .iter()
            .filter(|o| matches!(o, Redemption::Redeemed(_)))
            .count();
        let exhausted = outcomes
            .iter()
            .filter(|o| matches!(o, Redemption::Exhausted))
            .count();
        assert_eq!((redeemed, exhausted), (1, 1));

        let code = InviteCode::find_by_code(&db.pool, "RACE").await.unwrap().unwrap();
        assert_eq!(code.used_count, 2);
    }

    #[tokio::test]
    async fn many_parallel_redemptions_stop_at_limit() {
        let (db, _dir) = test_db().await;
        InviteCode::create(&db.pool, "BULK", 5).await.unwrap();

        let attempts = (0..20).map(|i| {
            let pool = db.pool.clone();
            async move { InviteCode::redeem(&pool, "BULK", &format!("10.0.0.{i}")).await }
        });
        let results = futures::future::join_all(attempts).await;
        let redeemed = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Redemption::Redeemed(_))))
            .count();
        assert_eq!(redeemed, 5);

        let code = InviteCode::find_by_code(&db.pool, "BULK").await.unwrap().unwrap();
        assert_eq!(code.used_count, 5);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (db, _dir) = test_db().await;
        InviteCode::create(&db.pool, "EDIT", 1).await.unwrap();
        InviteCode::redeem(&db.pool, "EDIT", "1.1.1.1").await.unwrap();

        let updated = InviteCode::update_max_uses(&db.pool, "EDIT", 10).await.unwrap().unwrap();
        assert_eq!(updated.max_uses, 10);
        assert!(updated.updated_at.is_some());
        assert!(InviteCode::update_max_uses(&db.pool, "MISSING", 10).await.unwrap().is_none());

        assert!(InviteCode::delete(&db.pool, "EDIT").await.unwrap());
        assert!(!InviteCode::delete(&db.pool, "EDIT").await.unwrap());
        let orphans = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invite_code_ips")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
