use std::{path::Path, str::FromStr, time::Duration};

use sqlx::{
    Error, Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

pub mod json_store;
pub mod models;

/// Name of the SQLite file inside the data directory.
pub const DATABASE_FILE: &str = "soulnote.db";

#[derive(Clone)]
pub struct DBService {
    pub pool: Pool<Sqlite>,
}

impl DBService {
    /// Open (creating if needed) `<data_dir>/soulnote.db` and run migrations.
    pub async fn new(data_dir: &Path) -> Result<DBService, Error> {
        tokio::fs::create_dir_all(data_dir).await?;
        let url = format!("sqlite://{}", data_dir.join(DATABASE_FILE).to_string_lossy());
        Self::connect(&url, 8).await
    }

    async fn connect(url: &str, max_connections: u32) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::debug!(url = %url, "database ready");
        Ok(DBService { pool })
    }

    /// Liveness check run before analytics queries.
    pub async fn is_connected(&self) -> bool {
        match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool).await {
            Ok(v) => v == 1,
            Err(e) => {
                tracing::error!(error = %e, "database connection check failed");
                false
            }
        }
    }
}
