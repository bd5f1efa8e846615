use std::{sync::Arc, time::Duration};

use db::{DBService, json_store::JsonStore, models::invite_code::InviteCode};
use services::services::{
    analytics::AnalyticsService,
    chat_api::ChatApiClient,
    invites::InviteService,
    note_generator::NoteGenerator,
    prompt::builder::PromptBuilder,
    rate_limit::RateLimiter,
    user_stats::UserStatsService,
};
use tracing::info;

use crate::config::Config;

const MINUTE: Duration = Duration::from_secs(60);

/// Per-route request budgets.
#[derive(Clone)]
pub struct Limiters {
    pub global: RateLimiter,
    pub generate_code: RateLimiter,
    pub track: RateLimiter,
    pub note: RateLimiter,
}

impl Limiters {
    pub fn new() -> Self {
        Self {
            global: RateLimiter::new("api", 100, 15 * MINUTE),
            generate_code: RateLimiter::new("generate-invite-code", 5, 60 * MINUTE),
            track: RateLimiter::new("track", 100, MINUTE),
            note: RateLimiter::new("note", 20, MINUTE),
        }
    }

    pub fn all(&self) -> Vec<RateLimiter> {
        vec![
            self.global.clone(),
            self.generate_code.clone(),
            self.track.clone(),
            self.note.clone(),
        ]
    }
}

impl Default for Limiters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DBService,
    pub invites: InviteService,
    pub analytics: AnalyticsService,
    pub user_stats: UserStatsService,
    pub notes: Arc<NoteGenerator>,
    pub limiters: Limiters,
}

impl AppState {
    /// Open the stores under `DATA_DIR`, import or seed invite codes and
    /// wire up the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = JsonStore::new(&config.data_dir);
        store.init().await?;
        let db = DBService::new(&config.data_dir).await?;

        let seeded = InviteCode::seed_if_empty(&db.pool, store.load_legacy_invite_codes().await).await?;
        if seeded > 0 {
            info!(count = seeded, "Seeded invite codes");
        }

        let client = ChatApiClient::new(&config.api_url, config.api_key.clone(), &config.api_model)?;
        let notes = NoteGenerator::new(client, PromptBuilder::new(config.fortune_cache()));

        Ok(Self {
            invites: InviteService::new(db.clone(), store.clone()),
            analytics: AnalyticsService::new(db.clone()),
            user_stats: UserStatsService::new(store),
            notes: Arc::new(notes),
            limiters: Limiters::new(),
            config: Arc::new(config),
            db,
        })
    }
}
