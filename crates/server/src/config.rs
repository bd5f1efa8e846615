use std::path::PathBuf;

use clap::Parser;
use services::services::chat_api::{DEFAULT_API_URL, DEFAULT_MODEL};
use tracing::warn;

pub const DEFAULT_ADMIN_KEY: &str = "admin-dev-key";

/// Server settings. Every flag falls back to the environment variable of the
/// same name, so a `.env` file is enough to configure a deployment.
#[derive(Debug, Clone, Parser)]
#[command(name = "server", about = "SoulNote API server")]
pub struct Config {
    #[arg(long, env = "ADMIN_KEY", default_value = DEFAULT_ADMIN_KEY, hide_env_values = true)]
    pub admin_key: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Comma separated list of origins allowed by CORS.
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "http://localhost:5173")]
    pub allowed_origins: String,

    #[arg(long = "api-key", env = "VITE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long = "api-url", env = "VITE_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long = "api-model", env = "VITE_API_MODEL", default_value = DEFAULT_MODEL)]
    pub api_model: String,

    #[arg(long, env = "DEBUG_MODE", default_value_t = false)]
    pub debug_mode: bool,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// `development` relaxes CORS and exposes error details.
    #[arg(long, env = "APP_ENV", default_value = "production")]
    pub app_env: String,

    #[arg(long, env = "DATA_DIR", default_value = "server/data")]
    pub data_dir: PathBuf,

    /// Horoscope cache; defaults to `<DATA_DIR>/astro_cache.json`.
    #[arg(long, env = "ASTRO_CACHE")]
    pub astro_cache: Option<PathBuf>,

    #[arg(long, env = "APP_VERSION", default_value = "1.0.0")]
    pub app_version: String,

    #[arg(long, env = "COMMUNITY_QRCODE_URL", default_value = "/assets/community-qr.png")]
    pub community_qrcode_url: String,
}

impl Config {
    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn fortune_cache(&self) -> PathBuf {
        self.astro_cache
            .clone()
            .unwrap_or_else(|| self.data_dir.join("astro_cache.json"))
    }

    /// Log settings that are allowed but probably unintended.
    pub fn warn_on_defaults(&self) {
        if self.admin_key == DEFAULT_ADMIN_KEY {
            warn!("ADMIN_KEY is not set, using the development key");
        } else if self.admin_key.is_empty() {
            warn!("ADMIN_KEY is empty, admin routes will reject every request");
        }
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            warn!("VITE_API_KEY is not set, notes will use local fallback content");
        }
    }

    /// Defaults for tests, rooted at `data_dir`.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            admin_key: DEFAULT_ADMIN_KEY.to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: "http://localhost:5173".to_string(),
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            api_model: DEFAULT_MODEL.to_string(),
            debug_mode: false,
            log_level: None,
            app_env: "production".to_string(),
            data_dir: data_dir.into(),
            astro_cache: None,
            app_version: "1.0.0".to_string(),
            community_qrcode_url: "/assets/community-qr.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_splits_origins() {
        let config = Config::try_parse_from([
            "server",
            "--port",
            "8080",
            "--allowed-origins",
            "https://a.example, https://b.example,",
            "--app-env",
            "Development",
            "--data-dir",
            "/tmp/soulnote",
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.origins(), vec!["https://a.example", "https://b.example"]);
        assert!(config.is_development());
        assert_eq!(
            config.fortune_cache(),
            PathBuf::from("/tmp/soulnote/astro_cache.json")
        );
    }
}
