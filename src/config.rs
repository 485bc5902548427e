//! Environment-driven settings. Everything the pipeline needs - notably the
//! text provider configuration - is injected from here rather than read from
//! ambient globals, so tests can substitute fakes.

use std::env;

/// Text provider configuration, passed to the synthesizer at construction.
#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Server settings loaded from the environment (`.env` supported).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; in-memory stores are used when absent.
    pub database_url: Option<String>,
    pub artifacts_dir: String,
    pub ai: AiSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(8080);
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let artifacts_dir =
            env::var("ARTIFACTS_DIR").unwrap_or_else(|_| "./artifacts".to_string());

        let ai = AiSettings {
            api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
        };

        Self {
            host,
            port,
            database_url,
            artifacts_dir,
            ai,
        }
    }
}
