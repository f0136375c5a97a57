use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context};

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

pub const GMAIL_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";
const REDIRECT_URI: &str = "http://localhost:8080/auth/callback";

/// Name of the persisted token blob inside the data directory.
pub const TOKEN_CACHE_FILE: &str = "gmail_tokens.json";

/// Gmail search used to pick candidate messages for an extraction run.
pub const SUBSCRIPTION_QUERY: &str = "unsubscribe OR newsletter OR subscription -is:chat";
pub const CANDIDATE_MAX_RESULTS: u32 = 100;
/// Hard cap on the number of candidate messages inspected per run.
pub const MAX_CANDIDATE_MESSAGES: usize = 50;
pub const UNREAD_MAX_RESULTS: u32 = 50;
/// Number of Gmail requests kept in flight while enriching candidates.
pub const ENRICHMENT_CONCURRENCY: usize = 5;
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
/// View sessions untouched for this long are dropped.
pub const SESSION_IDLE_TTL_SECS: u64 = 30 * 60;
pub const MAX_VIEW_SESSIONS: usize = 1_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub bind_address: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub gmail_api_base: String,
    pub session_key: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the environment, loading `.env` first when present.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenv::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }

        let client_id = env::var("GMAIL_CLIENT_ID").context("GMAIL_CLIENT_ID must be set")?;
        let client_secret =
            env::var("GMAIL_CLIENT_SECRET").context("GMAIL_CLIENT_SECRET must be set")?;

        let port = match env::var("PORT") {
            Ok(p) => p
                .parse::<u16>()
                .map_err(|e| anyhow!("Invalid PORT '{}': {}", p, e))?,
            Err(_) => 8080,
        };

        Ok(AppConfig {
            client_id,
            client_secret,
            redirect_uri: env_or("GMAIL_REDIRECT_URI", REDIRECT_URI),
            bind_address: env_or("BIND_ADDRESS", "127.0.0.1"),
            port,
            data_dir: PathBuf::from(env_or("DATA_DIR", ".")),
            static_dir: PathBuf::from(env_or("STATIC_DIR", "./static")),
            gmail_api_base: env_or("GMAIL_API_BASE", GMAIL_API_BASE),
            session_key: env::var("SESSION_KEY").ok().filter(|k| !k.is_empty()),
        })
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.data_dir.join(TOKEN_CACHE_FILE)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: REDIRECT_URI.to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("."),
            static_dir: PathBuf::from("./static"),
            gmail_api_base: GMAIL_API_BASE.to_string(),
            session_key: None,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
