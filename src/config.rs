//! Application configuration loaded from environment variables.
//!
//! Secrets are read once at startup and kept in memory.

use std::env;
use std::path::PathBuf;

/// Default title of the backing spreadsheet.
pub const DEFAULT_SPREADSHEET_TITLE: &str = "GymJournalData";

/// Default location of the on-disk store id cache.
pub const DEFAULT_STORE_CACHE_PATH: &str = ".gym-journal/store-cache.json";

/// Which `TabularStore` implementation backs the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Google Drive + Sheets (production).
    Sheets,
    /// In-process store, lost on restart (local development).
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sheets" | "google" => Ok(StorageBackend::Sheets),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(ConfigError::Invalid("STORAGE_BACKEND", raw.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Public URL of this API (used for the OAuth callback)
    pub api_url: String,
    /// Server port
    pub port: u16,
    /// Display name of the backing spreadsheet
    pub spreadsheet_title: String,
    /// Where the resolved spreadsheet id is cached between runs
    pub store_cache_path: PathBuf,
    /// Storage implementation
    pub storage_backend: StorageBackend,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            port: 8080,
            spreadsheet_title: DEFAULT_SPREADSHEET_TITLE.to_string(),
            store_cache_path: PathBuf::from(DEFAULT_STORE_CACHE_PATH),
            storage_backend: StorageBackend::Memory,
            google_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_oauth_state_key".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(raw) => StorageBackend::parse(&raw)?,
            Err(_) => StorageBackend::Sheets,
        };

        Ok(Self {
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            spreadsheet_title: env::var("SPREADSHEET_TITLE")
                .unwrap_or_else(|_| DEFAULT_SPREADSHEET_TITLE.to_string()),
            store_cache_path: env::var("STORE_CACHE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_CACHE_PATH)),
            storage_backend,

            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// OAuth redirect URI registered with Google.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/google/callback", self.api_url.trim_end_matches('/'))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
