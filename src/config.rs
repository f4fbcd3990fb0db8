//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup into immutable values; nothing below
//! consults the environment again.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Google OAuth client settings
    pub google: GoogleOAuthConfig,
    /// Where user records live
    pub user_store: UserStoreBackend,
    /// Where uploaded files live
    pub file_store: FileStoreBackend,
    /// Maximum request body for uploads, in megabytes
    pub max_upload_mb: usize,
    /// How often expired session entries are purged
    pub session_cleanup_interval: Duration,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

/// Google OAuth2 client configuration.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Our callback URL registered with Google
    pub redirect_url: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl GoogleOAuthConfig {
    pub fn new(client_id: String, client_secret: String, redirect_url: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_url,
            scopes: vec![
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
                "openid".to_string(),
            ],
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// User record store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStoreBackend {
    /// JSON file on local disk
    Local { path: PathBuf },
    /// Firestore in the given GCP project
    Firestore { project_id: String },
}

/// File store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStoreBackend {
    /// Directory on local disk
    Local { dir: PathBuf },
    /// Cloud Storage bucket
    Gcs { bucket: String },
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 9999,
            google: GoogleOAuthConfig::new(
                "test_client_id".to_string(),
                "test_secret".to_string(),
                "http://localhost:9999/api/v1/auth/google/callback".to_string(),
            ),
            user_store: UserStoreBackend::Local {
                path: PathBuf::from("users.json"),
            },
            file_store: FileStoreBackend::Local {
                dir: PathBuf::from("files"),
            },
            max_upload_mb: 10,
            session_cleanup_interval: Duration::from_secs(300),
            cors_allowed_origins: Vec::new(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let google = GoogleOAuthConfig::new(
            required("GOOGLE_OAUTH_CLIENT_ID")?,
            required("GOOGLE_OAUTH_CLIENT_SECRET")?,
            required("GOOGLE_OAUTH_REDIRECT_URL")?,
        );

        let user_store = match env::var("USER_STORE").as_deref() {
            Err(_) | Ok("local") => UserStoreBackend::Local {
                path: env::var("USERS_FILE")
                    .unwrap_or_else(|_| "users.json".to_string())
                    .into(),
            },
            Ok("firestore") => UserStoreBackend::Firestore {
                project_id: required("GCP_PROJECT_ID")?,
            },
            Ok(other) => return Err(ConfigError::Invalid("USER_STORE", other.to_string())),
        };

        let file_store = match env::var("FILE_STORE").as_deref() {
            Err(_) | Ok("local") => FileStoreBackend::Local {
                dir: env::var("FILES_DIR")
                    .unwrap_or_else(|_| "files".to_string())
                    .into(),
            },
            Ok("gcs") => FileStoreBackend::Gcs {
                bucket: required("GCS_BUCKET")?,
            },
            Ok(other) => return Err(ConfigError::Invalid("FILE_STORE", other.to_string())),
        };

        let max_upload_mb = parse_or("MAX_UPLOAD_MB", 10)?;
        if max_upload_mb == 0 {
            return Err(ConfigError::Invalid("MAX_UPLOAD_MB", "0".to_string()));
        }

        Ok(Self {
            port: parse_or("PORT", 9999)?,
            google,
            user_store,
            file_store,
            max_upload_mb,
            session_cleanup_interval: Duration::from_secs(parse_or("SESSION_CLEANUP_SECS", 300)?),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .map_err(|_| ConfigError::Missing(name))
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
