use std::path::PathBuf;

use laurel_core::attachment::{UploadPolicy, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Period of the expired refresh-token sweep in seconds (default: `3600`).
    pub token_sweep_interval_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Evidence-file storage and limits.
    pub upload: UploadConfig,
}

/// Where evidence files go and what is accepted.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Root directory of the local blob store.
    pub dir: PathBuf,
    pub policy: UploadPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./uploads"),
            policy: UploadPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                      |
    /// |-----------------------------|------------------------------|
    /// | `HOST`                      | `0.0.0.0`                    |
    /// | `PORT`                      | `3000`                       |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                         |
    /// | `TOKEN_SWEEP_INTERVAL_SECS` | `3600`                       |
    /// | `UPLOAD_DIR`                | `./uploads`                  |
    /// | `MAX_UPLOAD_BYTES`          | `5242880`                    |
    /// | `ALLOWED_EXTENSIONS`        | `pdf,doc,docx,jpg,jpeg,png`  |
    ///
    /// JWT settings are documented on [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparseable numbers; misconfiguration should fail at start-up.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let token_sweep_interval_secs: u64 = std::env::var("TOKEN_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("TOKEN_SWEEP_INTERVAL_SECS must be a valid u64");
        assert!(
            token_sweep_interval_secs > 0,
            "TOKEN_SWEEP_INTERVAL_SECS must be positive"
        );

        let dir = PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));

        let max_bytes: u64 = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_UPLOAD_BYTES.to_string())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid u64");

        let allowed_extensions = std::env::var("ALLOWED_EXTENSIONS")
            .map(|raw| parse_extensions(&raw))
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_EXTENSIONS
                    .iter()
                    .map(|e| e.to_string())
                    .collect()
            });

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            token_sweep_interval_secs,
            jwt: JwtConfig::from_env(),
            upload: UploadConfig {
                dir,
                policy: UploadPolicy {
                    max_bytes,
                    allowed_extensions,
                },
            },
        }
    }
}

/// Split a comma-separated value, trimming and dropping empty entries.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Like [`parse_list`], normalised to lowercase without leading dots.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    parse_list(raw)
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
