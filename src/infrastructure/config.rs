//! Process configuration read from environment variables. `main` loads any
//! `.env` file before this runs.

use crate::domain::models::UpstreamErrorPolicy;
use crate::infrastructure::openai::OpenAiConfig;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_USERS_FILE: &str = "users.json";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub users_file: PathBuf,
    /// `None` means a random secret is generated at startup.
    pub jwt_secret: Option<String>,
    pub upstream_errors: UpstreamErrorPolicy,
    pub max_upload_bytes: usize,
    pub openai: OpenAiConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("users_file", &self.users_file)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("upstream_errors", &self.upstream_errors)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("openai", &self.openai)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = OpenAiConfig::default();

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                reason: format!("{} ({})", raw, e),
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_UPLOAD_BYTES",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_UPLOAD_BYTES",
                        reason: format!("{} ({})", raw, e),
                    });
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let upstream_errors = match get("UPSTREAM_ERRORS") {
            Some(raw) => raw.parse::<UpstreamErrorPolicy>().map_err(|reason| ConfigError::Invalid {
                key: "UPSTREAM_ERRORS",
                reason,
            })?,
            None => UpstreamErrorPolicy::default(),
        };

        Ok(AppConfig {
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            users_file: get("USERS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_USERS_FILE)),
            jwt_secret: get("JWT_SECRET"),
            upstream_errors,
            max_upload_bytes,
            openai: OpenAiConfig {
                api_key: get("OPENAI_API_KEY"),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
                text_model: get("OPENAI_TEXT_MODEL").unwrap_or(defaults.text_model),
                vision_model: get("OPENAI_VISION_MODEL").unwrap_or(defaults.vision_model),
            },
        })
    }
}
