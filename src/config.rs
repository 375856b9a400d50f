use std::env;
use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    // Authentication authority
    pub api_base_url: String,

    // Credential storage
    pub credential_path: PathBuf,
    pub credential_key: String,
    pub redis_url: Option<String>,
    pub client_id: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("credential_path", &self.credential_path)
            .field("credential_key", &self.credential_key)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("client_id", &self.client_id)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_CREDENTIAL_PATH: &str = ".sweetspot/credentials.json";
pub const DEFAULT_CREDENTIAL_KEY: &str = "token";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        let _ = dotenvy::dotenv();

        let api_base_url =
            env::var("AUTH_API_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = validate_base_url(&api_base_url)?;

        let credential_path = env::var("CREDENTIAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CREDENTIAL_PATH));
        if credential_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "CREDENTIAL_PATH".to_string(),
                "cannot be empty".to_string(),
            ));
        }

        let credential_key =
            env::var("CREDENTIAL_KEY").unwrap_or_else(|_| DEFAULT_CREDENTIAL_KEY.to_string());
        validate_name("CREDENTIAL_KEY", &credential_key)?;

        // Redis backend is opt-in; an empty value means "not configured"
        let redis_url = env::var("CREDENTIAL_REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        if let Some(url) = &redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::InvalidValue(
                    "CREDENTIAL_REDIS_URL".to_string(),
                    "must start with redis:// or rediss://".to_string(),
                ));
            }
        }

        let client_id = env::var("CLIENT_ID").unwrap_or_else(|_| "default".to_string());
        validate_name("CLIENT_ID", &client_id)?;

        Ok(Config {
            api_base_url,
            credential_path,
            credential_key,
            redis_url,
            client_id,
        })
    }

    /// Configuration pointing at `api_base_url` with default storage settings.
    pub fn with_api_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Config {
            api_base_url: validate_base_url(api_base_url)?,
            credential_path: PathBuf::from(DEFAULT_CREDENTIAL_PATH),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            redis_url: None,
            client_id: "default".to_string(),
        })
    }
}

/// Accept only http(s) URLs and strip trailing slashes so paths can be appended.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim();
    let Some(rest) = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
    else {
        return Err(ConfigError::InvalidValue(
            "AUTH_API_URL".to_string(),
            format!("must start with http:// or https://: {}", url),
        ));
    };
    if rest.trim_end_matches('/').is_empty() {
        return Err(ConfigError::ParseError(
            "AUTH_API_URL".to_string(),
            format!("missing host: {}", url),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Storage key and client id rules: 1-64 chars, alphanumeric + hyphen + underscore.
fn validate_name(var: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > 64 {
        return Err(ConfigError::InvalidValue(
            var.to_string(),
            "must be 1-64 characters".to_string(),
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::InvalidValue(
            var.to_string(),
            "may only contain alphanumeric characters, hyphens, and underscores".to_string(),
        ));
    }
    Ok(())
}
