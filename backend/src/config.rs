use std::time::Duration;
use rocket::http::uri::Origin;

pub const DEFAULT_NEYNAR_BASE_URL: &str = "https://api.neynar.com/v2/farcaster";
pub const DEFAULT_BASE_PATH: &str = "/api/agora-voting";
pub const DEFAULT_IDENTITY_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost";
pub const FALLBACK_AVATAR_ASSET: &str = "images/no_avatar.png";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub required_for_casting: bool,
}

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_path: String,
    pub identity: IdentityConfig,
    pub fallback_avatar: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Reads every setting through `lookup`, typically the deployment's
    /// secret store. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("NEYNAR_API_KEY").ok_or(ConfigError::Missing("NEYNAR_API_KEY"))?;
        let base_url = get("BASE_URL_NEYNAR_V2").unwrap_or_else(|| DEFAULT_NEYNAR_BASE_URL.to_string());
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid { key: "BASE_URL_NEYNAR_V2", value: base_url });
        }

        let base_path = normalize_base_path(
            get("AGORA_BASE_PATH").unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
        )?;

        let timeout_ms = parse_u64("IDENTITY_TIMEOUT_MS", get("IDENTITY_TIMEOUT_MS"), DEFAULT_IDENTITY_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid { key: "IDENTITY_TIMEOUT_MS", value: "0".into() });
        }
        let cache_ttl_secs = parse_u64("IDENTITY_CACHE_TTL_SECS", get("IDENTITY_CACHE_TTL_SECS"), 0)?;
        let required_for_casting = parse_bool(
            "IDENTITY_REQUIRED_FOR_CASTING",
            get("IDENTITY_REQUIRED_FOR_CASTING"),
            false,
        )?;

        let fallback_avatar = get("FALLBACK_AVATAR_URL")
            .unwrap_or_else(|| asset_path(&base_path, FALLBACK_AVATAR_ASSET));

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Config {
            base_path,
            identity: IdentityConfig {
                base_url,
                api_key,
                timeout: Duration::from_millis(timeout_ms),
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                required_for_casting,
            },
            fallback_avatar,
            cors_allowed_origins,
        })
    }
}

fn normalize_base_path(raw: String) -> Result<String, ConfigError> {
    let trimmed = raw.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };

    if !path.starts_with('/') || Origin::parse(path).is_err() {
        return Err(ConfigError::Invalid { key: "AGORA_BASE_PATH", value: raw });
    }
    Ok(path.to_string())
}

pub fn asset_path(base_path: &str, asset: &str) -> String {
    format!("{}/{}", base_path.trim_end_matches('/'), asset)
}

fn parse_u64(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = value else { return Ok(default) };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
