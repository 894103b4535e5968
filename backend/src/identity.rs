use std::sync::Arc;
use std::time::Duration;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;
use shared::models::{Profile, VoterId};
use shared::validation::is_renderable_avatar;
use crate::config::IdentityConfig;
use crate::profile_cache::ProfileCache;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Identity request failed: {0}")]
    Transport(String),
    #[error("Identity lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("Identity service returned status {0}")]
    Status(u16),
    #[error("Malformed identity response: {0}")]
    Malformed(String),
}

/// Maps a voter id to display data. Remote and untrusted: callers bound the
/// wait and treat every error as non-fatal.
#[rocket::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, voter_id: &VoterId) -> Result<Profile, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct BulkUsersResponse {
    users: Vec<NeynarUser>,
}

#[derive(Debug, Deserialize)]
struct NeynarUser {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    pfp_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a `user/bulk` response body into the first user's profile.
/// Avatars that cannot be rendered are dropped so the caller falls back.
pub fn parse_profile(body: &[u8]) -> Result<Profile, IdentityError> {
    let response: BulkUsersResponse =
        serde_json::from_slice(body).map_err(|e| IdentityError::Malformed(e.to_string()))?;

    let user = response
        .users
        .into_iter()
        .next()
        .ok_or_else(|| IdentityError::Malformed("no user in response".into()))?;

    let display_name = non_blank(user.display_name)
        .or_else(|| non_blank(user.username))
        .ok_or_else(|| IdentityError::Malformed("user has no display name".into()))?;

    let avatar_ref = non_blank(user.pfp_url).filter(|url| is_renderable_avatar(url));

    Ok(Profile { display_name, avatar_ref })
}

pub struct NeynarResolver {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl NeynarResolver {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    fn request_error(&self, e: reqwest::Error) -> IdentityError {
        if e.is_timeout() {
            IdentityError::Timeout(self.timeout)
        } else {
            IdentityError::Transport(e.to_string())
        }
    }
}

#[rocket::async_trait]
impl IdentityResolver for NeynarResolver {
    async fn resolve(&self, voter_id: &VoterId) -> Result<Profile, IdentityError> {
        let response = self
            .client
            .get(format!("{}/user/bulk", self.base_url))
            .query(&[("fids", voter_id.as_str()), ("viewer_fid", voter_id.as_str())])
            .header(ACCEPT, "application/json")
            .header("api_key", &self.api_key)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        let profile = parse_profile(&body)?;
        debug!(%voter_id, display_name = %profile.display_name, "Resolved voter identity");
        Ok(profile)
    }
}

/// Serves repeat lookups from a [`ProfileCache`]. Failures are not cached.
pub struct CachingResolver<R> {
    inner: R,
    cache: ProfileCache,
}

impl<R: IdentityResolver> CachingResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self { inner, cache: ProfileCache::new(ttl) }
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }
}

#[rocket::async_trait]
impl<R: IdentityResolver> IdentityResolver for CachingResolver<R> {
    async fn resolve(&self, voter_id: &VoterId) -> Result<Profile, IdentityError> {
        if let Some(profile) = self.cache.get(voter_id) {
            debug!(%voter_id, "Voter identity served from cache");
            return Ok(profile);
        }

        let profile = self.inner.resolve(voter_id).await?;
        self.cache.insert(voter_id.clone(), profile.clone());
        Ok(profile)
    }
}

/// Builds the resolver described by `config`, wrapping it in a cache when a
/// cache window is configured.
pub fn resolver_from_config(config: &IdentityConfig) -> Result<Arc<dyn IdentityResolver>, IdentityError> {
    let resolver = NeynarResolver::new(&config.base_url, &config.api_key, config.timeout)?;

    if config.cache_ttl.is_zero() {
        Ok(Arc::new(resolver))
    } else {
        Ok(Arc::new(CachingResolver::new(resolver, config.cache_ttl)))
    }
}
