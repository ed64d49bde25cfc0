use crate::error::{invalid_argument, OnboardingResult};
use crate::store::LocalBackendConfig;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_SESSION_KEY: &str = "onboarding_session";
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";
pub const DEFAULT_USER_KEY: &str = "user";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings shared by the controller and the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base path every REST call is joined onto, without trailing slash.
    pub api_base_url: String,
    /// Upper bound for any single server call.
    pub request_timeout: Duration,
    /// Local key holding the resumable session id.
    pub session_key: String,
    /// Local key holding the bearer token.
    pub token_key: String,
    /// Local key holding the cached user profile; cleared with the token.
    pub user_key: String,
    pub local_backend: LocalBackendConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            user_key: DEFAULT_USER_KEY.to_string(),
            local_backend: LocalBackendConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Reads `MENUQR_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> OnboardingResult<Self> {
        let defaults = Self::default();
        let api_base_url = var("MENUQR_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                info!("MENUQR_API_URL not set, using default: {DEFAULT_API_URL}");
                defaults.api_base_url.clone()
            });
        let request_timeout = match var("MENUQR_REQUEST_TIMEOUT_MS") {
            Some(raw) => {
                let millis: u64 = raw.parse().map_err(|e| {
                    warn!("Invalid MENUQR_REQUEST_TIMEOUT_MS value: {e}");
                    invalid_argument(format!("MENUQR_REQUEST_TIMEOUT_MS: {e}"))
                })?;
                Duration::from_millis(millis)
            }
            None => defaults.request_timeout,
        };
        let local_backend = match var("MENUQR_LOCAL_BACKEND") {
            Some(raw) => parse_backend(&raw)?,
            None => defaults.local_backend.clone(),
        };
        Ok(Self {
            api_base_url,
            request_timeout,
            session_key: var("MENUQR_SESSION_KEY").unwrap_or(defaults.session_key),
            token_key: var("MENUQR_TOKEN_KEY").unwrap_or(defaults.token_key),
            user_key: defaults.user_key,
            local_backend,
        })
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_session_key(mut self, key: impl Into<String>) -> Self {
        self.session_key = key.into();
        self
    }

    pub fn with_local_backend(mut self, backend: LocalBackendConfig) -> Self {
        self.local_backend = backend;
        self
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// `memory`, `file:<path>` or (with the `redis` feature) a `redis://` URL.
pub fn parse_backend(raw: &str) -> OnboardingResult<LocalBackendConfig> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("memory") {
        return Ok(LocalBackendConfig::InMemory);
    }
    if let Some(path) = raw.strip_prefix("file:") {
        if path.is_empty() {
            return Err(invalid_argument("file backend requires a path"));
        }
        return Ok(LocalBackendConfig::File(PathBuf::from(path)));
    }
    if raw.starts_with("redis://") || raw.starts_with("rediss://") {
        #[cfg(feature = "redis")]
        return Ok(LocalBackendConfig::RedisUrl(raw.to_string()));
        #[cfg(not(feature = "redis"))]
        return Err(invalid_argument(
            "redis local backend requested but the `redis` feature is disabled",
        ));
    }
    Err(invalid_argument(format!("unknown local backend `{raw}`")))
}
