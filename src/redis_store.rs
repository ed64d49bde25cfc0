use crate::error::{redis_error, OnboardingResult};
use crate::store::LocalStore;
use redis::{Client, Commands, Connection};

const DEFAULT_NAMESPACE: &str = "menuqr:onboarding";

/// Redis-backed [`LocalStore`] for clients that keep their durable state
/// server-side (kiosks, headless setups). Keys are prefixed with a namespace
/// so several clients can share one Redis.
pub struct RedisLocalStore {
    client: Client,
    namespace: String,
}

impl RedisLocalStore {
    /// Creates a store using a Redis URL and the default namespace prefix.
    pub fn from_url(url: impl AsRef<str>) -> OnboardingResult<Self> {
        let client = Client::open(url.as_ref()).map_err(redis_error)?;
        Ok(Self::with_namespace(client, DEFAULT_NAMESPACE))
    }

    /// Creates a store using a Redis URL and a custom namespace prefix.
    pub fn from_url_with_namespace(
        url: impl AsRef<str>,
        namespace: impl Into<String>,
    ) -> OnboardingResult<Self> {
        let client = Client::open(url.as_ref()).map_err(redis_error)?;
        Ok(Self::with_namespace(client, namespace))
    }

    pub fn with_namespace(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn conn(&self) -> OnboardingResult<Connection> {
        self.client.get_connection().map_err(redis_error)
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }
}

impl LocalStore for RedisLocalStore {
    fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        let mut conn = self.conn()?;
        conn.get(self.entry_key(key)).map_err(redis_error)
    }

    fn set(&self, key: &str, value: &str) -> OnboardingResult<()> {
        let mut conn = self.conn()?;
        conn.set::<_, _, ()>(self.entry_key(key), value)
            .map_err(redis_error)
    }

    fn delete(&self, key: &str) -> OnboardingResult<bool> {
        let mut conn = self.conn()?;
        let removed: u64 = conn.del(self.entry_key(key)).map_err(redis_error)?;
        Ok(removed > 0)
    }
}
