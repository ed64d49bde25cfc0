use crate::error::OnboardingResult;
use crate::local::{FileLocalStore, InMemoryLocalStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Durable client-side key/value storage.
///
/// Holds the onboarding session pointer and the bearer credentials the HTTP
/// client reads. Values are plain strings; an absent key means "nothing
/// stored". Implementations must be safe to share between the controller and
/// the API client.
pub trait LocalStore: Send + Sync + 'static {
    /// Returns the stored value, if any.
    fn get(&self, key: &str) -> OnboardingResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> OnboardingResult<()>;

    /// Removes `key`. Returns whether a value was present.
    fn delete(&self, key: &str) -> OnboardingResult<bool>;
}

impl<S: LocalStore + ?Sized> LocalStore for Arc<S> {
    fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> OnboardingResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> OnboardingResult<bool> {
        (**self).delete(key)
    }
}

/// Selects which [`LocalStore`] backend [`create_local_store`] builds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocalBackendConfig {
    InMemory,
    /// JSON document at the given path, created on first write.
    File(PathBuf),
    #[cfg(feature = "redis")]
    RedisUrl(String),
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self::InMemory
    }
}

pub fn create_local_store(config: LocalBackendConfig) -> OnboardingResult<Arc<dyn LocalStore>> {
    match config {
        LocalBackendConfig::InMemory => Ok(Arc::new(InMemoryLocalStore::new())),
        LocalBackendConfig::File(path) => Ok(Arc::new(FileLocalStore::open(path)?)),
        #[cfg(feature = "redis")]
        LocalBackendConfig::RedisUrl(url) => {
            Ok(Arc::new(crate::redis_store::RedisLocalStore::from_url(url)?))
        }
    }
}
