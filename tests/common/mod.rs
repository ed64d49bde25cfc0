#![allow(dead_code)]

use async_trait::async_trait;
use menuqr_onboarding::model::{
    CompletionPayload, MenuSetup, RestaurantInfo, SessionId, StartResponse, StatusResponse,
    ThemeSettings,
};
use menuqr_onboarding::{
    ClientConfig, ErrorCode, InMemoryLocalStore, InMemoryOnboardingApi, LocalStore,
    OnboardingApi, OnboardingController, OnboardingError, OnboardingResult,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const SESSION_KEY: &str = "onboarding_session";

pub fn config() -> ClientConfig {
    ClientConfig::default().with_request_timeout(Duration::from_millis(200))
}

/// Wraps the in-process server with failure injection and call counting.
#[derive(Default)]
pub struct ScriptedApi {
    pub inner: InMemoryOnboardingApi,
    fail_next: Mutex<Option<OnboardingError>>,
    stall: AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn fail_next(&self, err: OnboardingError) {
        *self.fail_next.lock() = Some(err);
    }

    /// Every following call hangs until the controller's timeout fires.
    pub fn stall(&self, stall: bool) {
        self.stall.store(stall, Ordering::SeqCst);
    }

    /// Every following call answers only after `delay`.
    pub fn delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> OnboardingResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_next.lock().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OnboardingApi for ScriptedApi {
    async fn start(&self) -> OnboardingResult<StartResponse> {
        self.gate().await?;
        self.inner.start().await
    }

    async fn status(&self, session: &SessionId) -> OnboardingResult<StatusResponse> {
        self.gate().await?;
        self.inner.status(session).await
    }

    async fn save_restaurant_info(
        &self,
        session: &SessionId,
        info: &RestaurantInfo,
    ) -> OnboardingResult<()> {
        self.gate().await?;
        self.inner.save_restaurant_info(session, info).await
    }

    async fn save_menu_setup(
        &self,
        session: &SessionId,
        setup: &MenuSetup,
    ) -> OnboardingResult<()> {
        self.gate().await?;
        self.inner.save_menu_setup(session, setup).await
    }

    async fn save_theme(&self, session: &SessionId, theme: &ThemeSettings) -> OnboardingResult<()> {
        self.gate().await?;
        self.inner.save_theme(session, theme).await
    }

    async fn complete(&self, session: &SessionId) -> OnboardingResult<CompletionPayload> {
        self.gate().await?;
        self.inner.complete(session).await
    }
}

/// Local store whose writes and deletes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryLocalStore,
    fail_set: AtomicBool,
    fail_delete: AtomicBool,
}

impl FlakyStore {
    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> OnboardingResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(OnboardingError::new(
                ErrorCode::Storage,
                format!("{op} failed: disk full"),
            ));
        }
        Ok(())
    }
}

impl LocalStore for FlakyStore {
    fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> OnboardingResult<()> {
        Self::check(&self.fail_set, "set")?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> OnboardingResult<bool> {
        Self::check(&self.fail_delete, "delete")?;
        self.inner.delete(key)
    }
}

pub struct Harness<S = InMemoryLocalStore> {
    pub controller: OnboardingController<Arc<ScriptedApi>>,
    pub api: Arc<ScriptedApi>,
    pub store: Arc<S>,
}

impl<S: LocalStore> Harness<S> {
    pub fn pointer(&self) -> Option<String> {
        self.store.get(SESSION_KEY).expect("read pointer")
    }
}

pub fn harness() -> Harness {
    harness_with(Arc::new(InMemoryLocalStore::new()))
}

pub fn flaky_harness() -> Harness<FlakyStore> {
    harness_with(Arc::new(FlakyStore::default()))
}

pub fn harness_with<S: LocalStore>(store: Arc<S>) -> Harness<S> {
    let api = Arc::new(ScriptedApi::default());
    let controller = OnboardingController::new(
        Arc::clone(&api),
        Arc::clone(&store) as Arc<dyn LocalStore>,
        &config(),
    );
    Harness {
        controller,
        api,
        store,
    }
}
