//! The onboarding session controller.
//!
//! Owns the single [`OnboardingState`] of a wizard, synchronizes step
//! transitions with the server through an [`OnboardingApi`], and keeps the
//! resumable session id in a [`LocalStore`].
//!
//! Network-calling operations are single-flight: while one is pending, any
//! other fails immediately with [`ErrorCode::Busy`]. Each call is bounded by
//! the configured request timeout.

use crate::api::OnboardingApi;
use crate::config::ClientConfig;
use crate::error::{busy, no_session, ErrorCode, OnboardingError, OnboardingResult};
use crate::model::{
    CompletionPayload, MenuSetupPatch, OnboardingData, RestaurantInfoPatch, SessionId, Step,
    ThemePatch,
};
use crate::state::{Action, OnboardingState};
use crate::store::LocalStore;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct OnboardingController<A> {
    api: A,
    store: Arc<dyn LocalStore>,
    session_key: String,
    request_timeout: Duration,
    state: watch::Sender<OnboardingState>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the operation ends, however it ends.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(feature = "http")]
impl OnboardingController<crate::http::HttpOnboardingApi> {
    /// Builds the local store and HTTP client described by `config`.
    pub fn from_config(config: &ClientConfig) -> OnboardingResult<Self> {
        let store = crate::store::create_local_store(config.local_backend.clone())?;
        let api = crate::http::HttpOnboardingApi::new(config, Arc::clone(&store))?;
        Ok(Self::new(api, store, config))
    }
}

impl<A: OnboardingApi> OnboardingController<A> {
    pub fn new(api: A, store: Arc<dyn LocalStore>, config: &ClientConfig) -> Self {
        let (state, _) = watch::channel(OnboardingState::default());
        Self {
            api,
            store,
            session_key: config.session_key.clone(),
            request_timeout: config.request_timeout,
            state,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> OnboardingState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<OnboardingState> {
        self.state.subscribe()
    }

    pub fn current_step(&self) -> Step {
        self.state.borrow().current_step
    }

    pub fn current_step_index(&self) -> usize {
        self.state.borrow().current_step_index()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.state.borrow().session_id.clone()
    }

    pub fn is_step_completed(&self, step: Step) -> bool {
        self.state.borrow().is_step_completed(step)
    }

    /// Whether [`go_to_step`](Self::go_to_step) would move to `step`.
    pub fn can_go_to(&self, step: Step) -> bool {
        self.is_step_completed(step)
    }

    pub fn progress(&self) -> f32 {
        self.state.borrow().progress()
    }

    /// Session id persisted by a previous run, if any.
    pub fn stored_session(&self) -> OnboardingResult<Option<SessionId>> {
        Ok(self.store.get(&self.session_key)?.map(SessionId::new))
    }

    /// Best-effort auto-resume at startup.
    ///
    /// Returns `Ok(true)` when a stored session was resumed. A failed resume
    /// is logged and swallowed; the stored pointer is already gone and the
    /// state is left as if no session had existed.
    pub async fn mount(&self) -> OnboardingResult<bool> {
        let Some(session_id) = self.stored_session()? else {
            return Ok(false);
        };
        match self.resume_session(session_id.clone()).await {
            Ok(_) => Ok(true),
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    code = %err.code,
                    error = %err.message,
                    "auto-resume failed; starting without a session"
                );
                self.dispatch(Action::SetError(None));
                Ok(false)
            }
        }
    }

    /// Requests a new session and persists its id for later resumption.
    pub async fn start_onboarding(&self) -> OnboardingResult<OnboardingState> {
        let _flight = self.begin()?;
        self.dispatch(Action::SetLoading(true));
        let response = match self.call(self.api.start()).await {
            Ok(response) => response,
            Err(err) => return self.fail(err),
        };
        if let Err(err) = self
            .store
            .set(&self.session_key, response.session_id.as_str())
        {
            return self.fail(err);
        }
        info!(session_id = %response.session_id, "onboarding started");
        self.dispatch(Action::SetSession {
            session_id: response.session_id,
            current_step: response.current_step,
            completed_steps: response.completed_steps,
            data: OnboardingData::default(),
        });
        self.dispatch(Action::MarkSynced(OffsetDateTime::now_utc()));
        Ok(self.state())
    }

    /// Rehydrates the state of `session_id` from the server.
    ///
    /// On any failure the stored pointer is deleted and the error returned;
    /// progress and data in memory are left as they were. Starting over is
    /// the caller's decision.
    pub async fn resume_session(&self, session_id: SessionId) -> OnboardingResult<OnboardingState> {
        let _flight = self.begin()?;
        self.dispatch(Action::SetLoading(true));
        let status = match self.call(self.api.status(&session_id)).await {
            Ok(status) => status,
            Err(err) => {
                match self.store.delete(&self.session_key) {
                    Ok(_) => {
                        debug!(session_id = %session_id, "removed stale onboarding pointer")
                    }
                    Err(store_err) => warn!(
                        session_id = %session_id,
                        error = %store_err,
                        "failed to remove stale onboarding pointer"
                    ),
                }
                return self.fail(err);
            }
        };
        if let Err(err) = self.store.set(&self.session_key, session_id.as_str()) {
            warn!(
                session_id = %session_id,
                error = %err,
                "failed to persist resumed onboarding pointer"
            );
        }
        info!(session_id = %session_id, step = %status.current_step, "onboarding resumed");
        self.dispatch(Action::SetSession {
            session_id,
            current_step: status.current_step,
            completed_steps: status.completed_steps,
            data: OnboardingData {
                restaurant_info: status.restaurant_info.unwrap_or_default(),
                menu_setup: status.menu_setup.unwrap_or_default(),
                theme_settings: status.theme_settings.unwrap_or_default(),
            },
        });
        self.dispatch(Action::MarkSynced(OffsetDateTime::now_utc()));
        Ok(self.state())
    }

    pub fn update_restaurant_info(&self, patch: RestaurantInfoPatch) {
        self.dispatch(Action::UpdateRestaurantInfo(patch));
    }

    pub fn update_menu_setup(&self, patch: MenuSetupPatch) {
        self.dispatch(Action::UpdateMenuSetup(patch));
    }

    pub fn update_theme(&self, patch: ThemePatch) {
        self.dispatch(Action::UpdateTheme(patch));
    }

    /// Persists the current step's sub-document, then advances.
    ///
    /// `welcome` and `completion` have nothing to save. On failure the step
    /// does not change and the error is recorded. If the wizard was reset or
    /// navigated while the save was pending, that change stands: the advance
    /// only applies to the session and step that were saved.
    pub async fn next_step(&self) -> OnboardingResult<OnboardingState> {
        let _flight = self.begin()?;
        let (session_id, step, data) = {
            let state = self.state.borrow();
            (state.session_id.clone(), state.current_step, state.data.clone())
        };
        let Some(session_id) = session_id else {
            return self.fail(no_session());
        };

        self.dispatch(Action::SetLoading(true));
        let saved = match step {
            Step::RestaurantInfo => self
                .call(
                    self.api
                        .save_restaurant_info(&session_id, &data.restaurant_info),
                )
                .await
                .map(|()| true),
            Step::MenuSetup => self
                .call(self.api.save_menu_setup(&session_id, &data.menu_setup))
                .await
                .map(|()| true),
            Step::ThemeSelection => self
                .call(self.api.save_theme(&session_id, &data.theme_settings))
                .await
                .map(|()| true),
            Step::Welcome | Step::Completion => Ok(false),
        };
        let synced = match saved {
            Ok(synced) => synced,
            Err(err) => return self.fail_for(&session_id, err),
        };

        self.dispatch(Action::NextStep {
            from: step,
            session_id: session_id.clone(),
        });
        if synced {
            self.dispatch_for(&session_id, Action::MarkSynced(OffsetDateTime::now_utc()));
        }
        debug!(
            session_id = %session_id,
            from = %step,
            to = %self.current_step(),
            "advanced onboarding step"
        );
        Ok(self.state())
    }

    /// Steps back locally; never touches the server or `completed_steps`.
    pub fn prev_step(&self) -> Step {
        self.dispatch(Action::PrevStep);
        self.current_step()
    }

    /// Jumps to an already completed step. Returns `false` (and changes
    /// nothing) otherwise.
    pub fn go_to_step(&self, step: Step) -> bool {
        if !self.can_go_to(step) {
            return false;
        }
        self.dispatch(Action::GoToStep(step));
        true
    }

    /// Finishes the session on the server, drops the stored pointer and
    /// resets the in-memory state. The server payload is returned untouched.
    pub async fn complete_onboarding(&self) -> OnboardingResult<CompletionPayload> {
        let _flight = self.begin()?;
        let session_id = self.session_id();
        let Some(session_id) = session_id else {
            return self.fail(no_session());
        };

        self.dispatch(Action::SetLoading(true));
        let payload = match self.call(self.api.complete(&session_id)).await {
            Ok(payload) => payload,
            Err(err) => return self.fail_for(&session_id, err),
        };
        if let Err(err) = self.store.delete(&self.session_key) {
            return self.fail_for(&session_id, err);
        }
        info!(
            session_id = %session_id,
            redirect_to = ?payload.redirect_to,
            "onboarding completed"
        );
        self.dispatch(Action::Reset);
        Ok(payload)
    }

    /// Drops the stored pointer and restores the initial state.
    ///
    /// The in-memory reset always happens; a storage failure is still
    /// returned.
    pub fn reset_onboarding(&self) -> OnboardingResult<()> {
        self.dispatch(Action::Reset);
        self.store.delete(&self.session_key).map(|_| ())
    }

    fn dispatch(&self, action: Action) {
        self.state.send_modify(|state| state.apply(action));
    }

    /// Applies `action` only while `session_id` is still the active session.
    fn dispatch_for(&self, session_id: &SessionId, action: Action) {
        self.state.send_if_modified(|state| {
            if state.session_id.as_ref() != Some(session_id) {
                return false;
            }
            state.apply(action);
            true
        });
    }

    fn begin(&self) -> OnboardingResult<FlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard(&self.in_flight))
            .map_err(|_| busy())
    }

    async fn call<T, F>(&self, request: F) -> OnboardingResult<T>
    where
        F: Future<Output = OnboardingResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(OnboardingError::new(
                ErrorCode::Timeout,
                format!(
                    "onboarding request timed out after {} ms",
                    self.request_timeout.as_millis()
                ),
            )),
        }
    }

    fn fail<T>(&self, err: OnboardingError) -> OnboardingResult<T> {
        warn!(
            code = %err.code,
            status = ?err.status,
            error = %err.message,
            "onboarding operation failed"
        );
        self.dispatch(Action::SetError(Some(err.clone())));
        Err(err)
    }

    /// Like [`fail`](Self::fail), but a session reset in the meantime keeps
    /// its clean state.
    fn fail_for<T>(&self, session_id: &SessionId, err: OnboardingError) -> OnboardingResult<T> {
        warn!(
            session_id = %session_id,
            code = %err.code,
            status = ?err.status,
            error = %err.message,
            "onboarding operation failed"
        );
        self.dispatch_for(session_id, Action::SetError(Some(err.clone())));
        Err(err)
    }
}
