use crate::api::OnboardingApi;
use crate::error::{invalid_argument, not_found, OnboardingResult};
use crate::model::{
    CompletionPayload, MenuSetup, OnboardingData, RestaurantInfo, SessionId, StartResponse, Step,
    StatusResponse, ThemeSettings,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};
use uuid::Uuid;

/// Default lifetime of an untouched session.
pub const DEFAULT_TTL_SECS: u32 = 24 * 60 * 60;

const REDIRECT_AFTER_COMPLETION: &str = "/dashboard";

/// Server-side view of one onboarding session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    pub current_step: Step,
    pub completed_steps: Vec<Step>,
    pub data: OnboardingData,
    pub saved: SavedParts,
    pub restaurant_id: Option<String>,
    pub updated_at: OffsetDateTime,
    pub ttl_secs: u32,
}

/// Which sub-documents the server has received at least once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedParts {
    pub restaurant_info: bool,
    pub menu_setup: bool,
    pub theme_settings: bool,
}

impl SessionRecord {
    fn new(now: OffsetDateTime, ttl_secs: u32) -> Self {
        Self {
            current_step: Step::Welcome,
            completed_steps: Vec::new(),
            data: OnboardingData::default(),
            saved: SavedParts::default(),
            restaurant_id: None,
            updated_at: now,
            ttl_secs,
        }
    }

    /// `None` when the ttl is zero ("never expire").
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        if self.ttl_secs == 0 {
            return None;
        }
        Some(self.updated_at + Duration::seconds(i64::from(self.ttl_secs)))
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.expires_at(), Some(exp) if now >= exp)
    }

    pub fn is_completed(&self) -> bool {
        self.restaurant_id.is_some()
    }

    /// Records a save of `step`: everything up to it is done and the session
    /// moves to the step right after it, as the client does. Re-saving an
    /// earlier step moves the session back; completed steps are kept.
    fn record_save(&mut self, step: Step, now: OffsetDateTime) {
        for earlier in Step::ALL.iter().take(step.index() + 1) {
            if !self.completed_steps.contains(earlier) {
                self.completed_steps.push(*earlier);
            }
        }
        self.current_step = step.next();
        self.updated_at = now;
    }

    fn status(&self) -> StatusResponse {
        StatusResponse {
            current_step: self.current_step,
            completed_steps: self.completed_steps.clone(),
            restaurant_info: self
                .saved
                .restaurant_info
                .then(|| self.data.restaurant_info.clone()),
            menu_setup: self.saved.menu_setup.then(|| self.data.menu_setup.clone()),
            theme_settings: self
                .saved
                .theme_settings
                .then(|| self.data.theme_settings.clone()),
        }
    }
}

/// In-process implementation of the onboarding server contract.
///
/// Expiry is handled lazily on access, plus a sweep of stale entries at most
/// once a minute.
pub struct InMemoryOnboardingApi {
    sessions: DashMap<SessionId, SessionRecord>,
    ttl_secs: u32,
    cleanup_hint: Mutex<OffsetDateTime>,
}

impl Default for InMemoryOnboardingApi {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL_SECS)
    }
}

impl InMemoryOnboardingApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions expire `ttl_secs` after their last write; `0` disables expiry.
    pub fn with_ttl(ttl_secs: u32) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs,
            cleanup_hint: Mutex::new(OffsetDateTime::now_utc()),
        }
    }

    /// Snapshot of a live session, for inspection.
    pub fn session(&self, id: &SessionId) -> Option<SessionRecord> {
        let now = Self::now();
        self.live(id, now).ok()
    }

    /// Drops a session as if it had expired.
    pub fn expire(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn maybe_cleanup(&self, now: OffsetDateTime) {
        let mut guard = self.cleanup_hint.lock();
        if now - *guard < Duration::seconds(60) {
            return;
        }
        self.sessions.retain(|_, record| !record.is_expired(now));
        *guard = now;
    }

    fn live(&self, id: &SessionId, now: OffsetDateTime) -> OnboardingResult<SessionRecord> {
        self.maybe_cleanup(now);
        let Some(record) = self.sessions.get(id) else {
            return Err(not_found(id));
        };
        if record.is_expired(now) {
            drop(record);
            self.sessions.remove(id);
            debug!(session_id = %id, "onboarding session expired");
            return Err(not_found(id));
        }
        Ok(record.value().clone())
    }

    fn save_with(
        &self,
        id: &SessionId,
        step: Step,
        apply: impl FnOnce(&mut SessionRecord),
    ) -> OnboardingResult<()> {
        let now = Self::now();
        self.maybe_cleanup(now);
        let Some(mut record) = self.sessions.get_mut(id) else {
            return Err(not_found(id));
        };
        if record.is_expired(now) {
            drop(record);
            self.sessions.remove(id);
            return Err(not_found(id));
        }
        if record.is_completed() {
            return Err(invalid_argument(format!(
                "onboarding session {id} is already completed"
            )));
        }
        apply(record.value_mut());
        record.record_save(step, now);
        debug!(session_id = %id, %step, "saved onboarding step");
        Ok(())
    }
}

#[async_trait]
impl OnboardingApi for InMemoryOnboardingApi {
    async fn start(&self) -> OnboardingResult<StartResponse> {
        let now = Self::now();
        self.maybe_cleanup(now);
        let id = SessionId::generate();
        let record = SessionRecord::new(now, self.ttl_secs);
        let response = StartResponse {
            session_id: id.clone(),
            current_step: record.current_step,
            completed_steps: record.completed_steps.clone(),
        };
        self.sessions.insert(id.clone(), record);
        info!(session_id = %id, "onboarding session started");
        Ok(response)
    }

    async fn status(&self, session: &SessionId) -> OnboardingResult<StatusResponse> {
        self.live(session, Self::now()).map(|record| record.status())
    }

    async fn save_restaurant_info(
        &self,
        session: &SessionId,
        info: &RestaurantInfo,
    ) -> OnboardingResult<()> {
        if info.name.trim().is_empty() {
            return Err(invalid_argument("restaurant name is required"));
        }
        self.save_with(session, Step::RestaurantInfo, |record| {
            record.data.restaurant_info = info.clone();
            record.saved.restaurant_info = true;
        })
    }

    async fn save_menu_setup(
        &self,
        session: &SessionId,
        setup: &MenuSetup,
    ) -> OnboardingResult<()> {
        self.save_with(session, Step::MenuSetup, |record| {
            record.data.menu_setup = setup.clone();
            record.saved.menu_setup = true;
        })
    }

    async fn save_theme(&self, session: &SessionId, theme: &ThemeSettings) -> OnboardingResult<()> {
        self.save_with(session, Step::ThemeSelection, |record| {
            record.data.theme_settings = theme.clone();
            record.saved.theme_settings = true;
        })
    }

    async fn complete(&self, session: &SessionId) -> OnboardingResult<CompletionPayload> {
        let now = Self::now();
        let record = self.live(session, now)?;
        if !record.saved.restaurant_info {
            return Err(invalid_argument(
                "restaurant info must be saved before completing onboarding",
            ));
        }
        let restaurant_id = record
            .restaurant_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Some(mut entry) = self.sessions.get_mut(session) {
            entry.restaurant_id = Some(restaurant_id.clone());
            entry.record_save(Step::Completion, now);
        }
        info!(session_id = %session, %restaurant_id, "onboarding completed");
        Ok(CompletionPayload {
            restaurant_id: Some(restaurant_id),
            redirect_to: Some(REDIRECT_AFTER_COMPLETION.to_string()),
            extra: serde_json::Map::new(),
        })
    }
}
