use crate::error::OnboardingResult;
use crate::model::{
    CompletionPayload, MenuSetup, RestaurantInfo, SessionId, StartResponse, StatusResponse,
    ThemeSettings,
};
use async_trait::async_trait;
use std::sync::Arc;

/// The onboarding REST surface.
///
/// [`HttpOnboardingApi`](crate::http::HttpOnboardingApi) talks to the real
/// server; [`InMemoryOnboardingApi`](crate::inmemory::InMemoryOnboardingApi)
/// implements the same contract in-process.
#[async_trait]
pub trait OnboardingApi: Send + Sync + 'static {
    /// `POST /onboarding/start`
    async fn start(&self) -> OnboardingResult<StartResponse>;

    /// `GET /onboarding/status/:sessionId`
    async fn status(&self, session: &SessionId) -> OnboardingResult<StatusResponse>;

    /// `POST /onboarding/restaurant-info`
    async fn save_restaurant_info(
        &self,
        session: &SessionId,
        info: &RestaurantInfo,
    ) -> OnboardingResult<()>;

    /// `POST /onboarding/menu-setup`
    async fn save_menu_setup(&self, session: &SessionId, setup: &MenuSetup)
        -> OnboardingResult<()>;

    /// `POST /onboarding/theme`
    async fn save_theme(&self, session: &SessionId, theme: &ThemeSettings)
        -> OnboardingResult<()>;

    /// `POST /onboarding/complete`
    async fn complete(&self, session: &SessionId) -> OnboardingResult<CompletionPayload>;
}

#[async_trait]
impl<A: OnboardingApi + ?Sized> OnboardingApi for Arc<A> {
    async fn start(&self) -> OnboardingResult<StartResponse> {
        (**self).start().await
    }

    async fn status(&self, session: &SessionId) -> OnboardingResult<StatusResponse> {
        (**self).status(session).await
    }

    async fn save_restaurant_info(
        &self,
        session: &SessionId,
        info: &RestaurantInfo,
    ) -> OnboardingResult<()> {
        (**self).save_restaurant_info(session, info).await
    }

    async fn save_menu_setup(
        &self,
        session: &SessionId,
        setup: &MenuSetup,
    ) -> OnboardingResult<()> {
        (**self).save_menu_setup(session, setup).await
    }

    async fn save_theme(&self, session: &SessionId, theme: &ThemeSettings) -> OnboardingResult<()> {
        (**self).save_theme(session, theme).await
    }

    async fn complete(&self, session: &SessionId) -> OnboardingResult<CompletionPayload> {
        (**self).complete(session).await
    }
}
