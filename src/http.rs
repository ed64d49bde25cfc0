use crate::api::OnboardingApi;
use crate::config::ClientConfig;
use crate::error::{ErrorCode, OnboardingError, OnboardingResult};
use crate::model::{
    CompleteRequest, CompletionPayload, MenuSetup, RestaurantInfo, SaveRequest, SessionId,
    StartResponse, StatusResponse, ThemeSettings,
};
use crate::store::LocalStore;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// reqwest-backed client for the onboarding REST surface.
///
/// Every request carries `Authorization: Bearer <token>` when a token is
/// stored under the configured key. A 401 from any endpoint clears the token
/// and the cached user from the [`LocalStore`] before the error is returned,
/// so the embedding app only has to route to its login view.
pub struct HttpOnboardingApi {
    client: Client,
    base_url: String,
    store: Arc<dyn LocalStore>,
    token_key: String,
    user_key: String,
}

impl HttpOnboardingApi {
    pub fn new(config: &ClientConfig, store: Arc<dyn LocalStore>) -> OnboardingResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self::with_client(client, config, store))
    }

    /// Uses a caller-built reqwest client (proxies, custom TLS roots).
    pub fn with_client(client: Client, config: &ClientConfig, store: Arc<dyn LocalStore>) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store,
            token_key: config.token_key.clone(),
            user_key: config.user_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> OnboardingResult<RequestBuilder> {
        Ok(match self.store.get(&self.token_key)? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    fn clear_credentials(&self) {
        for key in [&self.token_key, &self.user_key] {
            if let Err(err) = self.store.delete(key) {
                warn!(key = %key, error = %err, "failed to clear credential after 401");
            }
        }
    }

    async fn execute(&self, request: RequestBuilder, path: &str) -> OnboardingResult<Response> {
        let response = self
            .authorize(request)?
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            debug!(path, status = status.as_u16(), "onboarding request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "bearer token rejected; clearing stored credentials");
            self.clear_credentials();
        } else {
            warn!(path, status = status.as_u16(), %message, "onboarding request failed");
        }
        Err(map_status(status, message))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> OnboardingResult<T> {
        let response = self.execute(self.client.get(self.url(path)), path).await?;
        response.json().await.map_err(transport_error)
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> OnboardingResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.execute(request, path).await?;
        response.json().await.map_err(transport_error)
    }

    /// POST whose response body is only an acknowledgement.
    async fn post_ack<B>(&self, path: &str, body: &B) -> OnboardingResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let request = self.client.post(self.url(path)).json(body);
        self.execute(request, path).await.map(|_| ())
    }
}

#[async_trait]
impl OnboardingApi for HttpOnboardingApi {
    async fn start(&self) -> OnboardingResult<StartResponse> {
        self.post_json::<(), _>("/onboarding/start", None).await
    }

    async fn status(&self, session: &SessionId) -> OnboardingResult<StatusResponse> {
        self.get_json(&format!("/onboarding/status/{}", session.as_str()))
            .await
    }

    async fn save_restaurant_info(
        &self,
        session: &SessionId,
        info: &RestaurantInfo,
    ) -> OnboardingResult<()> {
        let body = SaveRequest {
            session_id: session,
            body: info,
        };
        self.post_ack("/onboarding/restaurant-info", &body).await
    }

    async fn save_menu_setup(
        &self,
        session: &SessionId,
        setup: &MenuSetup,
    ) -> OnboardingResult<()> {
        let body = SaveRequest {
            session_id: session,
            body: setup,
        };
        self.post_ack("/onboarding/menu-setup", &body).await
    }

    async fn save_theme(&self, session: &SessionId, theme: &ThemeSettings) -> OnboardingResult<()> {
        let body = SaveRequest {
            session_id: session,
            body: theme,
        };
        self.post_ack("/onboarding/theme", &body).await
    }

    async fn complete(&self, session: &SessionId) -> OnboardingResult<CompletionPayload> {
        let body = CompleteRequest {
            session_id: session,
        };
        self.post_json("/onboarding/complete", Some(&body)).await
    }
}

fn transport_error(err: reqwest::Error) -> OnboardingError {
    let code = if err.is_timeout() {
        ErrorCode::Timeout
    } else if err.is_decode() {
        ErrorCode::Internal
    } else {
        ErrorCode::Network
    };
    let mut error = OnboardingError::new(code, err.to_string());
    error.status = err.status().map(|status| status.as_u16());
    error
}

fn map_status(status: StatusCode, message: String) -> OnboardingError {
    let code = match status {
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::NOT_FOUND | StatusCode::GONE => ErrorCode::SessionExpired,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ErrorCode::InvalidInput,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorCode::Timeout,
        _ if status.is_server_error() => ErrorCode::Unavailable,
        _ => ErrorCode::Network,
    };
    OnboardingError::new(code, message).with_status(status.as_u16())
}

/// Pulls `message` (or `error`) out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|field| value.get(field)?.as_str().map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            map_status(StatusCode::GONE, "gone".into()).code,
            ErrorCode::SessionExpired
        );
        assert_eq!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "bad".into()).code,
            ErrorCode::InvalidInput
        );
        assert_eq!(
            map_status(StatusCode::BAD_GATEWAY, "upstream".into()).code,
            ErrorCode::Unavailable
        );
        let conflict = map_status(StatusCode::CONFLICT, "conflict".into());
        assert_eq!(conflict.code, ErrorCode::Network);
        assert_eq!(conflict.status, Some(409));
    }

    #[test]
    fn extracts_server_message() {
        assert_eq!(
            server_message(r#"{"message":"Session expired"}"#).as_deref(),
            Some("Session expired")
        );
        assert_eq!(
            server_message(r#"{"error":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert_eq!(server_message("<html>"), None);
    }
}
