#![forbid(unsafe_code)]
//! Client-side onboarding for MenuQR tenants.
//!
//! [`OnboardingController`] walks a new restaurant owner through
//! `welcome → restaurant_info → menu_setup → theme_selection → completion`,
//! saving each step to the onboarding API and keeping the session id in a
//! [`LocalStore`] so an interrupted wizard can resume.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod inmemory;
pub mod local;
pub mod model;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod state;
pub mod store;

pub use api::OnboardingApi;
pub use config::ClientConfig;
pub use controller::OnboardingController;
pub use error::{ErrorCode, OnboardingError, OnboardingResult};
#[cfg(feature = "http")]
pub use http::HttpOnboardingApi;
pub use inmemory::InMemoryOnboardingApi;
pub use local::{FileLocalStore, InMemoryLocalStore};
pub use model::{
    CompletionPayload, MenuSetup, MenuSetupPatch, OnboardingData, RestaurantInfo,
    RestaurantInfoPatch, SessionId, Step, ThemePatch, ThemeSettings,
};
pub use state::{reduce, Action, OnboardingState};
pub use store::{create_local_store, LocalBackendConfig, LocalStore};
