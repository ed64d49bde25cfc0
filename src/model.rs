use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque server-issued identifier of an onboarding session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Generates a fresh identifier. Used by the in-process server.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// One of the five fixed, ordered onboarding stages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub enum Step {
    #[default]
    Welcome,
    RestaurantInfo,
    MenuSetup,
    ThemeSelection,
    Completion,
}

impl Step {
    /// The wizard order. No branching, no cycles.
    pub const ALL: [Step; 5] = [
        Step::Welcome,
        Step::RestaurantInfo,
        Step::MenuSetup,
        Step::ThemeSelection,
        Step::Completion,
    ];

    pub const LAST_INDEX: usize = Self::ALL.len() - 1;

    pub const fn index(self) -> usize {
        match self {
            Step::Welcome => 0,
            Step::RestaurantInfo => 1,
            Step::MenuSetup => 2,
            Step::ThemeSelection => 3,
            Step::Completion => 4,
        }
    }

    /// Clamps out-of-range indices to the final step.
    pub fn from_index(index: usize) -> Step {
        Self::ALL[index.min(Self::LAST_INDEX)]
    }

    /// Following step, clamped at [`Step::Completion`].
    pub fn next(self) -> Step {
        Self::from_index(self.index() + 1)
    }

    /// Preceding step, clamped at [`Step::Welcome`].
    pub fn prev(self) -> Step {
        Self::from_index(self.index().saturating_sub(1))
    }

    pub const fn is_last(self) -> bool {
        self.index() == Self::LAST_INDEX
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::RestaurantInfo => "restaurant_info",
            Step::MenuSetup => "menu_setup",
            Step::ThemeSelection => "theme_selection",
            Step::Completion => "completion",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct RestaurantInfo {
    pub name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub cuisine_types: Vec<String>,
    pub description: String,
}

impl RestaurantInfo {
    pub fn merge(&mut self, patch: RestaurantInfoPatch) {
        let RestaurantInfoPatch {
            name,
            owner_name,
            email,
            phone,
            address,
            cuisine_types,
            description,
        } = patch;
        assign(&mut self.name, name);
        assign(&mut self.owner_name, owner_name);
        assign(&mut self.email, email);
        assign(&mut self.phone, phone);
        assign(&mut self.address, address);
        assign(&mut self.cuisine_types, cuisine_types);
        assign(&mut self.description, description);
    }
}

/// Partial update of [`RestaurantInfo`]; `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct RestaurantInfoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MenuSetup {
    pub categories: Vec<String>,
    pub include_sample_items: bool,
}

impl Default for MenuSetup {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            include_sample_items: true,
        }
    }
}

impl MenuSetup {
    pub fn merge(&mut self, patch: MenuSetupPatch) {
        assign(&mut self.categories, patch.categories);
        assign(&mut self.include_sample_items, patch.include_sample_items);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct MenuSetupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_sample_items: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ThemeSettings {
    pub theme: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub logo_url: Option<String>,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            theme: "modern".into(),
            primary_color: "#3B82F6".into(),
            secondary_color: "#10B981".into(),
            font_family: "Inter".into(),
            logo_url: None,
        }
    }
}

impl ThemeSettings {
    pub fn merge(&mut self, patch: ThemePatch) {
        assign(&mut self.theme, patch.theme);
        assign(&mut self.primary_color, patch.primary_color);
        assign(&mut self.secondary_color, patch.secondary_color);
        assign(&mut self.font_family, patch.font_family);
        if let Some(logo) = patch.logo_url {
            self.logo_url = logo;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct ThemePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// `Some(None)` clears the logo. On the wire a missing field leaves it
    /// alone and an explicit `null` clears it.
    #[serde(
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "schema", schemars(with = "Option<String>"))]
    pub logo_url: Option<Option<String>>,
}

/// The three independently edited sub-documents of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct OnboardingData {
    pub restaurant_info: RestaurantInfo,
    pub menu_setup: MenuSetup,
    pub theme_settings: ThemeSettings,
}

/// Only called for fields present in the input, so `null` becomes
/// `Some(None)` instead of collapsing into the missing-field default.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn assign<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

// ---- wire types -----------------------------------------------------------

/// Response of `POST /onboarding/start`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct StartResponse {
    pub session_id: SessionId,
    #[serde(default)]
    pub current_step: Step,
    #[serde(default)]
    pub completed_steps: Vec<Step>,
}

/// Response of `GET /onboarding/status/:sessionId`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct StatusResponse {
    #[serde(default)]
    pub current_step: Step,
    #[serde(default)]
    pub completed_steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_info: Option<RestaurantInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_setup: Option<MenuSetup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_settings: Option<ThemeSettings>,
}

/// Body of the three save calls: `{ sessionId, ...subDocument }`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest<'a, T: Serialize> {
    pub session_id: &'a SessionId,
    #[serde(flatten)]
    pub body: &'a T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest<'a> {
    pub session_id: &'a SessionId,
}

/// Whatever the server returns on completion, passed through to the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
pub struct CompletionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
