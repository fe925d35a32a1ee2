//! Application models

use serde::{Deserialize, Serialize};

/// How an application shares API keys across its subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiKeyMode {
    /// No explicit choice made yet; the first subscription decides.
    Unspecified,
    /// One key shared by all of the application's subscriptions.
    Shared,
    /// One key per subscription.
    Exclusive,
}

impl ApiKeyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyMode::Unspecified => "UNSPECIFIED",
            ApiKeyMode::Shared => "SHARED",
            ApiKeyMode::Exclusive => "EXCLUSIVE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNSPECIFIED" => Some(ApiKeyMode::Unspecified),
            "SHARED" => Some(ApiKeyMode::Shared),
            "EXCLUSIVE" => Some(ApiKeyMode::Exclusive),
            _ => None,
        }
    }
}

/// A consumer application subscribing to APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub environment_id: String,
    pub name: String,
    /// Absent on applications created before the field existed.
    pub api_key_mode: Option<ApiKeyMode>,
}
