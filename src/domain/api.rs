//! API and category models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A managed API
///
/// The gateway-facing configuration lives in `definition`, a JSON document
/// whose shape has changed across releases. Individual definitions can be
/// malformed (hand-edited, produced by old importers); consumers must treat
/// a definition that fails to parse as an item-level problem, not a reason
/// to stop processing other APIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    pub id: String,
    pub environment_id: String,
    pub name: String,
    pub version: String,
    /// Keys of the categories this API is published under.
    pub categories: Vec<String>,
    /// Raw gateway definition document.
    pub definition: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// A portal category APIs can be published under
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub environment_id: String,
    pub key: String,
    pub name: String,
}
