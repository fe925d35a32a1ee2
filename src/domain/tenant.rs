//! Tenant hierarchy models
//!
//! Organizations own environments; environments scope the remaining domain
//! entities (APIs, applications, categories, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Deployment environment within an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    /// Base URL of the management console for this environment.
    /// Environments created before the setting existed carry none.
    pub console_url: Option<String>,
    /// Base URL of the developer portal for this environment.
    pub portal_url: Option<String>,
}
