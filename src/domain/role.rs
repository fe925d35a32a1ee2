//! Role models

use serde::{Deserialize, Serialize};

/// Scope a role applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleScope {
    Organization,
    Environment,
}

impl RoleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleScope::Organization => "ORGANIZATION",
            RoleScope::Environment => "ENVIRONMENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ORGANIZATION" => Some(RoleScope::Organization),
            "ENVIRONMENT" => Some(RoleScope::Environment),
            _ => None,
        }
    }
}

/// An access-control role scoped to an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub organization_id: String,
    pub scope: RoleScope,
    pub name: String,
    pub permissions: Vec<String>,
    /// Default roles are assigned to new members automatically.
    pub default: bool,
}
