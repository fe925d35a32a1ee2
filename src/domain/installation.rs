//! Installation model

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Singleton record describing this installation of the platform
///
/// `additional_information` is a free-form map that historically doubled as
/// a migration-completion registry: one-off scripts wrote `"SUCCESS"` flags
/// into it before the upgrade ledger existed. The upgrade framework only
/// ever reads it; the legacy bridge consumes the flags once to seed the
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    pub id: String,
    pub additional_information: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Flag value legacy migration scripts wrote on completion.
pub const LEGACY_FLAG_SUCCESS: &str = "SUCCESS";
