//! API logging condition upgrader
//!
//! Old console versions persisted gateway logging conditions as bare
//! expressions (`#request.timestamp <= 1622555555555l`), which newer
//! gateways refuse to evaluate outside an expression block. This upgrader
//! wraps the bare form in braces. Definitions that fail to parse are
//! logged per API and skipped; the scan continues.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info, warn};

use crate::domain::{Api, Pageable};
use crate::error::AppResult;
use crate::repository::{ApiCriteria, ApiRepository};
use crate::upgrade::Upgrader;

const PAGE_SIZE: usize = 100;

static BARE_TIMESTAMP_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#request\.timestamp\s*<=?\s*\d+l$").unwrap()
});

/// Wraps bare logging conditions in an expression block
pub struct ApiLoggingConditionUpgrader {
    apis: Arc<dyn ApiRepository>,
}

impl ApiLoggingConditionUpgrader {
    pub fn new(apis: Arc<dyn ApiRepository>) -> Self {
        Self { apis }
    }

    /// The fixed condition, or `None` when the definition needs no change.
    fn fixed_condition(api: &Api) -> Option<String> {
        let condition = api
            .definition
            .pointer("/proxy/logging/condition")?
            .as_str()?;
        if BARE_TIMESTAMP_CONDITION.is_match(condition) {
            Some(format!("{{{}}}", condition))
        } else {
            None
        }
    }
}

#[async_trait]
impl Upgrader for ApiLoggingConditionUpgrader {
    fn id(&self) -> &'static str {
        "ApiLoggingConditionUpgrader"
    }

    fn order(&self) -> i32 {
        300
    }

    async fn execute(&self) -> AppResult<bool> {
        let mut fixed = 0;
        let mut failures = 0;

        let criteria = ApiCriteria::default();
        let mut pageable = Pageable::first(PAGE_SIZE);
        loop {
            let page = self.apis.search(&criteria, pageable).await?;
            let has_next = page.has_next();

            for api in page.content {
                if !api.definition.is_object() {
                    error!(
                        "API {} has a malformed definition, leaving its logging condition alone",
                        api.id
                    );
                    failures += 1;
                    continue;
                }

                let Some(condition) = Self::fixed_condition(&api) else {
                    continue;
                };

                let mut updated = api.clone();
                updated.definition["proxy"]["logging"]["condition"] =
                    serde_json::Value::String(condition);
                match self.apis.update(updated).await {
                    Ok(_) => fixed += 1,
                    Err(e) => {
                        warn!("Could not rewrite logging condition of API {}: {}", api.id, e);
                        failures += 1;
                    }
                }
            }

            if !has_next {
                break;
            }
            pageable = pageable.next();
        }

        info!(
            "Rewrote {} logging condition(s), {} API(s) skipped",
            fixed, failures
        );
        Ok(true)
    }
}
