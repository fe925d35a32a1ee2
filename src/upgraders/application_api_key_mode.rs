//! Application API-key-mode upgrader
//!
//! Applications created before the API-key-mode field existed carry no
//! value at all, which newer subscription handling treats as an error.
//! This upgrader backfills `UNSPECIFIED` wherever the mode is absent. A
//! present value is never touched, so the update is monotonic and safe to
//! re-apply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{ApiKeyMode, Pageable};
use crate::error::AppResult;
use crate::repository::{ApplicationCriteria, ApplicationRepository};
use crate::upgrade::Upgrader;

const PAGE_SIZE: usize = 100;

/// Backfills the API-key mode on legacy applications
pub struct ApplicationApiKeyModeUpgrader {
    applications: Arc<dyn ApplicationRepository>,
}

impl ApplicationApiKeyModeUpgrader {
    pub fn new(applications: Arc<dyn ApplicationRepository>) -> Self {
        Self { applications }
    }
}

#[async_trait]
impl Upgrader for ApplicationApiKeyModeUpgrader {
    fn id(&self) -> &'static str {
        "ApplicationApiKeyModeUpgrader"
    }

    fn order(&self) -> i32 {
        300
    }

    async fn execute(&self) -> AppResult<bool> {
        let mut backfilled = 0;

        let criteria = ApplicationCriteria::default();
        let mut pageable = Pageable::first(PAGE_SIZE);
        loop {
            let page = self.applications.search(&criteria, pageable).await?;
            let has_next = page.has_next();

            for application in page.content {
                if application.api_key_mode.is_some() {
                    continue;
                }
                let mut updated = application;
                updated.api_key_mode = Some(ApiKeyMode::Unspecified);
                self.applications.update(updated).await?;
                backfilled += 1;
            }

            if !has_next {
                break;
            }
            pageable = pageable.next();
        }

        info!("Backfilled API-key mode on {} application(s)", backfilled);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::Application;
    use crate::repository::memory::InMemoryApplicationRepository;

    fn application(id: &str, api_key_mode: Option<ApiKeyMode>) -> Application {
        Application {
            id: id.to_string(),
            environment_id: "env-1".to_string(),
            name: format!("app {}", id),
            api_key_mode,
        }
    }

    #[tokio::test]
    async fn test_backfills_only_missing_modes() {
        let applications = Arc::new(InMemoryApplicationRepository::new());
        applications.insert(application("app-1", None)).await;
        applications
            .insert(application("app-2", Some(ApiKeyMode::Shared)))
            .await;

        let upgrader = ApplicationApiKeyModeUpgrader::new(applications.clone());
        assert!(upgrader.execute().await.unwrap());

        assert_eq!(
            applications.get("app-1").await.unwrap().api_key_mode,
            Some(ApiKeyMode::Unspecified)
        );
        // An explicit choice is preserved.
        assert_eq!(
            applications.get("app-2").await.unwrap().api_key_mode,
            Some(ApiKeyMode::Shared)
        );
    }

    #[tokio::test]
    async fn test_reentry_is_a_no_op() {
        let applications = Arc::new(InMemoryApplicationRepository::new());
        applications.insert(application("app-1", None)).await;

        let upgrader = ApplicationApiKeyModeUpgrader::new(applications.clone());
        upgrader.execute().await.unwrap();
        upgrader.execute().await.unwrap();

        assert_eq!(
            applications.get("app-1").await.unwrap().api_key_mode,
            Some(ApiKeyMode::Unspecified)
        );
    }

    #[tokio::test]
    async fn test_scans_past_one_page() {
        let applications = Arc::new(InMemoryApplicationRepository::new());
        for i in 0..(PAGE_SIZE + 5) {
            applications
                .insert(application(&format!("app-{:04}", i), None))
                .await;
        }

        let upgrader = ApplicationApiKeyModeUpgrader::new(applications.clone());
        upgrader.execute().await.unwrap();

        let last = applications
            .get(&format!("app-{:04}", PAGE_SIZE + 4))
            .await
            .unwrap();
        assert_eq!(last.api_key_mode, Some(ApiKeyMode::Unspecified));
    }
}
