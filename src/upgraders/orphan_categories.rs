//! Orphan category upgrader
//!
//! Deleting a category historically left its key dangling on every API
//! published under it. This upgrader walks each environment's APIs and
//! drops category references that no longer resolve. Best-effort: an API
//! that cannot be updated is logged and left for operators, it does not
//! block the cleanup of the rest.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::Pageable;
use crate::error::AppResult;
use crate::repository::{
    ApiCriteria, ApiRepository, CategoryRepository, EnvironmentRepository,
};
use crate::upgrade::Upgrader;

const PAGE_SIZE: usize = 100;

/// Removes API references to categories that no longer exist
pub struct OrphanCategoryUpgrader {
    environments: Arc<dyn EnvironmentRepository>,
    categories: Arc<dyn CategoryRepository>,
    apis: Arc<dyn ApiRepository>,
}

impl OrphanCategoryUpgrader {
    pub fn new(
        environments: Arc<dyn EnvironmentRepository>,
        categories: Arc<dyn CategoryRepository>,
        apis: Arc<dyn ApiRepository>,
    ) -> Self {
        Self {
            environments,
            categories,
            apis,
        }
    }
}

#[async_trait]
impl Upgrader for OrphanCategoryUpgrader {
    fn id(&self) -> &'static str {
        "OrphanCategoryUpgrader"
    }

    fn order(&self) -> i32 {
        200
    }

    async fn execute(&self) -> AppResult<bool> {
        let mut removed = 0;
        let mut failures = 0;

        for environment in self.environments.find_all().await? {
            let known = self
                .categories
                .find_keys_by_environment(&environment.id)
                .await?;
            let criteria = ApiCriteria::environment(environment.id.as_str());

            let mut pageable = Pageable::first(PAGE_SIZE);
            loop {
                let page = self.apis.search(&criteria, pageable).await?;
                let has_next = page.has_next();

                for api in page.content {
                    let retained: Vec<String> = api
                        .categories
                        .iter()
                        .filter(|key| known.contains(*key))
                        .cloned()
                        .collect();
                    if retained.len() == api.categories.len() {
                        continue;
                    }

                    let orphans = api.categories.len() - retained.len();
                    let mut cleaned = api.clone();
                    cleaned.categories = retained;
                    match self.apis.update(cleaned).await {
                        Ok(_) => removed += orphans,
                        Err(e) => {
                            warn!(
                                "Could not remove orphan categories from API {}: {}",
                                api.id, e
                            );
                            failures += 1;
                        }
                    }
                }

                if !has_next {
                    break;
                }
                pageable = pageable.next();
            }
        }

        info!(
            "Removed {} orphan category reference(s), {} API(s) could not be updated",
            removed, failures
        );
        Ok(true)
    }
}
