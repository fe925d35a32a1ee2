//! Domain repositories
//!
//! The CRUD/search collaborators upgraders mutate. Upgraders only ever see
//! these traits; the binary wires the Postgres implementations, tests wire
//! the in-memory ones. Any call may fail with a storage error, which
//! propagates as a migration-level failure.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::domain::{
    Api, Application, Environment, Installation, Organization, Page, Pageable, Role, RoleScope,
};
use crate::error::AppResult;

pub use postgres::{
    PgApiRepository, PgApplicationRepository, PgCategoryRepository, PgEnvironmentRepository,
    PgInstallationRepository, PgOrganizationRepository, PgRoleRepository,
};

/// Filter criteria for API searches
#[derive(Debug, Clone, Default)]
pub struct ApiCriteria {
    /// Restrict to one environment; `None` searches every environment.
    pub environment_id: Option<String>,
}

impl ApiCriteria {
    pub fn environment(environment_id: impl Into<String>) -> Self {
        Self {
            environment_id: Some(environment_id.into()),
        }
    }
}

/// Filter criteria for application searches
#[derive(Debug, Clone, Default)]
pub struct ApplicationCriteria {
    pub environment_id: Option<String>,
}

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Organization>>;
}

#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    async fn find_all(&self) -> AppResult<Vec<Environment>>;
    async fn update(&self, environment: Environment) -> AppResult<Environment>;
}

/// Paginated access to APIs
///
/// `search` must enumerate with a stable ordering so that repeated scans
/// visit entities in the same sequence.
#[async_trait]
pub trait ApiRepository: Send + Sync {
    async fn search(&self, criteria: &ApiCriteria, pageable: Pageable) -> AppResult<Page<Api>>;
    async fn update(&self, api: Api) -> AppResult<Api>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn search(
        &self,
        criteria: &ApplicationCriteria,
        pageable: Pageable,
    ) -> AppResult<Page<Application>>;
    async fn update(&self, application: Application) -> AppResult<Application>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Keys of every category defined in the environment.
    async fn find_keys_by_environment(&self, environment_id: &str) -> AppResult<HashSet<String>>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_scope_and_name(
        &self,
        organization_id: &str,
        scope: RoleScope,
        name: &str,
    ) -> AppResult<Option<Role>>;
    async fn create(&self, role: Role) -> AppResult<Role>;
}

/// Read-only access to the installation singleton
#[async_trait]
pub trait InstallationRepository: Send + Sync {
    async fn get(&self) -> AppResult<Installation>;
}
