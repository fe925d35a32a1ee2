//! In-memory repository implementations
//!
//! Thread-safe stores used as test fixtures across the upgrader suite.
//! Enumeration is ordered by entity id so paginated scans are reproducible.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Api, Application, Category, Environment, Installation, Organization, Page, Pageable, Role,
    RoleScope,
};
use crate::error::{storage_error, AppError, AppResult};
use crate::repository::{
    ApiCriteria, ApiRepository, ApplicationCriteria, ApplicationRepository, CategoryRepository,
    EnvironmentRepository, InstallationRepository, OrganizationRepository, RoleRepository,
};

fn paginate<T: Clone>(mut items: Vec<(String, T)>, pageable: Pageable) -> Page<T> {
    items.sort_by(|a, b| a.0.cmp(&b.0));
    let total = items.len();
    let content = items
        .into_iter()
        .skip(pageable.offset())
        .take(pageable.size)
        .map(|(_, item)| item)
        .collect();
    Page::new(content, pageable, total)
}

/// In-memory organization store
#[derive(Default)]
pub struct InMemoryOrganizationRepository {
    organizations: Arc<RwLock<HashMap<String, Organization>>>,
}

impl InMemoryOrganizationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, organization: Organization) {
        let mut organizations = self.organizations.write().await;
        organizations.insert(organization.id.clone(), organization);
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryOrganizationRepository {
    async fn find_all(&self) -> AppResult<Vec<Organization>> {
        let organizations = self.organizations.read().await;
        let mut all: Vec<Organization> = organizations.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

/// In-memory environment store
#[derive(Default)]
pub struct InMemoryEnvironmentRepository {
    environments: Arc<RwLock<HashMap<String, Environment>>>,
}

impl InMemoryEnvironmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, environment: Environment) {
        let mut environments = self.environments.write().await;
        environments.insert(environment.id.clone(), environment);
    }

    pub async fn get(&self, id: &str) -> Option<Environment> {
        self.environments.read().await.get(id).cloned()
    }
}

#[async_trait]
impl EnvironmentRepository for InMemoryEnvironmentRepository {
    async fn find_all(&self) -> AppResult<Vec<Environment>> {
        let environments = self.environments.read().await;
        let mut all: Vec<Environment> = environments.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn update(&self, environment: Environment) -> AppResult<Environment> {
        let mut environments = self.environments.write().await;
        if !environments.contains_key(&environment.id) {
            return Err(AppError::NotFound(format!(
                "Environment {} not found",
                environment.id
            )));
        }
        environments.insert(environment.id.clone(), environment.clone());
        Ok(environment)
    }
}

/// In-memory API store with per-id failure injection for update calls
#[derive(Default)]
pub struct InMemoryApiRepository {
    apis: Arc<RwLock<HashMap<String, Api>>>,
    failing_updates: Arc<RwLock<HashSet<String>>>,
    update_count: Arc<RwLock<usize>>,
}

impl InMemoryApiRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, api: Api) {
        let mut apis = self.apis.write().await;
        apis.insert(api.id.clone(), api);
    }

    pub async fn get(&self, id: &str) -> Option<Api> {
        self.apis.read().await.get(id).cloned()
    }

    /// Make every `update` of the given API id fail with a storage error.
    pub async fn fail_updates_for(&self, id: impl Into<String>) {
        self.failing_updates.write().await.insert(id.into());
    }

    /// Number of successful `update` calls so far.
    pub async fn update_count(&self) -> usize {
        *self.update_count.read().await
    }
}

#[async_trait]
impl ApiRepository for InMemoryApiRepository {
    async fn search(&self, criteria: &ApiCriteria, pageable: Pageable) -> AppResult<Page<Api>> {
        let apis = self.apis.read().await;
        let matching: Vec<(String, Api)> = apis
            .values()
            .filter(|api| {
                criteria
                    .environment_id
                    .as_deref()
                    .map_or(true, |env| api.environment_id == env)
            })
            .map(|api| (api.id.clone(), api.clone()))
            .collect();
        Ok(paginate(matching, pageable))
    }

    async fn update(&self, api: Api) -> AppResult<Api> {
        if self.failing_updates.read().await.contains(&api.id) {
            return Err(storage_error(format!("injected failure updating {}", api.id)));
        }
        let mut apis = self.apis.write().await;
        if !apis.contains_key(&api.id) {
            return Err(AppError::NotFound(format!("Api {} not found", api.id)));
        }
        apis.insert(api.id.clone(), api.clone());
        *self.update_count.write().await += 1;
        Ok(api)
    }
}

/// In-memory application store
#[derive(Default)]
pub struct InMemoryApplicationRepository {
    applications: Arc<RwLock<HashMap<String, Application>>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, application: Application) {
        let mut applications = self.applications.write().await;
        applications.insert(application.id.clone(), application);
    }

    pub async fn get(&self, id: &str) -> Option<Application> {
        self.applications.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn search(
        &self,
        criteria: &ApplicationCriteria,
        pageable: Pageable,
    ) -> AppResult<Page<Application>> {
        let applications = self.applications.read().await;
        let matching: Vec<(String, Application)> = applications
            .values()
            .filter(|app| {
                criteria
                    .environment_id
                    .as_deref()
                    .map_or(true, |env| app.environment_id == env)
            })
            .map(|app| (app.id.clone(), app.clone()))
            .collect();
        Ok(paginate(matching, pageable))
    }

    async fn update(&self, application: Application) -> AppResult<Application> {
        let mut applications = self.applications.write().await;
        if !applications.contains_key(&application.id) {
            return Err(AppError::NotFound(format!(
                "Application {} not found",
                application.id
            )));
        }
        applications.insert(application.id.clone(), application.clone());
        Ok(application)
    }
}

/// In-memory category store
#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: Arc<RwLock<HashMap<String, Category>>>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, category: Category) {
        let mut categories = self.categories.write().await;
        categories.insert(category.id.clone(), category);
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_keys_by_environment(&self, environment_id: &str) -> AppResult<HashSet<String>> {
        let categories = self.categories.read().await;
        Ok(categories
            .values()
            .filter(|category| category.environment_id == environment_id)
            .map(|category| category.key.clone())
            .collect())
    }
}

/// In-memory role store
#[derive(Default)]
pub struct InMemoryRoleRepository {
    roles: Arc<RwLock<HashMap<String, Role>>>,
}

impl InMemoryRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, role: Role) {
        let mut roles = self.roles.write().await;
        roles.insert(role.id.clone(), role);
    }

    pub async fn count(&self) -> usize {
        self.roles.read().await.len()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_scope_and_name(
        &self,
        organization_id: &str,
        scope: RoleScope,
        name: &str,
    ) -> AppResult<Option<Role>> {
        let roles = self.roles.read().await;
        Ok(roles
            .values()
            .find(|role| {
                role.organization_id == organization_id && role.scope == scope && role.name == name
            })
            .cloned())
    }

    async fn create(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        let duplicate = roles.values().any(|existing| {
            existing.organization_id == role.organization_id
                && existing.scope == role.scope
                && existing.name == role.name
        });
        if roles.contains_key(&role.id) || duplicate {
            return Err(AppError::Conflict(format!(
                "Role {}:{} already exists in organization {}",
                role.scope.as_str(),
                role.name,
                role.organization_id
            )));
        }
        roles.insert(role.id.clone(), role.clone());
        Ok(role)
    }
}

/// In-memory installation singleton
pub struct InMemoryInstallationRepository {
    installation: Arc<RwLock<Installation>>,
}

impl InMemoryInstallationRepository {
    pub fn new(installation: Installation) -> Self {
        Self {
            installation: Arc::new(RwLock::new(installation)),
        }
    }
}

#[async_trait]
impl InstallationRepository for InMemoryInstallationRepository {
    async fn get(&self) -> AppResult<Installation> {
        Ok(self.installation.read().await.clone())
    }
}
