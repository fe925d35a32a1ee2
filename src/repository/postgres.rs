//! PostgreSQL repository implementations
//!
//! Direct database access for the control-plane entities, one repository
//! struct per entity, all sharing the deadpool connection pool.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::domain::{
    Api, ApiKeyMode, Application, Environment, Installation, Organization, Page, Pageable, Role,
    RoleScope,
};
use crate::error::{storage_error, AppError, AppResult};
use crate::repository::{
    ApiCriteria, ApiRepository, ApplicationCriteria, ApplicationRepository, CategoryRepository,
    EnvironmentRepository, InstallationRepository, OrganizationRepository, RoleRepository,
};

/// Organization repository backed by the `organizations` table
pub struct PgOrganizationRepository {
    pool: Pool,
}

impl PgOrganizationRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_all(&self) -> AppResult<Vec<Organization>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, name, created_at FROM organizations ORDER BY id",
                &[],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| Organization {
                id: row.get(0),
                name: row.get(1),
                created_at: row.get(2),
            })
            .collect())
    }
}

/// Environment repository backed by the `environments` table
pub struct PgEnvironmentRepository {
    pool: Pool,
}

impl PgEnvironmentRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> Environment {
        Environment {
            id: row.get(0),
            organization_id: row.get(1),
            name: row.get(2),
            console_url: row.get(3),
            portal_url: row.get(4),
        }
    }
}

#[async_trait]
impl EnvironmentRepository for PgEnvironmentRepository {
    async fn find_all(&self) -> AppResult<Vec<Environment>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, organization_id, name, console_url, portal_url
                 FROM environments ORDER BY id",
                &[],
            )
            .await?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    async fn update(&self, environment: Environment) -> AppResult<Environment> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE environments SET name = $2, console_url = $3, portal_url = $4
                 WHERE id = $1",
                &[
                    &environment.id,
                    &environment.name,
                    &environment.console_url,
                    &environment.portal_url,
                ],
            )
            .await?;

        if updated == 0 {
            return Err(AppError::NotFound(format!(
                "Environment {} not found",
                environment.id
            )));
        }
        Ok(environment)
    }
}

/// API repository backed by the `apis` table
pub struct PgApiRepository {
    pool: Pool,
}

impl PgApiRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> Api {
        Api {
            id: row.get(0),
            environment_id: row.get(1),
            name: row.get(2),
            version: row.get(3),
            categories: row.get(4),
            definition: row.get(5),
            updated_at: row.get(6),
        }
    }
}

#[async_trait]
impl ApiRepository for PgApiRepository {
    async fn search(&self, criteria: &ApiCriteria, pageable: Pageable) -> AppResult<Page<Api>> {
        let client = self.pool.get().await?;
        let limit = pageable.size as i64;
        let offset = pageable.offset() as i64;

        let (rows, total_row) = match &criteria.environment_id {
            Some(environment_id) => {
                let rows = client
                    .query(
                        "SELECT id, environment_id, name, version, categories, definition, updated_at
                         FROM apis WHERE environment_id = $1
                         ORDER BY id LIMIT $2 OFFSET $3",
                        &[environment_id, &limit, &offset],
                    )
                    .await?;
                let total = client
                    .query_one(
                        "SELECT COUNT(*) FROM apis WHERE environment_id = $1",
                        &[environment_id],
                    )
                    .await?;
                (rows, total)
            }
            None => {
                let rows = client
                    .query(
                        "SELECT id, environment_id, name, version, categories, definition, updated_at
                         FROM apis ORDER BY id LIMIT $1 OFFSET $2",
                        &[&limit, &offset],
                    )
                    .await?;
                let total = client.query_one("SELECT COUNT(*) FROM apis", &[]).await?;
                (rows, total)
            }
        };

        let total: i64 = total_row.get(0);
        let content = rows.iter().map(Self::map_row).collect();
        Ok(Page::new(content, pageable, total as usize))
    }

    async fn update(&self, api: Api) -> AppResult<Api> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE apis SET name = $2, version = $3, categories = $4,
                        definition = $5, updated_at = $6
                 WHERE id = $1",
                &[
                    &api.id,
                    &api.name,
                    &api.version,
                    &api.categories,
                    &api.definition,
                    &Utc::now(),
                ],
            )
            .await?;

        if updated == 0 {
            return Err(AppError::NotFound(format!("Api {} not found", api.id)));
        }
        Ok(api)
    }
}

/// Application repository backed by the `applications` table
pub struct PgApplicationRepository {
    pool: Pool,
}

impl PgApplicationRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> Application {
        let api_key_mode: Option<String> = row.get(3);
        Application {
            id: row.get(0),
            environment_id: row.get(1),
            name: row.get(2),
            api_key_mode: api_key_mode.as_deref().and_then(ApiKeyMode::parse),
        }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn search(
        &self,
        criteria: &ApplicationCriteria,
        pageable: Pageable,
    ) -> AppResult<Page<Application>> {
        let client = self.pool.get().await?;
        let limit = pageable.size as i64;
        let offset = pageable.offset() as i64;

        let (rows, total_row) = match &criteria.environment_id {
            Some(environment_id) => {
                let rows = client
                    .query(
                        "SELECT id, environment_id, name, api_key_mode
                         FROM applications WHERE environment_id = $1
                         ORDER BY id LIMIT $2 OFFSET $3",
                        &[environment_id, &limit, &offset],
                    )
                    .await?;
                let total = client
                    .query_one(
                        "SELECT COUNT(*) FROM applications WHERE environment_id = $1",
                        &[environment_id],
                    )
                    .await?;
                (rows, total)
            }
            None => {
                let rows = client
                    .query(
                        "SELECT id, environment_id, name, api_key_mode
                         FROM applications ORDER BY id LIMIT $1 OFFSET $2",
                        &[&limit, &offset],
                    )
                    .await?;
                let total = client
                    .query_one("SELECT COUNT(*) FROM applications", &[])
                    .await?;
                (rows, total)
            }
        };

        let total: i64 = total_row.get(0);
        let content = rows.iter().map(Self::map_row).collect();
        Ok(Page::new(content, pageable, total as usize))
    }

    async fn update(&self, application: Application) -> AppResult<Application> {
        let client = self.pool.get().await?;
        let api_key_mode = application.api_key_mode.map(|mode| mode.as_str());
        let updated = client
            .execute(
                "UPDATE applications SET name = $2, api_key_mode = $3 WHERE id = $1",
                &[&application.id, &application.name, &api_key_mode],
            )
            .await?;

        if updated == 0 {
            return Err(AppError::NotFound(format!(
                "Application {} not found",
                application.id
            )));
        }
        Ok(application)
    }
}

/// Category repository backed by the `categories` table
pub struct PgCategoryRepository {
    pool: Pool,
}

impl PgCategoryRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_keys_by_environment(&self, environment_id: &str) -> AppResult<HashSet<String>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT key FROM categories WHERE environment_id = $1",
                &[&environment_id],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}

/// Role repository backed by the `roles` table
pub struct PgRoleRepository {
    pool: Pool,
}

impl PgRoleRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> AppResult<Role> {
        let scope: String = row.get(2);
        let scope = RoleScope::parse(&scope)
            .ok_or_else(|| storage_error(format!("Unknown role scope '{}'", scope)))?;
        Ok(Role {
            id: row.get(0),
            organization_id: row.get(1),
            scope,
            name: row.get(3),
            permissions: row.get(4),
            default: row.get(5),
        })
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn find_by_scope_and_name(
        &self,
        organization_id: &str,
        scope: RoleScope,
        name: &str,
    ) -> AppResult<Option<Role>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, organization_id, scope, name, permissions, is_default
                 FROM roles WHERE organization_id = $1 AND scope = $2 AND name = $3",
                &[&organization_id, &scope.as_str(), &name],
            )
            .await?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn create(&self, role: Role) -> AppResult<Role> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO roles (id, organization_id, scope, name, permissions, is_default)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &role.id,
                    &role.organization_id,
                    &role.scope.as_str(),
                    &role.name,
                    &role.permissions,
                    &role.default,
                ],
            )
            .await
            .map_err(|e| {
                if e.to_string().contains("unique constraint") {
                    AppError::Conflict(format!(
                        "Role {}:{} already exists in organization {}",
                        role.scope.as_str(),
                        role.name,
                        role.organization_id
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;

        Ok(role)
    }
}

/// Installation repository backed by the singleton `installation` table
pub struct PgInstallationRepository {
    pool: Pool,
}

impl PgInstallationRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InstallationRepository for PgInstallationRepository {
    async fn get(&self) -> AppResult<Installation> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                "SELECT id, additional_information, created_at FROM installation LIMIT 1",
                &[],
            )
            .await?;

        if let Some(row) = row {
            let info: serde_json::Value = row.get(1);
            let additional_information: HashMap<String, String> = serde_json::from_value(info)
                .map_err(|e| storage_error(format!("Malformed installation record: {}", e)))?;
            return Ok(Installation {
                id: row.get(0),
                additional_information,
                created_at: row.get(2),
            });
        }

        // First boot of a fresh installation: persist the singleton now so
        // every later read observes the same record.
        let installation = Installation {
            id: Uuid::new_v4().to_string(),
            additional_information: HashMap::new(),
            created_at: Utc::now(),
        };
        client
            .execute(
                "INSERT INTO installation (id, additional_information, created_at)
                 VALUES ($1, $2, $3)",
                &[
                    &installation.id,
                    &serde_json::json!({}),
                    &installation.created_at,
                ],
            )
            .await?;

        Ok(installation)
    }
}
