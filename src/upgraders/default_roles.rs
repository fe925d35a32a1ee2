//! Default roles upgrader
//!
//! Ensures every organization carries the default role set. Critical: role
//! fix-up upgraders and membership assignment depend on these roles
//! existing.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Role, RoleScope};
use crate::error::{AppError, AppResult};
use crate::repository::{OrganizationRepository, RoleRepository};
use crate::upgrade::Upgrader;

struct DefaultRoleSpec {
    scope: RoleScope,
    name: &'static str,
    permissions: &'static [&'static str],
    default: bool,
}

const DEFAULT_ROLES: &[DefaultRoleSpec] = &[
    DefaultRoleSpec {
        scope: RoleScope::Organization,
        name: "ADMIN",
        permissions: &["ORGANIZATION:CREATE_UPDATE_DELETE", "ENVIRONMENT:CREATE_UPDATE_DELETE", "ROLE:CREATE_UPDATE_DELETE", "USER:CREATE_UPDATE_DELETE"],
        default: false,
    },
    DefaultRoleSpec {
        scope: RoleScope::Organization,
        name: "USER",
        permissions: &["ORGANIZATION:READ", "ENVIRONMENT:READ"],
        default: true,
    },
    DefaultRoleSpec {
        scope: RoleScope::Environment,
        name: "ADMIN",
        permissions: &["API:CREATE_UPDATE_DELETE", "APPLICATION:CREATE_UPDATE_DELETE", "CATEGORY:CREATE_UPDATE_DELETE", "NOTIFICATION:CREATE_UPDATE_DELETE"],
        default: false,
    },
    DefaultRoleSpec {
        scope: RoleScope::Environment,
        name: "API_PUBLISHER",
        permissions: &["API:CREATE_UPDATE_DELETE", "CATEGORY:READ"],
        default: false,
    },
    DefaultRoleSpec {
        scope: RoleScope::Environment,
        name: "USER",
        permissions: &["API:READ", "APPLICATION:READ", "CATEGORY:READ"],
        default: true,
    },
];

/// Creates the default roles missing from each organization
pub struct DefaultRolesUpgrader {
    organizations: Arc<dyn OrganizationRepository>,
    roles: Arc<dyn RoleRepository>,
}

impl DefaultRolesUpgrader {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            organizations,
            roles,
        }
    }
}

#[async_trait]
impl Upgrader for DefaultRolesUpgrader {
    fn id(&self) -> &'static str {
        "DefaultRolesUpgrader"
    }

    fn order(&self) -> i32 {
        100
    }

    fn critical(&self) -> bool {
        true
    }

    async fn execute(&self) -> AppResult<bool> {
        let organizations = self.organizations.find_all().await?;
        let mut created = 0;

        for organization in &organizations {
            for spec in DEFAULT_ROLES {
                let existing = self
                    .roles
                    .find_by_scope_and_name(&organization.id, spec.scope, spec.name)
                    .await?;
                if existing.is_some() {
                    // Operators may have customized permissions on an
                    // existing role; never overwrite it.
                    continue;
                }

                let role = Role {
                    id: Uuid::new_v4().to_string(),
                    organization_id: organization.id.clone(),
                    scope: spec.scope,
                    name: spec.name.to_string(),
                    permissions: spec.permissions.iter().map(|p| p.to_string()).collect(),
                    default: spec.default,
                };
                match self.roles.create(role).await {
                    Ok(_) => created += 1,
                    // Lost a creation race: the role exists, which is all
                    // this upgrader wants.
                    Err(AppError::Conflict(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        info!(
            "Created {} default role(s) across {} organization(s)",
            created,
            organizations.len()
        );
        Ok(true)
    }
}
