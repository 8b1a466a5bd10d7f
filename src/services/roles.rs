use std::{collections::HashMap, sync::Arc};

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{
        rbac::{ROLE_MANAGER, ROLE_SUPERADMIN, ROLE_USER},
        CurrentUser,
    },
    entities::{
        role_permission::{self, Entity as RolePermissionEntity, Model as RolePermissionModel},
        user::{self, Entity as UserEntity, Model as UserModel},
    },
    errors::ServiceError,
    services::audit::AuditLogger,
};

const SEEDED_ROLES: [&str; 3] = [ROLE_SUPERADMIN, ROLE_MANAGER, ROLE_USER];

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64))]
    pub role: String,
    /// Module name to granted action list, e.g. `{"orders": ["read"]}`.
    pub permissions: Option<HashMap<String, Vec<String>>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignPermissionsRequest {
    pub permissions: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, max = 64))]
    pub role: String,
}

/// Administration of roles and their permission documents. Permission
/// checks themselves live in [`crate::auth::rbac::PermissionService`].
#[derive(Clone)]
pub struct RoleService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl RoleService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<RolePermissionModel>, ServiceError> {
        Ok(RolePermissionEntity::find().all(&*self.db).await?)
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateRoleRequest,
    ) -> Result<RolePermissionModel, ServiceError> {
        req.validate()?;
        if RolePermissionEntity::find_by_id(req.role.clone())
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Role '{}' already exists",
                req.role
            )));
        }

        let permissions = serde_json::to_value(req.permissions.unwrap_or_default())
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let created = role_permission::ActiveModel {
            role: Set(req.role.clone()),
            permissions: Set(permissions),
        }
        .insert(&*self.db)
        .await?;

        self.audit
            .record(
                "create",
                "role",
                None,
                user,
                json!({ "role": created.role }),
            )
            .await;
        Ok(created)
    }

    /// Seeded roles and roles still assigned to users cannot be deleted.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, role: &str) -> Result<(), ServiceError> {
        if SEEDED_ROLES.contains(&role) {
            return Err(ServiceError::ValidationError(format!(
                "Role '{role}' is built in and cannot be deleted"
            )));
        }
        let record = RolePermissionEntity::find_by_id(role.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role '{role}' not found")))?;

        let in_use = UserEntity::find()
            .filter(user::Column::Role.eq(role))
            .count(&*self.db)
            .await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Role '{role}' is assigned to {in_use} user(s)"
            )));
        }

        record.delete(&*self.db).await?;
        self.audit
            .record("delete", "role", None, user, json!({ "role": role }))
            .await;
        Ok(())
    }

    /// Replaces the role's whole permission document.
    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn assign_permissions(
        &self,
        user: &CurrentUser,
        role: &str,
        req: AssignPermissionsRequest,
    ) -> Result<RolePermissionModel, ServiceError> {
        let record = RolePermissionEntity::find_by_id(role.to_string())
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Role '{role}' not found")))?;

        let permissions = serde_json::to_value(req.permissions)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;
        let mut active: role_permission::ActiveModel = record.into();
        active.permissions = Set(permissions);
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "assign_permissions",
                "role",
                None,
                user,
                json!({ "role": role }),
            )
            .await;
        Ok(updated)
    }

    /// Moves a user onto an existing role.
    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn assign_role(
        &self,
        user: &CurrentUser,
        user_id: Uuid,
        req: AssignRoleRequest,
    ) -> Result<UserModel, ServiceError> {
        req.validate()?;
        if RolePermissionEntity::find_by_id(req.role.clone())
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound(format!(
                "Role '{}' not found",
                req.role
            )));
        }
        let target = UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {user_id} not found")))?;

        let mut active: user::ActiveModel = target.into();
        active.role = Set(req.role.clone());
        active.updated_at = Set(Some(chrono::Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "assign_role",
                "user",
                Some(user_id),
                user,
                json!({ "role": req.role }),
            )
            .await;
        Ok(updated)
    }
}
