use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{rbac::ROLE_USER, AuthService, CurrentUser},
    entities::user::{self, Entity as UserEntity, Model as UserModel},
    errors::ServiceError,
    services::audit::AuditLogger,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Defaults to the read-only `user` role.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateUserRequest,
    ) -> Result<UserModel, ServiceError> {
        req.validate()?;
        if self.find_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "User with email '{}' already exists",
                req.email
            )));
        }

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name),
            email: Set(req.email),
            password_hash: Set(AuthService::hash_password(&req.password)?),
            role: Set(req.role.unwrap_or_else(|| ROLE_USER.to_string())),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db)
        .await?;

        self.audit
            .record(
                "create",
                "user",
                Some(created.id),
                user,
                json!({ "email": created.email, "role": created.role }),
            )
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserModel>, ServiceError> {
        Ok(UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<UserModel, ServiceError> {
        self.find_user(id).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateUserRequest,
    ) -> Result<UserModel, ServiceError> {
        req.validate()?;
        let target = self.find_user(id).await?;

        if let Some(email) = &req.email {
            if let Some(existing) = self.find_by_email(email).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "User with email '{email}' already exists"
                    )));
                }
            }
        }

        let mut active: user::ActiveModel = target.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(email) = req.email {
            active.email = Set(email);
        }
        if let Some(password) = req.password {
            active.password_hash = Set(AuthService::hash_password(&password)?);
        }
        if let Some(is_active) = req.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "user", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        if user.id == id {
            return Err(ServiceError::ValidationError(
                "Cannot delete your own account".to_string(),
            ));
        }
        let target = self.find_user(id).await?;
        let email = target.email.clone();
        target.delete(&*self.db).await?;
        self.audit
            .record("delete", "user", Some(id), user, json!({ "email": email }))
            .await;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<UserModel, ServiceError> {
        UserEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id} not found")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, ServiceError> {
        Ok(UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }
}
