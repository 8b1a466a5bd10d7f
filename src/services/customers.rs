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
    auth::CurrentUser,
    entities::customer::{self, Entity as CustomerEntity, Model as CustomerModel},
    errors::ServiceError,
    services::audit::AuditLogger,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// Any additional fields the client wants to keep on the record.
    pub attributes: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub attributes: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        req.validate()?;
        if self.find_by_email(&req.email).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Customer with email '{}' already exists",
                req.email
            )));
        }

        let customer = customer::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name),
            email: Set(req.email),
            attributes: Set(req.attributes.unwrap_or_else(|| json!({}))),
            created_by: Set(Some(user.id)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let customer = customer.insert(&*self.db).await?;

        self.audit
            .record(
                "create",
                "customer",
                Some(customer.id),
                user,
                json!({ "name": customer.name }),
            )
            .await;
        Ok(customer)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Ok(CustomerEntity::find()
            .order_by_desc(customer::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<CustomerModel, ServiceError> {
        self.find_customer(id).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        req.validate()?;
        let customer = self.find_customer(id).await?;

        if let Some(email) = &req.email {
            if let Some(existing) = self.find_by_email(email).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "Customer with email '{email}' already exists"
                    )));
                }
            }
        }

        let mut active: customer::ActiveModel = customer.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(email) = req.email {
            active.email = Set(email);
        }
        if let Some(attributes) = req.attributes {
            active.attributes = Set(attributes);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "customer", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let customer = self.find_customer(id).await?;
        let name = customer.name.clone();
        customer.delete(&*self.db).await?;
        self.audit
            .record(
                "delete",
                "customer",
                Some(id),
                user,
                json!({ "name": name }),
            )
            .await;
        Ok(())
    }

    async fn find_customer(&self, id: Uuid) -> Result<CustomerModel, ServiceError> {
        CustomerEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {id} not found")))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<CustomerModel>, ServiceError> {
        Ok(CustomerEntity::find()
            .filter(customer::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }
}
