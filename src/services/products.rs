use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
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
    entities::product::{self, Entity as ProductEntity, Model as ProductModel},
    errors::ServiceError,
    services::audit::AuditLogger,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 64))]
    pub category: String,
    pub image: Option<String>,
    pub specs: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub sku: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,
    pub image: Option<String>,
    pub specs: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        req.validate()?;
        if req.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }
        if self.find_by_name(&req.name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product '{}' already exists",
                req.name
            )));
        }

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(req.name),
            description: Set(req.description),
            price: Set(req.price),
            stock: Set(req.stock),
            sku: Set(req.sku),
            category: Set(req.category),
            image: Set(req.image),
            specs: Set(req.specs.unwrap_or_else(|| json!({}))),
            created_by: Set(Some(user.id)),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let product = product.insert(&*self.db).await?;

        self.audit
            .record(
                "create",
                "product",
                Some(product.id),
                user,
                json!({ "name": product.name }),
            )
            .await;
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(ProductEntity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        self.find_product(id).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateProductRequest,
    ) -> Result<ProductModel, ServiceError> {
        req.validate()?;
        if matches!(req.price, Some(p) if p < Decimal::ZERO) {
            return Err(ServiceError::ValidationError(
                "Price cannot be negative".to_string(),
            ));
        }
        let product = self.find_product(id).await?;

        if let Some(name) = &req.name {
            if let Some(existing) = self.find_by_name(name).await? {
                if existing.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "Product '{name}' already exists"
                    )));
                }
            }
        }

        let mut active: product::ActiveModel = product.into();
        if let Some(name) = req.name {
            active.name = Set(name);
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = req.price {
            active.price = Set(price);
        }
        if let Some(stock) = req.stock {
            active.stock = Set(stock);
        }
        if let Some(sku) = req.sku {
            active.sku = Set(sku);
        }
        if let Some(category) = req.category {
            active.category = Set(category);
        }
        if let Some(image) = req.image {
            active.image = Set(Some(image));
        }
        if let Some(specs) = req.specs {
            active.specs = Set(specs);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "product", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let product = self.find_product(id).await?;
        let name = product.name.clone();
        product.delete(&*self.db).await?;
        self.audit
            .record("delete", "product", Some(id), user, json!({ "name": name }))
            .await;
        Ok(())
    }

    async fn find_product(&self, id: Uuid) -> Result<ProductModel, ServiceError> {
        ProductEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ProductModel>, ServiceError> {
        Ok(ProductEntity::find()
            .filter(product::Column::Name.eq(name))
            .one(&*self.db)
            .await?)
    }
}
