use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    auth::rbac::{ROLE_MANAGER, ROLE_SUPERADMIN},
    entities::{
        customer::Entity as CustomerEntity,
        order::{self, Entity as OrderEntity},
        product::{self, Entity as ProductEntity},
        purchase_order::Entity as PurchaseOrderEntity,
        purchase_order_item::Entity as PurchaseOrderItemEntity,
        task::{self, Entity as TaskEntity},
        user::Entity as UserEntity,
    },
    errors::ServiceError,
    models::{OrderStatus, PurchaseOrderStatus, TaskStatus},
};

/// Products at or below this stock level count as low stock.
const REORDER_LEVEL: i32 = 10;

/// Aggregate counters, filtered by role before serialization. `None` fields
/// are omitted from the payload, so a `user` sees only the operational core.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub total_products: u64,
    pub total_tasks: u64,
    pub pending_tasks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_customers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_purchase_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_stock_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    /// Value of delivered purchase orders at current product prices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockAlert {
    pub product: product::Model,
    pub reorder_level: i32,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<DatabaseConnection>,
}

impl DashboardService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Stats visible to `role`. Managers see everything except revenue;
    /// plain users see only the operational counters.
    #[instrument(skip(self))]
    pub async fn stats(&self, role: &str) -> Result<DashboardStats, ServiceError> {
        let db = &*self.db;
        let mut stats = DashboardStats {
            total_orders: OrderEntity::find().count(db).await?,
            pending_orders: OrderEntity::find()
                .filter(order::Column::Status.eq(OrderStatus::Pending.to_string()))
                .count(db)
                .await?,
            total_products: ProductEntity::find().count(db).await?,
            total_tasks: TaskEntity::find().count(db).await?,
            pending_tasks: TaskEntity::find()
                .filter(task::Column::Status.eq(TaskStatus::Pending.to_string()))
                .count(db)
                .await?,
            total_customers: None,
            total_purchase_orders: None,
            low_stock_count: None,
            total_users: None,
            revenue: None,
        };

        if role == ROLE_MANAGER || role == ROLE_SUPERADMIN {
            stats.total_customers = Some(CustomerEntity::find().count(db).await?);
            stats.total_purchase_orders = Some(PurchaseOrderEntity::find().count(db).await?);
            stats.low_stock_count = Some(
                ProductEntity::find()
                    .filter(product::Column::Stock.lte(REORDER_LEVEL))
                    .count(db)
                    .await?,
            );
        }
        if role == ROLE_SUPERADMIN {
            stats.total_users = Some(UserEntity::find().count(db).await?);
            stats.revenue = Some(self.delivered_purchase_order_value().await?);
        }
        Ok(stats)
    }

    /// Open warehouse tasks tied to purchase orders, oldest deadline first.
    #[instrument(skip(self))]
    pub async fn open_warehouse_tasks(&self) -> Result<Vec<task::Model>, ServiceError> {
        Ok(TaskEntity::find()
            .filter(task::Column::PurchaseOrderId.is_not_null())
            .filter(task::Column::Status.ne(TaskStatus::Completed.to_string()))
            .order_by_asc(task::Column::DueDate)
            .all(&*self.db)
            .await?)
    }

    /// Products at or below the reorder level, most depleted first.
    #[instrument(skip(self))]
    pub async fn stock_alerts(&self) -> Result<Vec<StockAlert>, ServiceError> {
        let products = ProductEntity::find()
            .filter(product::Column::Stock.lte(REORDER_LEVEL))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;
        Ok(products
            .into_iter()
            .map(|product| StockAlert {
                product,
                reorder_level: REORDER_LEVEL,
            })
            .collect())
    }

    /// Sums delivered purchase orders line by line at current product
    /// prices; lines whose product has since been deleted contribute zero.
    async fn delivered_purchase_order_value(&self) -> Result<Decimal, ServiceError> {
        let db = &*self.db;
        let delivered = PurchaseOrderEntity::find()
            .filter(
                crate::entities::purchase_order::Column::Status
                    .eq(PurchaseOrderStatus::Delivered.to_string()),
            )
            .all(db)
            .await?;

        let mut revenue = Decimal::ZERO;
        for po in delivered {
            let items = PurchaseOrderItemEntity::find()
                .filter(
                    crate::entities::purchase_order_item::Column::PurchaseOrderId.eq(po.id),
                )
                .all(db)
                .await?;
            for item in items {
                if let Some(product) = ProductEntity::find_by_id(item.product_id).one(db).await? {
                    revenue += product.price * Decimal::from(item.quantity);
                }
            }
        }
        Ok(revenue)
    }
}
