use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    entities::{
        delivery_order::{self, Entity as DeliveryOrderEntity, Model as DeliveryOrderModel},
        delivery_order_item::{self, Entity as DeliveryOrderItemEntity},
        order::{self, Entity as OrderEntity},
    },
    errors::ServiceError,
    models::{format_do_number, month_bounds, DeliveryStatus, OrderStatus},
    services::audit::AuditLogger,
};

/// A delivery order with its immutable item snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeliveryOrderDetails {
    #[serde(flatten)]
    pub delivery_order: DeliveryOrderModel,
    pub items: Vec<delivery_order_item::Model>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeliveryStatusRequest {
    pub status: DeliveryStatus,
}

/// Transport details stay mutable after generation; items and totals do not.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTransportInfoRequest {
    pub transporter: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub contact_number: Option<String>,
}

/// Allocates the next `DO-YYYYMMDD-NNNN` number for the month containing
/// `now`.
///
/// Counts existing delivery orders created within the calendar month and
/// uses count + 1. Must run on the same transaction as the insert it
/// numbers; the unique index on `do_number` turns a lost race into a
/// retryable conflict instead of a duplicate.
pub async fn allocate_do_number<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
) -> Result<String, ServiceError> {
    let (month_start, month_end) = month_bounds(now);
    let count = DeliveryOrderEntity::find()
        .filter(delivery_order::Column::CreatedAt.gte(month_start))
        .filter(delivery_order::Column::CreatedAt.lt(month_end))
        .count(conn)
        .await?;
    Ok(format_do_number(now, count as u32 + 1))
}

#[derive(Clone)]
pub struct DeliveryOrderService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl DeliveryOrderService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<DeliveryOrderDetails>, ServiceError> {
        let rows = DeliveryOrderEntity::find()
            .find_with_related(DeliveryOrderItemEntity)
            .order_by_desc(delivery_order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(delivery_order, items)| DeliveryOrderDetails {
                delivery_order,
                items,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<DeliveryOrderDetails, ServiceError> {
        let delivery_order = DeliveryOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery order {id} not found")))?;
        let items = DeliveryOrderItemEntity::find()
            .filter(delivery_order_item::Column::DeliveryOrderId.eq(id))
            .all(&*self.db)
            .await?;
        Ok(DeliveryOrderDetails {
            delivery_order,
            items,
        })
    }

    /// Marks the delivery order pending or delivered. Reaching `delivered`
    /// cascades to the source order, which becomes `completed` in the same
    /// transaction.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_status(
        &self,
        user: &CurrentUser,
        id: Uuid,
        status: DeliveryStatus,
    ) -> Result<DeliveryOrderModel, ServiceError> {
        let txn = self.db.begin().await?;

        let Some(delivery_order) = DeliveryOrderEntity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Err(ServiceError::NotFound(format!(
                "Delivery order {id} not found"
            )));
        };
        let order_id = delivery_order.order_id;

        let mut active: delivery_order::ActiveModel = delivery_order.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await.map_err(|e| {
            error!(delivery_order_id = %id, "Failed to update delivery status: {e}");
            ServiceError::DatabaseError(e)
        })?;

        if status == DeliveryStatus::Delivered {
            if let Some(source) = OrderEntity::find_by_id(order_id).one(&txn).await? {
                let version = source.version;
                let mut order_active: order::ActiveModel = source.into();
                order_active.version = Set(version + 1);
                order_active.status = Set(OrderStatus::Completed.to_string());
                order_active.completed_at = Set(Some(Utc::now()));
                order_active.updated_at = Set(Some(Utc::now()));
                order_active.update(&txn).await?;
            }
        }

        txn.commit().await?;
        info!(delivery_order_id = %id, status = %status, "Delivery order status updated");

        self.audit
            .record(
                "update_delivery_status",
                "delivery_order",
                Some(id),
                user,
                json!({ "status": status.to_string() }),
            )
            .await;

        Ok(updated)
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update_transport_info(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateTransportInfoRequest,
    ) -> Result<DeliveryOrderModel, ServiceError> {
        let delivery_order = DeliveryOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Delivery order {id} not found")))?;

        let mut active: delivery_order::ActiveModel = delivery_order.into();
        if let Some(transporter) = req.transporter {
            active.transporter = Set(Some(transporter));
        }
        if let Some(vehicle_number) = req.vehicle_number {
            active.vehicle_number = Set(Some(vehicle_number));
        }
        if let Some(driver_name) = req.driver_name {
            active.driver_name = Set(Some(driver_name));
        }
        if let Some(contact_number) = req.contact_number {
            active.contact_number = Set(Some(contact_number));
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "update_transport_info",
                "delivery_order",
                Some(id),
                user,
                json!({}),
            )
            .await;

        Ok(updated)
    }
}
