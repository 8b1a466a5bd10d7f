use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    entities::{
        audit_log::Model as AuditLogModel,
        delivery_order, delivery_order_item,
        order::{self, Entity as OrderEntity, Model as OrderModel},
        order_item::{self, Entity as OrderItemEntity},
        product::Entity as ProductEntity,
        task,
    },
    errors::ServiceError,
    models::{OrderStatus, TaskPriority, TaskStatus, TaskType},
    services::{audit::AuditLogger, delivery_orders::allocate_do_number},
};

/// Days until the fallback task deadline when an order has no expected
/// delivery date.
const DEFAULT_TASK_DEADLINE_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(length(min = 1))]
    pub items: Vec<CreateOrderItemRequest>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
}

/// Status is excluded on purpose; it only moves through the lifecycle
/// operations.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: Option<String>,
    pub expected_delivery_date: Option<DateTime<Utc>>,
    /// When set, the update only applies if the stored version still
    /// matches; a stale copy gets a conflict instead of a lost update.
    pub version: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignOrderRequest {
    pub assigned_to: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvanceOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: OrderModel,
    pub items: Vec<order_item::Model>,
}

/// Result of converting an accepted order into a delivery order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversionResult {
    pub order: OrderModel,
    pub delivery_order: delivery_order::Model,
}

fn parse_status(order: &OrderModel) -> Result<OrderStatus, ServiceError> {
    order.status.parse::<OrderStatus>().map_err(|_| {
        ServiceError::InternalError(format!(
            "Order {} has unrecognized status '{}'",
            order.id, order.status
        ))
    })
}

/// Reference printed on the delivery order, derived from the order id.
fn po_number_for(order_id: Uuid) -> String {
    let simple = order_id.simple().to_string();
    format!("PO-{}", simple[simple.len() - 6..].to_uppercase())
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateOrderRequest,
    ) -> Result<OrderDetails, ServiceError> {
        req.validate()?;

        let txn = self.db.begin().await?;
        let order_id = Uuid::new_v4();
        let now = Utc::now();

        let mut total = Decimal::ZERO;
        let mut items = Vec::with_capacity(req.items.len());
        for line in &req.items {
            let Some(product) = ProductEntity::find_by_id(line.product_id).one(&txn).await? else {
                txn.rollback().await?;
                return Err(ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    line.product_id
                )));
            };
            total += product.price * Decimal::from(line.quantity);
            items.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product.id),
                quantity: Set(line.quantity),
                price: Set(product.price),
            });
        }

        let order = order::ActiveModel {
            id: Set(order_id),
            customer_name: Set(req.customer_name),
            total: Set(total),
            status: Set(OrderStatus::Pending.to_string()),
            created_by: Set(user.id),
            assigned_to: Set(None),
            expected_delivery_date: Set(req.expected_delivery_date),
            delivery_order_id: Set(None),
            accepted_at: Set(None),
            completed_at: Set(None),
            cancelled_at: Set(None),
            delivery_date: Set(None),
            invoice_url: Set(None),
            rejection_reason: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
            version: Set(1),
        };
        let order = order.insert(&txn).await?;
        OrderItemEntity::insert_many(items).exec(&txn).await?;
        txn.commit().await?;

        info!(order_id = %order.id, "Order created");
        self.audit
            .record(
                "create",
                "order",
                Some(order.id),
                user,
                json!({ "customer_name": order.customer_name, "total": order.total }),
            )
            .await;

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?;
        Ok(OrderDetails { order, items })
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<OrderDetails>, ServiceError> {
        let rows = OrderEntity::find()
            .find_with_related(OrderItemEntity)
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(order, items)| OrderDetails { order, items })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = self.find_order(id).await?;
        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(id))
            .all(&*self.db)
            .await?;
        Ok(OrderDetails { order, items })
    }

    /// Lifecycle timeline for one order, oldest entry first.
    #[instrument(skip(self))]
    pub async fn history(&self, id: Uuid) -> Result<Vec<AuditLogModel>, ServiceError> {
        self.find_order(id).await?;
        self.audit.history_for("order", id).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        req.validate()?;
        let order = self.find_order(id).await?;

        // Optimistic lock: a caller holding a stale copy loses.
        if let Some(expected) = req.version {
            if expected != order.version {
                return Err(ServiceError::Conflict(format!(
                    "Order {id} was modified by someone else (version {}, expected {expected})",
                    order.version
                )));
            }
        }

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        if let Some(customer_name) = req.customer_name {
            active.customer_name = Set(customer_name);
        }
        if let Some(date) = req.expected_delivery_date {
            active.expected_delivery_date = Set(Some(date));
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// Deletes the order and its items. Only pending orders are deletable;
    /// anything further along carries lifecycle history that reject or
    /// cancel must handle instead.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let order = self.find_order(id).await?;
        let status = parse_status(&order)?;
        if status != OrderStatus::Pending {
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                "deleted",
            ));
        }
        self.remove_with_items(order).await?;
        self.audit
            .record("delete", "order", Some(id), user, json!({}))
            .await;
        Ok(())
    }

    /// `pending -> accepted`. The processing task is created in the same
    /// transaction; if the task insert fails the acceptance rolls back.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn accept(&self, user: &CurrentUser, id: Uuid) -> Result<OrderModel, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(order) = OrderEntity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Err(ServiceError::NotFound(format!("Order {id} not found")));
        };
        let status = parse_status(&order)?;
        if !status.can_transition(OrderStatus::Accepted) {
            txn.rollback().await?;
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                OrderStatus::Accepted.to_string(),
            ));
        }

        let now = Utc::now();
        let due_date = order
            .expected_delivery_date
            .unwrap_or(now + Duration::days(DEFAULT_TASK_DEADLINE_DAYS));
        let order_id = order.id;

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.status = Set(OrderStatus::Accepted.to_string());
        active.accepted_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        let processing_task = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(format!("Process Order #{order_id}")),
            description: Set(Some(format!(
                "Prepare and fulfill order for {}",
                updated.customer_name
            ))),
            task_type: Set(TaskType::OrderProcessing.to_string()),
            status: Set(TaskStatus::Pending.to_string()),
            priority: Set(TaskPriority::High.to_string()),
            assigned_to: Set(user.name.clone()),
            due_date: Set(Some(due_date)),
            order_id: Set(Some(order_id)),
            purchase_order_id: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        processing_task.insert(&txn).await?;

        txn.commit().await?;
        info!(order_id = %id, "Order accepted");
        self.audit
            .record("accept", "order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// `pending -> accepted` without a processing task. Used by reviewers
    /// who sign off on an order someone else will work.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn approve(&self, user: &CurrentUser, id: Uuid) -> Result<OrderModel, ServiceError> {
        let order = self.find_order(id).await?;
        let status = parse_status(&order)?;
        if !status.can_transition(OrderStatus::Accepted) {
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                OrderStatus::Accepted.to_string(),
            ));
        }

        let now = Utc::now();
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.status = Set(OrderStatus::Accepted.to_string());
        active.accepted_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("approve", "order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// Rejection removes the order outright. The audit entry is the only
    /// remaining trace, so the reason travels in its details.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn reject(
        &self,
        user: &CurrentUser,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<(), ServiceError> {
        // Existence is the only precondition; a rejection removes the order
        // whatever state it reached.
        let order = self.find_order(id).await?;
        let rejected_from = order.status.clone();
        let customer_name = order.customer_name.clone();
        self.remove_with_items(order).await?;

        info!(order_id = %id, "Order rejected and removed");
        self.audit
            .record(
                "reject",
                "order",
                Some(id),
                user,
                json!({
                    "customer_name": customer_name,
                    "reason": reason,
                    "rejected_from": rejected_from,
                }),
            )
            .await;
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(&self, user: &CurrentUser, id: Uuid) -> Result<OrderModel, ServiceError> {
        let order = self.find_order(id).await?;
        let status = parse_status(&order)?;
        if !status.can_transition(OrderStatus::Cancelled) {
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                OrderStatus::Cancelled.to_string(),
            ));
        }

        let now = Utc::now();
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.status = Set(OrderStatus::Cancelled.to_string());
        active.cancelled_at = Set(Some(now));
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("cancel", "order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn assign(
        &self,
        user: &CurrentUser,
        id: Uuid,
        assignee: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        let order = self.find_order(id).await?;

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.assigned_to = Set(Some(assignee));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "assign",
                "order",
                Some(id),
                user,
                json!({ "assigned_to": assignee }),
            )
            .await;
        Ok(updated)
    }

    /// Moves the order forward through the fulfillment walk. Reaching
    /// `delivered` stamps the delivery date and the invoice link; reaching
    /// `completed` stamps the completion time.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn advance_status(
        &self,
        user: &CurrentUser,
        id: Uuid,
        target: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        if !OrderStatus::advance_targets().contains(&target) {
            return Err(ServiceError::ValidationError(format!(
                "'{target}' is not a valid fulfillment status"
            )));
        }

        let order = self.find_order(id).await?;
        let status = parse_status(&order)?;
        if !status.can_transition(target) {
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                target.to_string(),
            ));
        }

        let now = Utc::now();
        let order_id = order.id;
        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.status = Set(target.to_string());
        active.updated_at = Set(Some(now));
        match target {
            OrderStatus::Delivered => {
                active.delivery_date = Set(Some(now));
                active.invoice_url = Set(Some(format!("/invoices/SO-{order_id}.pdf")));
            }
            OrderStatus::Completed => {
                active.completed_at = Set(Some(now));
            }
            _ => {}
        }
        let updated = active.update(&*self.db).await?;

        info!(order_id = %id, status = %target, "Order status advanced");
        self.audit
            .record(
                "advance_status",
                "order",
                Some(id),
                user,
                json!({ "status": target.to_string() }),
            )
            .await;
        Ok(updated)
    }

    /// Converts an accepted order into a delivery order.
    ///
    /// The DO number is allocated, the item snapshot written and the order
    /// moved to `processing` in one transaction, so a failure at any point
    /// leaves no half-generated document and never burns a sequence number.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn convert_to_delivery_order(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<ConversionResult, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(order) = OrderEntity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Err(ServiceError::NotFound(format!("Order {id} not found")));
        };
        let status = parse_status(&order)?;
        if status != OrderStatus::Accepted {
            txn.rollback().await?;
            return Err(ServiceError::invalid_transition(
                "order",
                &order.status,
                OrderStatus::Processing.to_string(),
            ));
        }

        let now = Utc::now();
        let do_number = allocate_do_number(&txn, now).await?;
        let do_id = Uuid::new_v4();

        let items = OrderItemEntity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(&txn)
            .await?;
        if items.is_empty() {
            txn.rollback().await?;
            return Err(ServiceError::ValidationError(format!(
                "Order {id} has no items to deliver"
            )));
        }

        let delivery_order = delivery_order::ActiveModel {
            id: Set(do_id),
            do_number: Set(do_number.clone()),
            po_number: Set(po_number_for(order.id)),
            order_id: Set(order.id),
            total_amount: Set(order.total),
            customer_name: Set(order.customer_name.clone()),
            delivery_date: Set(order.expected_delivery_date.unwrap_or(now)),
            status: Set(crate::models::DeliveryStatus::Pending.to_string()),
            transporter: Set(None),
            vehicle_number: Set(None),
            driver_name: Set(None),
            contact_number: Set(None),
            created_by: Set(user.id),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let delivery_order = match delivery_order.insert(&txn).await {
            Ok(model) => model,
            // Unique index on do_number; a concurrent conversion in the same
            // month surfaces here.
            Err(e) => {
                txn.rollback().await?;
                if e.to_string().to_lowercase().contains("unique") {
                    return Err(ServiceError::Conflict(format!(
                        "Delivery order number {do_number} was already taken, retry the conversion"
                    )));
                }
                return Err(ServiceError::DatabaseError(e));
            }
        };

        let snapshots: Vec<delivery_order_item::ActiveModel> = items
            .iter()
            .map(|item| delivery_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                delivery_order_id: Set(do_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                price: Set(item.price),
            })
            .collect();
        delivery_order_item::Entity::insert_many(snapshots)
            .exec(&txn)
            .await?;

        let version = order.version;
        let mut active: order::ActiveModel = order.into();
        active.version = Set(version + 1);
        active.status = Set(OrderStatus::Processing.to_string());
        active.delivery_order_id = Set(Some(do_id));
        active.updated_at = Set(Some(now));
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(order_id = %id, do_number = %do_number, "Order converted to delivery order");
        self.audit
            .record(
                "switch_to_do",
                "order",
                Some(id),
                user,
                json!({ "do_number": do_number, "delivery_order_id": do_id }),
            )
            .await;

        Ok(ConversionResult {
            order: updated,
            delivery_order,
        })
    }

    async fn find_order(&self, id: Uuid) -> Result<OrderModel, ServiceError> {
        OrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {id} not found")))
    }

    async fn remove_with_items(&self, order: OrderModel) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        OrderItemEntity::delete_many()
            .filter(order_item::Column::OrderId.eq(order.id))
            .exec(&txn)
            .await?;
        order.delete(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn po_number_uses_last_six_hex_chars_uppercased() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440abc").unwrap();
        assert_eq!(po_number_for(id), "PO-440ABC");
    }

    #[test]
    fn po_number_is_deterministic() {
        let id = Uuid::new_v4();
        assert_eq!(po_number_for(id), po_number_for(id));
    }
}
