use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    entities::{
        product::Entity as ProductEntity,
        purchase_order::{self, Entity as PurchaseOrderEntity, Model as PurchaseOrderModel},
        purchase_order_item::{self, Entity as PurchaseOrderItemEntity},
        task::{self, Entity as TaskEntity},
    },
    errors::ServiceError,
    models::{PurchaseOrderStatus, TaskPriority, TaskStatus, TaskType},
    services::audit::AuditLogger,
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePurchaseOrderRequest {
    #[validate(length(min = 1))]
    pub items: Vec<CreatePurchaseOrderItemRequest>,
    pub delivery_date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePurchaseOrderRequest {
    pub delivery_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdvancePurchaseOrderStatusRequest {
    pub status: PurchaseOrderStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectPurchaseOrderRequest {
    #[validate(length(min = 1, max = 1000))]
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseOrderDetails {
    #[serde(flatten)]
    pub purchase_order: PurchaseOrderModel,
    pub items: Vec<purchase_order_item::Model>,
    /// Total at current product prices; lines carry no price snapshot.
    pub total: Decimal,
}

/// Creation response includes the warehouse tasks synthesized for the order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedPurchaseOrder {
    #[serde(flatten)]
    pub details: PurchaseOrderDetails,
    pub tasks: Vec<task::Model>,
}

fn parse_status(po: &PurchaseOrderModel) -> Result<PurchaseOrderStatus, ServiceError> {
    po.status.parse::<PurchaseOrderStatus>().map_err(|_| {
        ServiceError::InternalError(format!(
            "Purchase order {} has unrecognized status '{}'",
            po.id, po.status
        ))
    })
}

#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl PurchaseOrderService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    /// Creates the purchase order, then synthesizes a picking task (due in
    /// one day) and a packing task (due in two). The tasks are best-effort:
    /// a failure there leaves the committed order intact and is only logged.
    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreatePurchaseOrderRequest,
    ) -> Result<CreatedPurchaseOrder, ServiceError> {
        req.validate()?;

        let txn = self.db.begin().await?;
        let po_id = Uuid::new_v4();
        let now = Utc::now();

        for line in &req.items {
            if ProductEntity::find_by_id(line.product_id)
                .one(&txn)
                .await?
                .is_none()
            {
                txn.rollback().await?;
                return Err(ServiceError::ValidationError(format!(
                    "Product {} does not exist",
                    line.product_id
                )));
            }
        }

        let po = purchase_order::ActiveModel {
            id: Set(po_id),
            status: Set(PurchaseOrderStatus::Pending.to_string()),
            do_created: Set(false),
            invoice_url: Set(None),
            delivery_date: Set(req.delivery_date),
            notes: Set(req.notes),
            created_by: Set(user.id),
            rejection_reason: Set(None),
            rejected_at: Set(None),
            rejected_by: Set(None),
            created_at: Set(now),
            updated_at: Set(None),
        };
        let po = po.insert(&txn).await?;

        let items: Vec<purchase_order_item::ActiveModel> = req
            .items
            .iter()
            .map(|line| purchase_order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                purchase_order_id: Set(po_id),
                product_id: Set(line.product_id),
                quantity: Set(line.quantity),
            })
            .collect();
        PurchaseOrderItemEntity::insert_many(items).exec(&txn).await?;
        txn.commit().await?;

        info!(purchase_order_id = %po_id, "Purchase order created");

        let tasks = self.synthesize_warehouse_tasks(po_id, now).await;

        self.audit
            .record(
                "create",
                "purchase_order",
                Some(po_id),
                user,
                json!({ "item_count": req.items.len() }),
            )
            .await;

        let details = self.load_details(po).await?;
        Ok(CreatedPurchaseOrder { details, tasks })
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PurchaseOrderDetails>, ServiceError> {
        let pos = PurchaseOrderEntity::find()
            .order_by_desc(purchase_order::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        let mut out = Vec::with_capacity(pos.len());
        for po in pos {
            out.push(self.load_details(po).await?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<PurchaseOrderDetails, ServiceError> {
        let po = self.find_po(id).await?;
        self.load_details(po).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdatePurchaseOrderRequest,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if status.is_terminal() {
            return Err(ServiceError::invalid_transition(
                "purchase_order",
                &po.status,
                "updated",
            ));
        }

        let mut active: purchase_order::ActiveModel = po.into();
        if let Some(date) = req.delivery_date {
            active.delivery_date = Set(date);
        }
        if let Some(notes) = req.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "purchase_order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// Pending purchase orders can be deleted outright along with their
    /// lines and tasks; anything further along must go through cancel.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if status != PurchaseOrderStatus::Pending {
            return Err(ServiceError::invalid_transition(
                "purchase_order",
                &po.status,
                "deleted",
            ));
        }

        let txn = self.db.begin().await?;
        PurchaseOrderItemEntity::delete_many()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(id))
            .exec(&txn)
            .await?;
        TaskEntity::delete_many()
            .filter(task::Column::PurchaseOrderId.eq(id))
            .exec(&txn)
            .await?;
        po.delete(&txn).await?;
        txn.commit().await?;

        self.audit
            .record("delete", "purchase_order", Some(id), user, json!({}))
            .await;
        Ok(())
    }

    /// `pending -> processing`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn approve(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let updated = self
            .transition(id, PurchaseOrderStatus::Processing, |_| Ok(()))
            .await?;
        self.audit
            .record("approve", "purchase_order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// Moves the purchase order forward. `processing -> shipping` is refused
    /// until a delivery order has been generated; reaching `delivered`
    /// stamps the delivery date.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn advance_status(
        &self,
        user: &CurrentUser,
        id: Uuid,
        target: PurchaseOrderStatus,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        if !matches!(
            target,
            PurchaseOrderStatus::Shipping | PurchaseOrderStatus::Delivered
        ) {
            return Err(ServiceError::ValidationError(format!(
                "'{target}' is not a valid advancement target"
            )));
        }

        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if !status.can_transition(target) {
            return Err(ServiceError::invalid_transition(
                "purchase_order",
                &po.status,
                target.to_string(),
            ));
        }
        if target == PurchaseOrderStatus::Shipping && !po.do_created {
            return Err(ServiceError::ValidationError(
                "Cannot move to shipping before a delivery order is created".to_string(),
            ));
        }

        let now = Utc::now();
        let mut active: purchase_order::ActiveModel = po.into();
        active.status = Set(target.to_string());
        if target == PurchaseOrderStatus::Delivered {
            active.delivery_date = Set(now);
        }
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;
        info!(purchase_order_id = %id, status = %target, "Purchase order transitioned");

        self.audit
            .record(
                "advance_status",
                "purchase_order",
                Some(id),
                user,
                json!({ "status": target.to_string() }),
            )
            .await;
        Ok(updated)
    }

    /// Cancellation is only reachable from `pending` and `processing`;
    /// orders already shipping or delivered stay on the books.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn cancel(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let updated = self
            .transition(id, PurchaseOrderStatus::Cancelled, |_| Ok(()))
            .await?;
        self.audit
            .record("cancel", "purchase_order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// `pending -> rejected`, recording who rejected it and why. Unlike
    /// sales orders, rejected purchase orders stay on the books.
    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn reject(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: RejectPurchaseOrderRequest,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        req.validate()?;
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if !status.can_transition(PurchaseOrderStatus::Rejected) {
            return Err(ServiceError::invalid_transition(
                "purchase_order",
                &po.status,
                PurchaseOrderStatus::Rejected.to_string(),
            ));
        }

        let now = Utc::now();
        let mut active: purchase_order::ActiveModel = po.into();
        active.status = Set(PurchaseOrderStatus::Rejected.to_string());
        active.rejection_reason = Set(Some(req.reason.clone()));
        active.rejected_at = Set(Some(now));
        active.rejected_by = Set(Some(user.id));
        active.updated_at = Set(Some(now));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "reject",
                "purchase_order",
                Some(id),
                user,
                json!({ "reason": req.reason }),
            )
            .await;
        Ok(updated)
    }

    /// Marks the delivery order prepared. Requires `processing`; flipping
    /// `do_created` is what unlocks the move to `shipping`.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_delivery_order(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if status != PurchaseOrderStatus::Processing {
            return Err(ServiceError::ValidationError(format!(
                "Delivery order requires a processing purchase order, found '{}'",
                po.status
            )));
        }
        if po.do_created {
            return Err(ServiceError::Conflict(format!(
                "Purchase order {id} already has a delivery order"
            )));
        }

        let mut active: purchase_order::ActiveModel = po.into();
        active.do_created = Set(true);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("create_do", "purchase_order", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    /// Produces the invoice link for a delivered purchase order. The URL is
    /// derived from the id, so repeated calls return the same link.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn generate_invoice(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<PurchaseOrderModel, ServiceError> {
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if status != PurchaseOrderStatus::Delivered {
            return Err(ServiceError::ValidationError(format!(
                "Invoice requires a delivered purchase order, found '{}'",
                po.status
            )));
        }

        let invoice_url = format!("/invoices/PO-{id}.pdf");
        if po.invoice_url.as_deref() == Some(invoice_url.as_str()) {
            return Ok(po);
        }

        let mut active: purchase_order::ActiveModel = po.into();
        active.invoice_url = Set(Some(invoice_url.clone()));
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record(
                "generate_invoice",
                "purchase_order",
                Some(id),
                user,
                json!({ "invoice_url": invoice_url }),
            )
            .await;
        Ok(updated)
    }

    /// Warehouse tasks linked to this purchase order.
    #[instrument(skip(self))]
    pub async fn tasks_for(&self, id: Uuid) -> Result<Vec<task::Model>, ServiceError> {
        // Existence check keeps a bad id a 404 rather than an empty list.
        self.find_po(id).await?;
        Ok(TaskEntity::find()
            .filter(task::Column::PurchaseOrderId.eq(id))
            .order_by_desc(task::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn transition<F>(
        &self,
        id: Uuid,
        target: PurchaseOrderStatus,
        gate: F,
    ) -> Result<PurchaseOrderModel, ServiceError>
    where
        F: FnOnce(&PurchaseOrderModel) -> Result<(), ServiceError>,
    {
        let po = self.find_po(id).await?;
        let status = parse_status(&po)?;
        if !status.can_transition(target) {
            return Err(ServiceError::invalid_transition(
                "purchase_order",
                &po.status,
                target.to_string(),
            ));
        }
        gate(&po)?;

        let mut active: purchase_order::ActiveModel = po.into();
        active.status = Set(target.to_string());
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;
        info!(purchase_order_id = %id, status = %target, "Purchase order transitioned");
        Ok(updated)
    }

    async fn synthesize_warehouse_tasks(&self, po_id: Uuid, now: DateTime<Utc>) -> Vec<task::Model> {
        let specs = [
            (TaskType::Picking, "Pick items", 1),
            (TaskType::Packing, "Pack items", 2),
        ];
        let mut created = Vec::with_capacity(specs.len());
        for (task_type, verb, days) in specs {
            let model = task::ActiveModel {
                id: Set(Uuid::new_v4()),
                title: Set(format!("{verb} for PO #{po_id}")),
                description: Set(None),
                task_type: Set(task_type.to_string()),
                status: Set(TaskStatus::Pending.to_string()),
                priority: Set(TaskPriority::Medium.to_string()),
                assigned_to: Set("Unassigned".to_string()),
                due_date: Set(Some(now + Duration::days(days))),
                order_id: Set(None),
                purchase_order_id: Set(Some(po_id)),
                created_at: Set(now),
                updated_at: Set(None),
            };
            match model.insert(&*self.db).await {
                Ok(task) => created.push(task),
                Err(e) => {
                    warn!(purchase_order_id = %po_id, task_type = %task_type, "Failed to create warehouse task: {e}");
                }
            }
        }
        created
    }

    async fn load_details(
        &self,
        po: PurchaseOrderModel,
    ) -> Result<PurchaseOrderDetails, ServiceError> {
        let items = PurchaseOrderItemEntity::find()
            .filter(purchase_order_item::Column::PurchaseOrderId.eq(po.id))
            .all(&*self.db)
            .await?;
        let mut total = Decimal::ZERO;
        for item in &items {
            if let Some(product) = ProductEntity::find_by_id(item.product_id)
                .one(&*self.db)
                .await?
            {
                total += product.price * Decimal::from(item.quantity);
            }
        }
        Ok(PurchaseOrderDetails {
            purchase_order: po,
            items,
            total,
        })
    }

    async fn find_po(&self, id: Uuid) -> Result<PurchaseOrderModel, ServiceError> {
        PurchaseOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Purchase order {id} not found")))
    }
}
