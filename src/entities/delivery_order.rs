use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Generated fulfillment document. Items and totals are snapshotted at
/// generation time and never change afterwards; only the transport fields
/// and the status stay mutable.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "delivery_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `DO-YYYYMMDD-NNNN`, sequential per calendar month.
    #[sea_orm(unique)]
    pub do_number: String,
    pub po_number: String,
    pub order_id: Uuid,
    pub total_amount: Decimal,
    pub customer_name: String,
    pub delivery_date: DateTime<Utc>,
    pub status: String,
    pub transporter: Option<String>,
    pub vehicle_number: Option<String>,
    pub driver_name: Option<String>,
    pub contact_number: Option<String>,
    pub created_by: Uuid,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::delivery_order_item::Entity")]
    DeliveryOrderItem,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::delivery_order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryOrderItem.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
