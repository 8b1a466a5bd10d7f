//! sea-orm entity definitions, one module per table.

pub mod audit_log;
pub mod customer;
pub mod delivery_order;
pub mod delivery_order_item;
pub mod order;
pub mod order_item;
pub mod product;
pub mod purchase_order;
pub mod purchase_order_item;
pub mod revoked_token;
pub mod role_permission;
pub mod task;
pub mod user;
