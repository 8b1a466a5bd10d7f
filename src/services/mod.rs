//! Business logic, one service per resource. Services own the lifecycle
//! rules; handlers stay thin and only do permission checks and DTO mapping.

pub mod audit;
pub mod customers;
pub mod dashboard;
pub mod delivery_orders;
pub mod orders;
pub mod products;
pub mod purchase_orders;
pub mod roles;
pub mod tasks;
pub mod users;
