pub mod auth;
pub mod common;
pub mod customers;
pub mod dashboard;
pub mod logs;
pub mod orders;
pub mod products;
pub mod purchase_orders;
pub mod roles;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::{
    audit::AuditLogger, customers::CustomerService, dashboard::DashboardService,
    delivery_orders::DeliveryOrderService, orders::OrderService,
    purchase_orders::PurchaseOrderService, products::ProductService, roles::RoleService,
    tasks::TaskService, users::UserService,
};

/// All domain services, constructed once and cloned into handlers via state.
#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub delivery_orders: DeliveryOrderService,
    pub purchase_orders: PurchaseOrderService,
    pub products: ProductService,
    pub customers: CustomerService,
    pub users: UserService,
    pub roles: RoleService,
    pub tasks: TaskService,
    pub dashboard: DashboardService,
    pub audit: AuditLogger,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let audit = AuditLogger::new(db.clone());
        Self {
            orders: OrderService::new(db.clone(), audit.clone()),
            delivery_orders: DeliveryOrderService::new(db.clone(), audit.clone()),
            purchase_orders: PurchaseOrderService::new(db.clone(), audit.clone()),
            products: ProductService::new(db.clone(), audit.clone()),
            customers: CustomerService::new(db.clone(), audit.clone()),
            users: UserService::new(db.clone(), audit.clone()),
            roles: RoleService::new(db.clone(), audit.clone()),
            tasks: TaskService::new(db.clone(), audit.clone()),
            dashboard: DashboardService::new(db),
            audit,
        }
    }
}
