use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Warehouse API",
        version = "1.0.0",
        description = r#"
Order management backend for warehouse operations.

Sales orders move through an explicit lifecycle (accept, convert to delivery
order, fulfillment walk); purchase orders run their own approval pipeline;
delivery orders are generated documents numbered `DO-YYYYMMDD-NNNN` per
calendar month. Every endpoint sits behind JWT auth and role-based
permissions.

Authenticate with `Authorization: Bearer <access-token>` obtained from
`/api/auth/login`.
        "#
    ),
    tags(
        (name = "Auth", description = "Login, refresh, logout"),
        (name = "Orders", description = "Sales order lifecycle"),
        (name = "Delivery Orders", description = "Generated fulfillment documents"),
        (name = "Purchase Orders", description = "Supplier order pipeline"),
        (name = "Products", description = "Catalog"),
        (name = "Customers", description = "Customer records"),
        (name = "Users", description = "Accounts and roles"),
        (name = "Tasks", description = "Warehouse work items"),
        (name = "Dashboard", description = "Aggregate counters"),
        (name = "Logs", description = "Audit trail"),
    ),
    paths(
        crate::handlers::auth::login,
        crate::handlers::auth::refresh,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,

        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::orders::order_history,
        crate::handlers::orders::update_order,
        crate::handlers::orders::delete_order,
        crate::handlers::orders::accept_order,
        crate::handlers::orders::reject_order,
        crate::handlers::orders::approve_order,
        crate::handlers::orders::cancel_order,
        crate::handlers::orders::assign_order,
        crate::handlers::orders::advance_order_status,
        crate::handlers::orders::switch_to_delivery_order,
        crate::handlers::orders::list_delivery_orders,
        crate::handlers::orders::get_delivery_order,
        crate::handlers::orders::update_delivery_status,
        crate::handlers::orders::update_transport_info,

        crate::handlers::purchase_orders::list_purchase_orders,
        crate::handlers::purchase_orders::create_purchase_order,
        crate::handlers::purchase_orders::get_purchase_order,
        crate::handlers::purchase_orders::update_purchase_order,
        crate::handlers::purchase_orders::delete_purchase_order,
        crate::handlers::purchase_orders::approve_purchase_order,
        crate::handlers::purchase_orders::cancel_purchase_order,
        crate::handlers::purchase_orders::reject_purchase_order,
        crate::handlers::purchase_orders::advance_purchase_order_status,
        crate::handlers::purchase_orders::create_delivery_order,
        crate::handlers::purchase_orders::generate_invoice,
        crate::handlers::purchase_orders::purchase_order_tasks,

        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        crate::handlers::customers::list_customers,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::update_customer,
        crate::handlers::customers::delete_customer,

        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,

        crate::handlers::roles::list_roles,
        crate::handlers::roles::create_role,
        crate::handlers::roles::delete_role,
        crate::handlers::roles::assign_permissions,
        crate::handlers::roles::assign_role,

        crate::handlers::tasks::list_tasks,
        crate::handlers::tasks::create_task,
        crate::handlers::tasks::get_task,
        crate::handlers::tasks::update_task,
        crate::handlers::tasks::delete_task,

        crate::handlers::logs::query_logs,

        crate::handlers::dashboard::stats,
        crate::handlers::dashboard::warehouse_tasks,
        crate::handlers::dashboard::stock_alerts,
    ),
    components(schemas(
        crate::ApiResponse<serde_json::Value>,
        crate::errors::ErrorResponse,
        crate::auth::TokenPair,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::RefreshRequest,
        crate::handlers::orders::RejectOrderRequest,
        crate::models::OrderStatus,
        crate::models::PurchaseOrderStatus,
        crate::models::DeliveryStatus,
        crate::models::TaskStatus,
        crate::models::TaskType,
        crate::models::TaskPriority,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::CreateOrderItemRequest,
        crate::services::orders::UpdateOrderRequest,
        crate::services::orders::AssignOrderRequest,
        crate::services::orders::AdvanceOrderStatusRequest,
        crate::services::delivery_orders::UpdateDeliveryStatusRequest,
        crate::services::delivery_orders::UpdateTransportInfoRequest,
        crate::services::purchase_orders::CreatePurchaseOrderRequest,
        crate::services::purchase_orders::CreatePurchaseOrderItemRequest,
        crate::services::purchase_orders::UpdatePurchaseOrderRequest,
        crate::services::purchase_orders::AdvancePurchaseOrderStatusRequest,
        crate::services::purchase_orders::RejectPurchaseOrderRequest,
        crate::services::products::CreateProductRequest,
        crate::services::products::UpdateProductRequest,
        crate::services::customers::CreateCustomerRequest,
        crate::services::customers::UpdateCustomerRequest,
        crate::services::users::CreateUserRequest,
        crate::services::users::UpdateUserRequest,
        crate::services::roles::CreateRoleRequest,
        crate::services::roles::AssignPermissionsRequest,
        crate::services::roles::AssignRoleRequest,
        crate::services::tasks::CreateTaskRequest,
        crate::services::tasks::UpdateTaskRequest,
        crate::services::dashboard::DashboardStats,
        crate::auth::rbac::Module,
        crate::auth::rbac::Action,
        crate::auth::rbac::ModulePermissions,
    ))
)]
pub struct ApiDoc;

pub fn swagger_router() -> Router<AppState> {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
