use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::{
    auth::{
        rbac::{Action, Module},
        CurrentUser,
    },
    errors::ServiceError,
    handlers::common::{created_response, message_response, success_response},
    services::purchase_orders::{
        AdvancePurchaseOrderStatusRequest, CreatePurchaseOrderRequest, RejectPurchaseOrderRequest,
        UpdatePurchaseOrderRequest,
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase-orders",
            get(list_purchase_orders).post(create_purchase_order),
        )
        .route(
            "/purchase-orders/:id",
            get(get_purchase_order)
                .put(update_purchase_order)
                .delete(delete_purchase_order),
        )
        .route("/purchase-orders/:id/approve", post(approve_purchase_order))
        .route("/purchase-orders/:id/cancel", post(cancel_purchase_order))
        .route("/purchase-orders/:id/reject", post(reject_purchase_order))
        .route(
            "/purchase-orders/:id/advance-status",
            post(advance_purchase_order_status),
        )
        .route("/purchase-orders/:id/create-do", post(create_delivery_order))
        .route(
            "/purchase-orders/:id/generate-invoice",
            post(generate_invoice),
        )
        .route("/purchase-orders/:id/tasks", get(purchase_order_tasks))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders",
    responses((status = 200, description = "All purchase orders with items and totals")),
    security(("Bearer" = []))
)]
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Read)
        .await?;
    let orders = state.services.purchase_orders.list().await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders",
    request_body = CreatePurchaseOrderRequest,
    responses(
        (status = 201, description = "Purchase order created with picking and packing tasks"),
        (status = 400, description = "Unknown product or empty order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePurchaseOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Create)
        .await?;
    let created = state.services.purchase_orders.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "The purchase order"),
        (status = 404, description = "Unknown purchase order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Read)
        .await?;
    let order = state.services.purchase_orders.get(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = UpdatePurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order updated"),
        (status = 400, description = "Purchase order already terminal", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePurchaseOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let updated = state
        .services
        .purchase_orders
        .update(&user, id, req)
        .await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/purchase-orders/{id}",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order removed"),
        (status = 400, description = "Purchase order past pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Delete)
        .await?;
    state.services.purchase_orders.delete(&user, id).await?;
    Ok(message_response("Purchase order deleted"))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/approve",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order now processing"),
        (status = 400, description = "Purchase order not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn approve_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state.services.purchase_orders.approve(&user, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Purchase order cancelled"),
        (status = 400, description = "Cancellation window closed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn cancel_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state.services.purchase_orders.cancel(&user, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/reject",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = RejectPurchaseOrderRequest,
    responses(
        (status = 200, description = "Purchase order rejected"),
        (status = 400, description = "Purchase order not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn reject_purchase_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectPurchaseOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state
        .services
        .purchase_orders
        .reject(&user, id, req)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/advance-status",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    request_body = AdvancePurchaseOrderStatusRequest,
    responses(
        (status = 200, description = "Purchase order moved forward"),
        (status = 400, description = "Transition not allowed or delivery order missing", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn advance_purchase_order_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AdvancePurchaseOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state
        .services
        .purchase_orders
        .advance_status(&user, id, req.status)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/create-do",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Delivery order marked created"),
        (status = 400, description = "Purchase order not processing", body = crate::errors::ErrorResponse),
        (status = 409, description = "Delivery order already created", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_delivery_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state
        .services
        .purchase_orders
        .create_delivery_order(&user, id)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/purchase-orders/{id}/generate-invoice",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Invoice link, stable across calls"),
        (status = 400, description = "Purchase order not delivered", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn generate_invoice(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Update)
        .await?;
    let order = state
        .services
        .purchase_orders
        .generate_invoice(&user, id)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/purchase-orders/{id}/tasks",
    params(("id" = Uuid, Path, description = "Purchase order id")),
    responses(
        (status = 200, description = "Warehouse tasks linked to this purchase order"),
        (status = 404, description = "Unknown purchase order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn purchase_order_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::PurchaseOrders, Action::Read)
        .await?;
    let tasks = state.services.purchase_orders.tasks_for(id).await?;
    Ok(success_response(tasks))
}
