use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::{
        rbac::{Action, Module},
        CurrentUser,
    },
    errors::ServiceError,
    handlers::common::{created_response, message_response, success_response},
    services::{
        delivery_orders::{UpdateDeliveryStatusRequest, UpdateTransportInfoRequest},
        orders::{
            AdvanceOrderStatusRequest, AssignOrderRequest, CreateOrderRequest, UpdateOrderRequest,
        },
    },
    AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RejectOrderRequest {
    pub reason: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Delivery routes first; `/orders/:id` must not swallow `/orders/delivery`.
        .route("/orders/delivery", get(list_delivery_orders))
        .route("/orders/delivery/:id", get(get_delivery_order))
        .route("/orders/delivery/:id/status", post(update_delivery_status))
        .route(
            "/orders/delivery/:id/transport",
            put(update_transport_info),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/:id",
            get(get_order).put(update_order).delete(delete_order),
        )
        .route("/orders/:id/history", get(order_history))
        .route("/orders/:id/accept", post(accept_order))
        .route("/orders/:id/reject", post(reject_order))
        .route("/orders/:id/approve", post(approve_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/assign", post(assign_order))
        .route("/orders/:id/advance-status", post(advance_order_status))
        .route("/orders/:id/switch-to-do", post(switch_to_delivery_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses((status = 200, description = "All orders with items")),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Read)
        .await?;
    let orders = state.services.orders.list().await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Unknown product or empty order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Create)
        .await?;
    let created = state.services.orders.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order with items"),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Read)
        .await?;
    let order = state.services.orders.get(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/history",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Lifecycle timeline, oldest first"),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn order_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Read)
        .await?;
    let history = state.services.orders.history(id).await?;
    Ok(success_response(history))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated"),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let updated = state.services.orders.update(&user, id, req).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order removed"),
        (status = 400, description = "Order past pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Delete)
        .await?;
    state.services.orders.delete(&user, id).await?;
    Ok(message_response("Order deleted"))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/accept",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order accepted, processing task created"),
        (status = 400, description = "Order not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn accept_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let order = state.services.orders.accept(&user, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/reject",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = RejectOrderRequest,
    responses(
        (status = 200, description = "Order rejected and removed"),
        (status = 400, description = "Order not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn reject_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectOrderRequest>>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let reason = body.and_then(|Json(req)| req.reason);
    state.services.orders.reject(&user, id, reason).await?;
    Ok(message_response("Order rejected"))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/approve",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order approved"),
        (status = 400, description = "Order not pending", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn approve_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let order = state.services.orders.approve(&user, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 400, description = "Order already terminal", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let order = state.services.orders.cancel(&user, id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/assign",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AssignOrderRequest,
    responses((status = 200, description = "Order assigned")),
    security(("Bearer" = []))
)]
pub async fn assign_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignOrderRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let order = state
        .services
        .orders
        .assign(&user, id, req.assigned_to)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/advance-status",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = AdvanceOrderStatusRequest,
    responses(
        (status = 200, description = "Order moved forward"),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn advance_order_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AdvanceOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let order = state
        .services
        .orders
        .advance_status(&user, id, req.status)
        .await?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/switch-to-do",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Delivery order generated, order now processing"),
        (status = 400, description = "Order not accepted", body = crate::errors::ErrorResponse),
        (status = 409, description = "Document number collision", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn switch_to_delivery_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let result = state
        .services
        .orders
        .convert_to_delivery_order(&user, id)
        .await?;
    Ok(success_response(result))
}

#[utoipa::path(
    get,
    path = "/api/orders/delivery",
    responses((status = 200, description = "All delivery orders with item snapshots")),
    security(("Bearer" = []))
)]
pub async fn list_delivery_orders(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Read)
        .await?;
    let delivery_orders = state.services.delivery_orders.list().await?;
    Ok(success_response(delivery_orders))
}

#[utoipa::path(
    get,
    path = "/api/orders/delivery/{id}",
    params(("id" = Uuid, Path, description = "Delivery order id")),
    responses(
        (status = 200, description = "The delivery order"),
        (status = 404, description = "Unknown delivery order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_delivery_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Read)
        .await?;
    let delivery_order = state.services.delivery_orders.get(id).await?;
    Ok(success_response(delivery_order))
}

#[utoipa::path(
    post,
    path = "/api/orders/delivery/{id}/status",
    params(("id" = Uuid, Path, description = "Delivery order id")),
    request_body = UpdateDeliveryStatusRequest,
    responses(
        (status = 200, description = "Status updated; delivered completes the source order"),
        (status = 404, description = "Unknown delivery order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDeliveryStatusRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let updated = state
        .services
        .delivery_orders
        .update_status(&user, id, req.status)
        .await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    put,
    path = "/api/orders/delivery/{id}/transport",
    params(("id" = Uuid, Path, description = "Delivery order id")),
    request_body = UpdateTransportInfoRequest,
    responses(
        (status = 200, description = "Transport details updated"),
        (status = 404, description = "Unknown delivery order", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_transport_info(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTransportInfoRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Orders, Action::Update)
        .await?;
    let updated = state
        .services
        .delivery_orders
        .update_transport_info(&user, id, req)
        .await?;
    Ok(success_response(updated))
}
