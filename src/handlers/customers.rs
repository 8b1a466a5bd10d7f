use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
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
    services::customers::{CreateCustomerRequest, UpdateCustomerRequest},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

#[utoipa::path(
    get,
    path = "/api/customers",
    responses((status = 200, description = "All customers")),
    security(("Bearer" = []))
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Customers, Action::Read)
        .await?;
    let customers = state.services.customers.list().await?;
    Ok(success_response(customers))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 201, description = "Customer created"),
        (status = 409, description = "Email already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Customers, Action::Create)
        .await?;
    let created = state.services.customers.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "The customer"),
        (status = 404, description = "Unknown customer", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Customers, Action::Read)
        .await?;
    let customer = state.services.customers.get(id).await?;
    Ok(success_response(customer))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Customer updated"),
        (status = 404, description = "Unknown customer", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Customers, Action::Update)
        .await?;
    let updated = state.services.customers.update(&user, id, req).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    params(("id" = Uuid, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer removed"),
        (status = 404, description = "Unknown customer", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Customers, Action::Delete)
        .await?;
    state.services.customers.delete(&user, id).await?;
    Ok(message_response("Customer deleted"))
}
