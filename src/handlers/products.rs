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
    services::products::{CreateProductRequest, UpdateProductRequest},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    responses((status = 200, description = "All products")),
    security(("Bearer" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Products, Action::Read)
        .await?;
    let products = state.services.products.list().await?;
    Ok(success_response(products))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created"),
        (status = 409, description = "Name already taken", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Products, Action::Create)
        .await?;
    let created = state.services.products.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product"),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Products, Action::Read)
        .await?;
    let product = state.services.products.get(id).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated"),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Products, Action::Update)
        .await?;
    let updated = state.services.products.update(&user, id, req).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product removed"),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Products, Action::Delete)
        .await?;
    state.services.products.delete(&user, id).await?;
    Ok(message_response("Product deleted"))
}
