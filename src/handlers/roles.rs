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
    services::roles::{AssignPermissionsRequest, AssignRoleRequest, CreateRoleRequest},
    AppState,
};

/// Role administration rides on the `users` module: listing needs read,
/// every mutation needs the `manage` grant, so only superadmins shape
/// what roles exist.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/roles", get(list_roles).post(create_role))
        .route("/roles/:role", axum::routing::delete(delete_role))
        .route("/roles/:role/permissions", post(assign_permissions))
        .route("/users/:id/role", post(assign_role))
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses((status = 200, description = "All roles with their permission documents")),
    security(("Bearer" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Read)
        .await?;
    let roles = state.services.roles.list().await?;
    Ok(success_response(roles))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created"),
        (status = 409, description = "Role already exists", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateRoleRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Manage)
        .await?;
    let created = state.services.roles.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{role}",
    params(("role" = String, Path, description = "Role name")),
    responses(
        (status = 200, description = "Role removed"),
        (status = 409, description = "Role still in use", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Manage)
        .await?;
    state.services.roles.delete(&user, &role).await?;
    Ok(message_response("Role deleted"))
}

#[utoipa::path(
    post,
    path = "/api/roles/{role}/permissions",
    params(("role" = String, Path, description = "Role name")),
    request_body = AssignPermissionsRequest,
    responses(
        (status = 200, description = "Permission document replaced"),
        (status = 404, description = "Unknown role", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn assign_permissions(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
    Json(req): Json<AssignPermissionsRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Manage)
        .await?;
    let updated = state
        .services
        .roles
        .assign_permissions(&user, &role, req)
        .await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/role",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "User moved to role"),
        (status = 404, description = "Unknown role or user", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn assign_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Manage)
        .await?;
    let updated = state.services.roles.assign_role(&user, user_id, req).await?;
    Ok(success_response(updated))
}
