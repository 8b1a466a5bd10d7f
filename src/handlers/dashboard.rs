use axum::{extract::State, response::Response, routing::get, Router};

use crate::{
    auth::{
        rbac::{Action, Module},
        CurrentUser,
    },
    errors::ServiceError,
    handlers::common::success_response,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/tasks", get(warehouse_tasks))
        .route("/dashboard/stock", get(stock_alerts))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses((status = 200, description = "Aggregate counters, filtered by the caller's role")),
    security(("Bearer" = []))
)]
pub async fn stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Dashboard, Action::Read)
        .await?;
    let stats = state.services.dashboard.stats(&user.role).await?;
    Ok(success_response(stats))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/tasks",
    responses((status = 200, description = "Open warehouse tasks, earliest deadline first")),
    security(("Bearer" = []))
)]
pub async fn warehouse_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Dashboard, Action::Read)
        .await?;
    let tasks = state.services.dashboard.open_warehouse_tasks().await?;
    Ok(success_response(tasks))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stock",
    responses((status = 200, description = "Products at or below the reorder level")),
    security(("Bearer" = []))
)]
pub async fn stock_alerts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Dashboard, Action::Read)
        .await?;
    let alerts = state.services.dashboard.stock_alerts().await?;
    Ok(success_response(alerts))
}
