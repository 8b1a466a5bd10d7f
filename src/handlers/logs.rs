use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Router,
};

use crate::{
    auth::{
        rbac::{Action, Module},
        CurrentUser,
    },
    errors::ServiceError,
    handlers::common::success_response,
    services::audit::LogFilter,
    AppState,
};

/// Audit log access rides on `users` read permission, which keeps it away
/// from the read-only `user` role.
pub fn router() -> Router<AppState> {
    Router::new().route("/logs", get(query_logs))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    params(LogFilter),
    responses(
        (status = 200, description = "Up to 200 most recent entries, newest first"),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn query_logs(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<LogFilter>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Users, Action::Read)
        .await?;
    let entries = state.services.audit.query(&filter).await?;
    Ok(success_response(entries))
}
