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
    services::tasks::{CreateTaskRequest, UpdateTaskRequest},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    responses((status = 200, description = "All tasks")),
    security(("Bearer" = []))
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Tasks, Action::Read)
        .await?;
    let tasks = state.services.tasks.list().await?;
    Ok(success_response(tasks))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses((status = 201, description = "Task created")),
    security(("Bearer" = []))
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Tasks, Action::Create)
        .await?;
    let created = state.services.tasks.create(&user, req).await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task"),
        (status = 404, description = "Unknown task", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Tasks, Action::Read)
        .await?;
    let task = state.services.tasks.get(id).await?;
    Ok(success_response(task))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated"),
        (status = 404, description = "Unknown task", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Tasks, Action::Update)
        .await?;
    let updated = state.services.tasks.update(&user, id, req).await?;
    Ok(success_response(updated))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task removed"),
        (status = 404, description = "Unknown task", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state
        .permissions
        .require(&user, Module::Tasks, Action::Delete)
        .await?;
    state.services.tasks.delete(&user, id).await?;
    Ok(message_response("Task deleted"))
}
