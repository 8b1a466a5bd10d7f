use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    entities::task::{self, Entity as TaskEntity, Model as TaskModel},
    errors::ServiceError,
    models::{TaskPriority, TaskStatus, TaskType},
    services::audit::AuditLogger,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub task_type: TaskType,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub order_id: Option<Uuid>,
    pub purchase_order_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TaskService {
    db: Arc<DatabaseConnection>,
    audit: AuditLogger,
}

impl TaskService {
    pub fn new(db: Arc<DatabaseConnection>, audit: AuditLogger) -> Self {
        Self { db, audit }
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn create(
        &self,
        user: &CurrentUser,
        req: CreateTaskRequest,
    ) -> Result<TaskModel, ServiceError> {
        req.validate()?;
        let task = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(req.title),
            description: Set(req.description),
            task_type: Set(req.task_type.to_string()),
            status: Set(TaskStatus::Pending.to_string()),
            priority: Set(req.priority.unwrap_or(TaskPriority::Medium).to_string()),
            assigned_to: Set(req.assigned_to.unwrap_or_else(|| "Unassigned".to_string())),
            due_date: Set(req.due_date),
            order_id: Set(req.order_id),
            purchase_order_id: Set(req.purchase_order_id),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        let task = task.insert(&*self.db).await?;

        self.audit
            .record(
                "create",
                "task",
                Some(task.id),
                user,
                json!({ "title": task.title }),
            )
            .await;
        Ok(task)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<TaskModel>, ServiceError> {
        Ok(TaskEntity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<TaskModel, ServiceError> {
        self.find_task(id).await
    }

    #[instrument(skip(self, user, req), fields(user_id = %user.id))]
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        req: UpdateTaskRequest,
    ) -> Result<TaskModel, ServiceError> {
        req.validate()?;
        let task = self.find_task(id).await?;

        let mut active: task::ActiveModel = task.into();
        if let Some(title) = req.title {
            active.title = Set(title);
        }
        if let Some(description) = req.description {
            active.description = Set(Some(description));
        }
        if let Some(status) = req.status {
            active.status = Set(status.to_string());
        }
        if let Some(priority) = req.priority {
            active.priority = Set(priority.to_string());
        }
        if let Some(assigned_to) = req.assigned_to {
            active.assigned_to = Set(assigned_to);
        }
        if let Some(due_date) = req.due_date {
            active.due_date = Set(Some(due_date));
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&*self.db).await?;

        self.audit
            .record("update", "task", Some(id), user, json!({}))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let task = self.find_task(id).await?;
        task.delete(&*self.db).await?;
        self.audit
            .record("delete", "task", Some(id), user, json!({}))
            .await;
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> Result<TaskModel, ServiceError> {
        TaskEntity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task {id} not found")))
    }
}
