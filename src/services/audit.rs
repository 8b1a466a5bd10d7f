use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Deserialize;
use tracing::{instrument, warn};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::CurrentUser,
    entities::audit_log::{self, Entity as AuditLogEntity, Model as AuditLogModel},
    errors::ServiceError,
};

/// How many entries a log query returns at most.
const LOG_QUERY_LIMIT: u64 = 200;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LogFilter {
    pub user_id: Option<Uuid>,
    pub entity: Option<String>,
    pub action: Option<String>,
}

/// Append-only action log.
///
/// `record` is best-effort by contract: it is called after the triggering
/// transaction commits, and any persistence failure is logged operationally
/// and swallowed, never surfaced to the caller.
#[derive(Clone)]
pub struct AuditLogger {
    db: Arc<DatabaseConnection>,
}

impl AuditLogger {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Appends one entry with a snapshot of the acting user. Never fails.
    pub async fn record(
        &self,
        action: &str,
        entity: &str,
        entity_id: Option<Uuid>,
        user: &CurrentUser,
        details: serde_json::Value,
    ) {
        let entry = audit_log::ActiveModel {
            id: Set(Uuid::new_v4()),
            action: Set(action.to_string()),
            entity: Set(entity.to_string()),
            entity_id: Set(entity_id),
            user_id: Set(user.id),
            user_name: Set(Some(user.name.clone())),
            user_email: Set(Some(user.email.clone())),
            user_role: Set(Some(user.role.clone())),
            details: Set(details),
            timestamp: Set(Utc::now()),
        };
        if let Err(e) = AuditLogEntity::insert(entry).exec(&*self.db).await {
            warn!(action, entity, "Failed to write audit log entry: {e}");
        }
    }

    /// The 200 most recent entries matching the filter, newest first.
    #[instrument(skip(self))]
    pub async fn query(&self, filter: &LogFilter) -> Result<Vec<AuditLogModel>, ServiceError> {
        let mut query = AuditLogEntity::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(audit_log::Column::UserId.eq(user_id));
        }
        if let Some(entity) = &filter.entity {
            query = query.filter(audit_log::Column::Entity.eq(entity.clone()));
        }
        if let Some(action) = &filter.action {
            query = query.filter(audit_log::Column::Action.eq(action.clone()));
        }
        Ok(query
            .order_by_desc(audit_log::Column::Timestamp)
            .limit(LOG_QUERY_LIMIT)
            .all(&*self.db)
            .await?)
    }

    /// Every entry for one entity, oldest first. Serves the per-order
    /// history timeline.
    #[instrument(skip(self))]
    pub async fn history_for(
        &self,
        entity: &str,
        entity_id: Uuid,
    ) -> Result<Vec<AuditLogModel>, ServiceError> {
        Ok(AuditLogEntity::find()
            .filter(audit_log::Column::Entity.eq(entity))
            .filter(audit_log::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_log::Column::Timestamp)
            .all(&*self.db)
            .await?)
    }
}
