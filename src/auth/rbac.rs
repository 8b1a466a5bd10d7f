/*!
 * # Role-Based Access Control
 *
 * Permission decisions are keyed by (role, module, action) and backed by the
 * `role_permissions` table, one row per role holding a module -> actions map.
 * The special action `manage` implies all of create/read/update/delete.
 *
 * Lookups fail closed: an unknown role, a module missing from the role's map,
 * or a malformed permissions document all deny.
 */

use std::collections::HashMap;

use sea_orm::{sea_query::OnConflict, ActiveValue::Set, DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{instrument, warn};
use utoipa::ToSchema;

use crate::{
    auth::CurrentUser,
    entities::role_permission::{self, Entity as RolePermissionEntity},
    errors::ServiceError,
};

pub const ROLE_SUPERADMIN: &str = "superadmin";
pub const ROLE_MANAGER: &str = "manager";
pub const ROLE_USER: &str = "user";

/// Named resource categories used as the unit of permission granting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Users,
    Products,
    Customers,
    PurchaseOrders,
    Orders,
    Tasks,
    Dashboard,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
    /// Wildcard implying all other actions.
    Manage,
}

/// Per-module view of a role's grants, with `manage` expanded for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModulePermissions {
    pub allowed: bool,
    pub actions: Vec<String>,
}

/// Whether an action list grants `action`, honoring the `manage` wildcard.
fn module_allows(actions: &[String], action: Action) -> bool {
    actions.iter().any(|a| {
        a == &Action::Manage.to_string() || a == &action.to_string()
    })
}

fn parse_permissions(raw: &serde_json::Value) -> Option<HashMap<String, Vec<String>>> {
    serde_json::from_value(raw.clone()).ok()
}

/// Resolves whether a role may perform an action on a module.
#[derive(Clone)]
pub struct PermissionService {
    db: Arc<DatabaseConnection>,
}

impl PermissionService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// `is_allowed(role, module, action)`: pure read, fail-closed.
    #[instrument(skip(self))]
    pub async fn is_allowed(
        &self,
        role: &str,
        module: Module,
        action: Action,
    ) -> Result<bool, ServiceError> {
        let record = RolePermissionEntity::find_by_id(role.to_string())
            .one(&*self.db)
            .await?;
        let Some(record) = record else {
            return Ok(false);
        };
        let Some(permissions) = parse_permissions(&record.permissions) else {
            warn!(role, "Malformed permissions document, denying");
            return Ok(false);
        };
        Ok(permissions
            .get(&module.to_string())
            .map(|actions| module_allows(actions, action))
            .unwrap_or(false))
    }

    /// Checks the acting user's stored role and rejects with 403 on deny.
    pub async fn require(
        &self,
        user: &CurrentUser,
        module: Module,
        action: Action,
    ) -> Result<(), ServiceError> {
        if self.is_allowed(&user.role, module, action).await? {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "User does not have permission to {action} {module}"
            )))
        }
    }

    /// Read-model for clients: module -> {allowed, actions}, with `manage`
    /// expanded into the enumerated action list. Purely a presentation
    /// transform; it never contracts back to `manage`.
    #[instrument(skip(self))]
    pub async fn permissions_for(
        &self,
        role: &str,
    ) -> Result<HashMap<String, ModulePermissions>, ServiceError> {
        let record = RolePermissionEntity::find_by_id(role.to_string())
            .one(&*self.db)
            .await?;
        let Some(record) = record else {
            return Ok(HashMap::new());
        };
        let Some(permissions) = parse_permissions(&record.permissions) else {
            return Ok(HashMap::new());
        };
        Ok(permissions
            .into_iter()
            .map(|(module, actions)| {
                let expanded = if actions.contains(&Action::Manage.to_string()) {
                    Action::iter()
                        .filter(|a| *a != Action::Manage)
                        .map(|a| a.to_string())
                        .collect()
                } else {
                    actions
                };
                (
                    module,
                    ModulePermissions {
                        allowed: true,
                        actions: expanded,
                    },
                )
            })
            .collect())
    }
}

/// Seeds the default role grants. Idempotent; existing rows are replaced so
/// a fresh deploy and a re-run converge on the same defaults.
pub async fn seed_default_permissions(db: &DatabaseConnection) -> Result<(), ServiceError> {
    let defaults = [
        (
            ROLE_SUPERADMIN,
            json!({
                "users": ["manage"],
                "products": ["manage"],
                "customers": ["manage"],
                "purchase_orders": ["manage"],
                "orders": ["manage"],
                "tasks": ["manage"],
                "dashboard": ["manage"],
            }),
        ),
        (
            ROLE_MANAGER,
            json!({
                "users": ["create", "read", "update"],
                "products": ["manage"],
                "customers": ["manage"],
                "purchase_orders": ["manage"],
                "orders": ["manage"],
                "tasks": ["manage"],
                "dashboard": ["manage"],
            }),
        ),
        (
            ROLE_USER,
            json!({
                "products": ["read"],
                "customers": ["read"],
                "purchase_orders": ["read"],
                "orders": ["read"],
                "tasks": ["read"],
                "dashboard": ["read"],
            }),
        ),
    ];

    for (role, permissions) in defaults {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permissions: Set(permissions),
        };
        RolePermissionEntity::insert(model)
            .on_conflict(
                OnConflict::column(role_permission::Column::Role)
                    .update_column(role_permission::Column::Permissions)
                    .to_owned(),
            )
            .exec(db)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actions(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn manage_implies_everything() {
        let granted = actions(&["manage"]);
        for action in Action::iter() {
            assert!(module_allows(&granted, action));
        }
    }

    #[test]
    fn explicit_actions_only() {
        let granted = actions(&["read", "create"]);
        assert!(module_allows(&granted, Action::Read));
        assert!(module_allows(&granted, Action::Create));
        assert!(!module_allows(&granted, Action::Update));
        assert!(!module_allows(&granted, Action::Delete));
        assert!(!module_allows(&granted, Action::Manage));
    }

    #[test]
    fn empty_grant_denies() {
        assert!(!module_allows(&[], Action::Read));
    }

    #[test]
    fn module_and_action_string_forms() {
        assert_eq!(Module::PurchaseOrders.to_string(), "purchase_orders");
        assert_eq!(Action::Manage.to_string(), "manage");
        let parsed: Module = "orders".parse().unwrap();
        assert_eq!(parsed, Module::Orders);
    }

    #[test]
    fn malformed_permissions_deny() {
        assert!(parse_permissions(&json!("not a map")).is_none());
        assert!(parse_permissions(&json!({"orders": "read"})).is_none());
        assert!(parse_permissions(&json!({"orders": ["read"]})).is_some());
    }
}
