use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per role. `permissions` is a JSON map of module name to the list
/// of allowed actions; the action `"manage"` implies all of
/// create/read/update/delete.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role: String,
    #[sea_orm(column_type = "Json")]
    pub permissions: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
