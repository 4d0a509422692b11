use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Allowlist entry: a user key may open sessions only while `enabled` is set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "credential")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_key: String,

    pub enabled: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
