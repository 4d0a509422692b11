use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session")]
pub struct Model {
    /// Hex SHA-256 of the cookie token. The raw token is never stored.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_key: String,

    pub created_at: DateTimeUtc,

    pub expires_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
