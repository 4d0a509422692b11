use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A provider-side video job that has been started but not yet finalized.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "video_operation")]
pub struct Model {
    /// Provider operation name, e.g. `models/veo/operations/abc123`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,

    pub user_key: String,

    #[sea_orm(column_type = "Text")]
    pub prompt: String,

    pub aspect_ratio: String,

    pub created_at: DateTimeUtc,

    pub expires_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
