use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const KIND_IMAGE: &str = "image";
pub const KIND_VIDEO: &str = "video";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history_record")]
pub struct Model {
    /// UUID, v7 for generated images and v5 (from the operation name) for videos.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_key: String,

    /// "image" or "video".
    pub kind: String,

    #[sea_orm(column_type = "Text")]
    pub prompt: String,

    /// Unix epoch milliseconds. Paired with `id` to form the listing order.
    pub created_at: i64,

    /// Media store key, `{owner}/{id}.{ext}`.
    pub blob_key: String,

    pub mime_type: String,

    pub width: Option<i32>,
    pub height: Option<i32>,

    #[sea_orm(column_type = "Json", nullable)]
    pub extra: Option<Json>,
}

impl ActiveModelBehavior for ActiveModel {}
