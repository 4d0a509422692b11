use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};

use crate::entity::video_operation;

/// Short-lived handles for provider video jobs awaiting finalization.
///
/// Handles past `expires_at` are treated as absent and removed when read.
pub struct VideoOperationStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> VideoOperationStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        name: &str,
        user_key: &str,
        prompt: &str,
        aspect_ratio: &str,
        ttl: Duration,
    ) -> Result<(), DbErr> {
        let now = Utc::now();
        let model = video_operation::ActiveModel {
            name: Set(name.to_string()),
            user_key: Set(user_key.to_string()),
            prompt: Set(prompt.to_string()),
            aspect_ratio: Set(aspect_ratio.to_string()),
            created_at: Set(now),
            expires_at: Set(now + ttl),
        };

        video_operation::Entity::insert(model)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Look up a live handle owned by `user_key`.
    ///
    /// A handle owned by someone else is reported as absent.
    pub async fn get_owned(
        &self,
        name: &str,
        user_key: &str,
    ) -> Result<Option<video_operation::Model>, DbErr> {
        let Some(handle) = video_operation::Entity::find_by_id(name.to_string())
            .one(self.conn)
            .await?
        else {
            return Ok(None);
        };

        if handle.expires_at <= Utc::now() {
            self.delete(name).await?;
            return Ok(None);
        }

        if handle.user_key != user_key {
            return Ok(None);
        }

        Ok(Some(handle))
    }

    pub async fn delete(&self, name: &str) -> Result<(), DbErr> {
        video_operation::Entity::delete_by_id(name.to_string())
            .exec(self.conn)
            .await?;
        Ok(())
    }
}
