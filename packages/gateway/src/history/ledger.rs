use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::cursor::Cursor;
use crate::entity::history_record;

pub const MAX_PAGE_SIZE: u64 = 50;

/// Clamp a requested page size into `[1, MAX_PAGE_SIZE]`.
pub fn clamp_limit(limit: i64) -> u64 {
    limit.clamp(1, MAX_PAGE_SIZE as i64) as u64
}

fn active_model(record: history_record::Model) -> history_record::ActiveModel {
    history_record::ActiveModel {
        id: Set(record.id),
        user_key: Set(record.user_key),
        kind: Set(record.kind),
        prompt: Set(record.prompt),
        created_at: Set(record.created_at),
        blob_key: Set(record.blob_key),
        mime_type: Set(record.mime_type),
        width: Set(record.width),
        height: Set(record.height),
        extra: Set(record.extra),
    }
}

/// One page of a user's history, newest first.
#[derive(Debug)]
pub struct HistoryPage {
    pub items: Vec<history_record::Model>,
    pub next_cursor: Option<String>,
}

/// Metadata store for generated artifacts.
///
/// Ownership is not checked here; callers compare `user_key` themselves.
pub struct HistoryLedger<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> HistoryLedger<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, record: history_record::Model) -> Result<(), DbErr> {
        let model = active_model(record);
        history_record::Entity::insert(model)
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Insert unless a row with the same id already exists.
    ///
    /// Returns `true` if this call created the row.
    pub async fn insert_if_absent(&self, record: history_record::Model) -> Result<bool, DbErr> {
        let model = active_model(record);
        let result = history_record::Entity::insert(model)
            .on_conflict(
                OnConflict::column(history_record::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<history_record::Model>, DbErr> {
        history_record::Entity::find_by_id(id.to_string())
            .one(self.conn)
            .await
    }

    /// Delete a row and hand it back so the caller can remove its blob.
    pub async fn delete_by_id(&self, id: &str) -> Result<Option<history_record::Model>, DbErr> {
        let Some(record) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let result = history_record::Entity::delete_by_id(id.to_string())
            .exec(self.conn)
            .await?;
        if result.rows_affected == 0 {
            // Lost a race with a concurrent delete.
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// List `user_key`'s records ordered by `(created_at DESC, id DESC)`.
    ///
    /// Fetches one row past `limit` to learn whether another page exists.
    pub async fn list_page(
        &self,
        user_key: &str,
        limit: u64,
        cursor: Option<&Cursor>,
    ) -> Result<HistoryPage, DbErr> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let mut query = history_record::Entity::find()
            .filter(history_record::Column::UserKey.eq(user_key));

        if let Some(cursor) = cursor {
            query = query.filter(
                Condition::any()
                    .add(history_record::Column::CreatedAt.lt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(history_record::Column::CreatedAt.eq(cursor.created_at))
                            .add(history_record::Column::Id.lt(cursor.id.as_str())),
                    ),
            );
        }

        let mut items = query
            .order_by_desc(history_record::Column::CreatedAt)
            .order_by_desc(history_record::Column::Id)
            .limit(limit + 1)
            .all(self.conn)
            .await?;

        let has_more = items.len() as u64 > limit;
        items.truncate(limit as usize);

        let next_cursor = if has_more {
            items.last().map(|last| Cursor::after(last).encode())
        } else {
            None
        };

        Ok(HistoryPage { items, next_cursor })
    }
}
