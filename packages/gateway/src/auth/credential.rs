use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Set};

use crate::entity::credential;

/// Returns `true` if `user_key` is shaped like a key worth looking up.
///
/// Empty keys and keys carrying leading or trailing whitespace are rejected
/// without touching the store.
pub fn is_well_formed_key(user_key: &str) -> bool {
    !user_key.is_empty() && user_key.trim() == user_key
}

/// Allowlist of user keys.
pub struct CredentialStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> CredentialStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// True iff the store holds an enabled entry for exactly `user_key`.
    pub async fn is_enabled(&self, user_key: &str) -> Result<bool, DbErr> {
        if !is_well_formed_key(user_key) {
            return Ok(false);
        }

        let entry = credential::Entity::find_by_id(user_key.to_string())
            .one(self.conn)
            .await?;
        Ok(entry.is_some_and(|c| c.enabled))
    }

    /// Insert or update an allowlist entry.
    pub async fn set_enabled(&self, user_key: &str, enabled: bool) -> Result<(), DbErr> {
        let model = credential::ActiveModel {
            user_key: Set(user_key.to_string()),
            enabled: Set(enabled),
            created_at: Set(Utc::now()),
        };

        credential::Entity::insert(model)
            .on_conflict(
                OnConflict::column(credential::Column::UserKey)
                    .update_column(credential::Column::Enabled)
                    .to_owned(),
            )
            .exec_without_returning(self.conn)
            .await?;
        Ok(())
    }

    /// Insert an enabled entry unless one (enabled or not) already exists.
    ///
    /// Returns `true` if a row was inserted.
    pub async fn ensure_present(&self, user_key: &str) -> Result<bool, DbErr> {
        let model = credential::ActiveModel {
            user_key: Set(user_key.to_string()),
            enabled: Set(true),
            created_at: Set(Utc::now()),
        };

        let result = credential::Entity::insert(model)
            .on_conflict(
                OnConflict::column(credential::Column::UserKey)
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
}
