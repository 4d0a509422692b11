use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::info;

use crate::auth::credential::{CredentialStore, is_well_formed_key};
use crate::entity::{history_record, session};

/// Seed the credential allowlist from configuration.
///
/// Existing entries are left alone, so a key disabled at runtime stays disabled.
pub async fn seed_credentials(db: &DatabaseConnection, keys: &[String]) -> Result<(), DbErr> {
    let store = CredentialStore::new(db);
    let mut inserted = 0u32;
    for key in keys {
        if !is_well_formed_key(key) {
            tracing::warn!("Skipping malformed allowlist entry {:?}", key);
            continue;
        }
        if store.ensure_present(key).await? {
            inserted += 1;
        }
    }

    if inserted > 0 {
        info!("Seeded {} new credentials", inserted);
    }
    Ok(())
}

fn render(db: &DatabaseConnection, stmt: &IndexCreateStatement) -> String {
    db.get_database_backend().build(stmt).sql
}

/// Create composite indexes that schema sync doesn't cover.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // History listing:
    // WHERE user_key = ? ORDER BY created_at DESC, id DESC
    let history = Index::create()
        .if_not_exists()
        .name("idx_history_user_created_id")
        .table(history_record::Entity)
        .col(history_record::Column::UserKey)
        .col(history_record::Column::CreatedAt)
        .col(history_record::Column::Id)
        .to_owned();

    let sessions = Index::create()
        .if_not_exists()
        .name("idx_session_user_key")
        .table(session::Entity)
        .col(session::Column::UserKey)
        .to_owned();

    for (name, stmt) in [
        ("idx_history_user_created_id", history),
        ("idx_session_user_key", sessions),
    ] {
        match db.execute_unprepared(&render(db, &stmt)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
