//! Shared fixtures for unit tests.

use std::sync::Arc;

use common::storage::MediaStore;
use common::storage::filesystem::FilesystemMediaStore;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Fresh in-memory SQLite database with the full schema.
///
/// A single pooled connection keeps every query on the same in-memory file.
pub async fn memory_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    crate::database::sync_schema(&db).await.unwrap();
    crate::seed::ensure_indexes(&db).await.unwrap();
    db
}

/// Filesystem media store rooted in a temporary directory.
pub async fn temp_media() -> (Arc<dyn MediaStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FilesystemMediaStore::new(dir.path().to_path_buf(), 1024 * 1024)
        .await
        .unwrap();
    (Arc::new(store), dir)
}
