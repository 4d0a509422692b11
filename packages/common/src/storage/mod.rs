mod error;
mod key;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

use std::sync::Arc;

pub use error::StorageError;
pub use key::{MediaKey, extension_for_mime};
pub use traits::{BoxReader, MediaStore};

use crate::config::{StorageBackend, StorageConfig};

/// Build the media store selected by `config.backend`.
pub async fn open_media_store(config: &StorageConfig) -> Result<Arc<dyn MediaStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => {
            let store =
                filesystem::FilesystemMediaStore::new(config.root.clone(), config.max_blob_size)
                    .await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "object-storage")]
        StorageBackend::S3 => {
            let s3_config = config.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.backend = \"s3\" requires [storage.s3]".into())
            })?;
            Ok(Arc::new(s3::S3MediaStore::new(s3_config, config.max_blob_size)?))
        }
        #[cfg(not(feature = "object-storage"))]
        StorageBackend::S3 => Err(StorageError::Backend(
            "built without the object-storage feature".into(),
        )),
    }
}
