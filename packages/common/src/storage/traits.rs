use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::key::MediaKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Key-addressed media blob storage.
///
/// Writes are whole-object and atomic from a reader's point of view: a `get`
/// observes either nothing or the complete object.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store (or overwrite) the object at `key`.
    async fn put(&self, key: &MediaKey, data: &[u8], content_type: &str)
    -> Result<(), StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, key: &MediaKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an object as a streaming async reader.
    async fn get_stream(&self, key: &MediaKey) -> Result<BoxReader, StorageError>;

    /// Check whether an object exists.
    async fn exists(&self, key: &MediaKey) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &MediaKey) -> Result<bool, StorageError>;
}
