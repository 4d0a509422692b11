use std::path::PathBuf;

use serde::Deserialize;

/// Which media store implementation backs the gateway.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    S3,
}

/// S3-compatible object storage settings.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Region name. With a custom `endpoint` this is passed through verbatim
    /// (R2 expects "auto").
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Custom endpoint URL for non-AWS providers.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Use path-style addressing (required by MinIO).
    #[serde(default)]
    pub path_style: bool,
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

/// Media storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Default: filesystem.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend. Default: "./data/media".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Hard per-object size limit in bytes. Default: 64 MiB.
    #[serde(default = "default_max_blob_size")]
    pub max_blob_size: u64,
    pub s3: Option<S3Config>,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data/media")
}
fn default_max_blob_size() -> u64 {
    64 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
            max_blob_size: default_max_blob_size(),
            s3: None,
        }
    }
}
