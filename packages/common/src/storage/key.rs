use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// A validated media object key of the form `{owner}/{artifact}.{ext}`.
///
/// The owner segment is an escaped form of the user key: ASCII letters,
/// digits, `-` and `_` pass through, every other byte becomes `%XX`. This keeps
/// keys flat (exactly one `/`) and free of `.`/`..` segments on every backend.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MediaKey(String);

impl MediaKey {
    /// Build the key for an artifact owned by `user_key`.
    pub fn new(user_key: &str, artifact_id: &str, extension: &str) -> Result<Self, StorageError> {
        if user_key.is_empty() {
            return Err(StorageError::InvalidKey("owner must not be empty".into()));
        }
        if artifact_id.is_empty() || !artifact_id.chars().all(is_plain_char) {
            return Err(StorageError::InvalidKey(format!(
                "artifact id must be non-empty and alphanumeric, got {artifact_id:?}"
            )));
        }
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StorageError::InvalidKey(format!(
                "invalid extension {extension:?}"
            )));
        }
        Ok(Self(format!(
            "{}/{artifact_id}.{extension}",
            escape_owner(user_key)
        )))
    }

    /// Parse a previously stored key string.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let (owner, file) = s
            .split_once('/')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing owner segment in {s:?}")))?;
        if owner.is_empty() || !owner.chars().all(|c| is_plain_char(c) || c == '%') {
            return Err(StorageError::InvalidKey(format!("bad owner segment in {s:?}")));
        }
        let (stem, ext) = file
            .rsplit_once('.')
            .ok_or_else(|| StorageError::InvalidKey(format!("missing extension in {s:?}")))?;
        if stem.is_empty()
            || !stem.chars().all(is_plain_char)
            || ext.is_empty()
            || !ext.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(StorageError::InvalidKey(format!("bad file segment in {s:?}")));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The escaped owner directory.
    pub fn owner_segment(&self) -> &str {
        self.0.split_once('/').map(|(o, _)| o).unwrap_or_default()
    }

    /// The `{artifact}.{ext}` file name.
    pub fn file_segment(&self) -> &str {
        self.0.split_once('/').map(|(_, f)| f).unwrap_or_default()
    }
}

fn is_plain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn escape_owner(user_key: &str) -> String {
    user_key
        .bytes()
        .map(|b| {
            if is_plain_char(b as char) {
                String::from(b as char)
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}

/// File extension used for blobs of the given MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

impl fmt::Debug for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaKey({})", self.0)
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MediaKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
