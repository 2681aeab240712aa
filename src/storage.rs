//! Key-value storage persisted as a JSON object file.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StorageError;

/// Key the transaction counter is stored under.
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// String keys mapped to string values, stored in a single JSON file.
///
/// A missing file reads as empty; the file is created on first write.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.load().await?;
        Ok(items.get(key).and_then(|v| v.as_str()).map(str::to_owned))
    }

    pub async fn set_item(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut items = self.load().await?;
        let value = value.into();
        debug!(path = %self.path.display(), key, %value, "storing item");
        items.insert(key.to_owned(), Value::String(value));
        let json = serde_json::to_vec_pretty(&items)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn load(&self) -> Result<Map<String, Value>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(err) => Err(err.into()),
        }
    }
}
