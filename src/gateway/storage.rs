//! Upload directories.
//!
//! Originals land in `<upload_dir>/original`, enhanced images in
//! `<upload_dir>/ai` under the derived enhanced name.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::{GatewayError, GatewayResult};
use crate::core::naming::{enhanced_name, original_name};
use crate::core::StorageConfig;

/// Give up after this many name collisions in a row.
const MAX_NAME_ATTEMPTS: i64 = 1000;

/// Upload file storage.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    original_dir: PathBuf,
    ai_dir: PathBuf,
}

impl UploadStorage {
    /// Create storage over explicit directories.
    pub fn new(original_dir: impl Into<PathBuf>, ai_dir: impl Into<PathBuf>) -> Self {
        Self { original_dir: original_dir.into(), ai_dir: ai_dir.into() }
    }

    /// Create storage from the `[storage]` config section.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.original_dir(), config.ai_dir())
    }

    /// Directory of the originals.
    pub fn original_dir(&self) -> &Path {
        &self.original_dir
    }

    /// Directory of the enhanced images.
    pub fn ai_dir(&self) -> &Path {
        &self.ai_dir
    }

    /// Create both directories if needed.
    pub async fn ensure_dirs(&self) -> GatewayResult<()> {
        for dir in [&self.original_dir, &self.ai_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|source| GatewayError::Storage { path: dir.clone(), source })?;
        }
        Ok(())
    }

    /// Write an uploaded original and return its stored name.
    ///
    /// The name is `{millis}-{client name}`. When it is taken, the timestamp
    /// is bumped until a free name is found.
    pub async fn store_original(&self, client_name: &str, bytes: &[u8]) -> GatewayResult<String> {
        let start = Utc::now().timestamp_millis();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let name = original_name(start + offset, client_name);
            let path = self.original_dir.join(&name);

            let file = fs::OpenOptions::new().write(true).create_new(true).open(&path).await;
            match file {
                Ok(mut file) => {
                    write_all(&mut file, &path, bytes).await?;
                    return Ok(name);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(GatewayError::Storage { path, source }),
            }
        }

        Err(GatewayError::Storage {
            path: self.original_dir.join(original_name(start, client_name)),
            source: std::io::Error::from(ErrorKind::AlreadyExists),
        })
    }

    /// Write the enhanced version of a stored original.
    ///
    /// Returns the enhanced file name.
    pub async fn write_enhanced(&self, original: &str, bytes: &[u8]) -> GatewayResult<String> {
        let name = enhanced_name(original);
        let path = self.ai_dir.join(&name);

        let mut file = fs::File::create(&path)
            .await
            .map_err(|source| GatewayError::Storage { path: path.clone(), source })?;
        write_all(&mut file, &path, bytes).await?;

        Ok(name)
    }
}

async fn write_all(file: &mut fs::File, path: &Path, bytes: &[u8]) -> GatewayResult<()> {
    let io_err = |source: std::io::Error| GatewayError::Storage { path: path.to_path_buf(), source };
    file.write_all(bytes).await.map_err(io_err)?;
    file.flush().await.map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> UploadStorage {
        UploadStorage::new(dir.path().join("original"), dir.path().join("ai"))
    }

    #[tokio::test]
    async fn test_store_original_prefixes_timestamp() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.ensure_dirs().await.unwrap();

        let name = storage.store_original("chair.png", b"png").await.unwrap();
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "chair.png");
        assert_eq!(std::fs::read(storage.original_dir().join(&name)).unwrap(), b"png");
    }

    #[tokio::test]
    async fn test_same_client_name_stays_unique() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.ensure_dirs().await.unwrap();

        let a = storage.store_original("same.png", b"a").await.unwrap();
        let b = storage.store_original("same.png", b"b").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(std::fs::read(storage.original_dir().join(&a)).unwrap(), b"a");
    }

    #[tokio::test]
    async fn test_write_enhanced_uses_derived_name() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        storage.ensure_dirs().await.unwrap();

        let name = storage.write_enhanced("1700-chair.png", b"ai").await.unwrap();
        assert_eq!(name, "1700-chair-ai.png");
        assert!(storage.ai_dir().join("1700-chair-ai.png").exists());
    }

    #[tokio::test]
    async fn test_missing_directory_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let err = storage.store_original("a.png", b"x").await.unwrap_err();
        assert!(matches!(err, GatewayError::Storage { .. }));
    }
}
