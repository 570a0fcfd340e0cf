//! Append-only log of extracted product details.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::core::Details;

/// File name of the log inside the data directory.
pub const DETAILS_LOG_FILE: &str = "product-details-recommendations.json";

/// JSON array of analysis results, one entry per upload.
///
/// Clones share the same lock, so concurrent uploads never interleave their
/// read-modify-write cycles.
#[derive(Debug, Clone)]
pub struct DetailsLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DetailsLog {
    /// Log stored in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self { path: data_dir.join(DETAILS_LOG_FILE), lock: Arc::new(Mutex::new(())) }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an entry for `image`.
    ///
    /// The entry is `{image, timestamp, ...details}`. An unreadable log is
    /// replaced by a fresh array.
    pub async fn append(&self, image: &str, details: &Details) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut entries = self.read_entries().await?;

        let mut entry = Map::new();
        entry.insert("image".to_string(), Value::String(image.to_string()));
        entry.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        for (key, value) in details {
            entry.insert(key.clone(), serde_json::to_value(value)?);
        }
        entries.push(Value::Object(entry));

        let content = serde_json::to_string_pretty(&entries)?;
        tokio::fs::write(&self.path, content).await?;

        tracing::debug!(path = %self.path.display(), image, "Appended product details");
        Ok(())
    }

    /// Read every entry.
    pub async fn read_entries(&self) -> anyhow::Result<Vec<Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Starting a fresh details log");
                Ok(Vec::new())
            }
        }
    }
}
