use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::notify::Notifier;
use crate::storage::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to create output folder '{folder}': {source}")]
    CreateFolder {
        folder: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to write digest '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: StorageError,
    },
}

/// File name for a digest started at `started`: the ISO-8601 timestamp with
/// millisecond precision, colons replaced by hyphens.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use feed_digest::digest::digest_file_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
/// assert_eq!(digest_file_name(at), "2024-03-09T07-05-01.000Z.md");
/// ```
pub fn digest_file_name(started: DateTime<Utc>) -> String {
    format!("{}.md", started.format("%Y-%m-%dT%H-%M-%S%.3fZ"))
}

/// Persists rendered digests into the output folder and tells the user.
pub struct DigestWriter<S, N> {
    storage: S,
    notifier: N,
    output_folder: String,
}

impl<S: Storage, N: Notifier> DigestWriter<S, N> {
    pub fn new(storage: S, notifier: N, output_folder: impl Into<String>) -> Self {
        Self {
            storage,
            notifier,
            output_folder: output_folder.into(),
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Destination path of a digest started at `started`.
    pub fn digest_path(&self, started: DateTime<Utc>) -> String {
        let file_name = digest_file_name(started);
        match self.folder() {
            "" => file_name,
            folder => format!("{}/{}", folder, file_name),
        }
    }

    fn folder(&self) -> &str {
        self.output_folder.trim_end_matches('/')
    }

    /// Writes `markdown` as a new file and notifies the user.
    ///
    /// The output folder is created first when missing. No notification is
    /// sent on failure; logging the error is left to the caller.
    pub async fn write(
        &self,
        markdown: &str,
        started: DateTime<Utc>,
    ) -> Result<String, DigestError> {
        let folder = self.folder();
        if !folder.is_empty() {
            self.ensure_folder(folder).await?;
        }

        let path = self.digest_path(started);
        self.storage
            .create_file(&path, markdown)
            .await
            .map_err(|source| DigestError::WriteFile {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path, bytes = markdown.len(), "Digest written");
        self.notifier
            .notify(&format!("RSS feeds saved to {}", path));
        Ok(path)
    }

    async fn ensure_folder(&self, folder: &str) -> Result<(), DigestError> {
        let to_error = |source| DigestError::CreateFolder {
            folder: folder.to_string(),
            source,
        };

        if !self.storage.path_exists(folder).await.map_err(to_error)? {
            tracing::debug!(folder = %folder, "Creating output folder");
            self.storage.create_folder(folder).await.map_err(to_error)?;
        }
        Ok(())
    }
}
