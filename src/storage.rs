//! Host storage collaborator.
//!
//! Paths are `/`-separated strings relative to the storage root, the way the
//! digest writer builds them. [`LocalStorage`] maps them onto a directory.
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// SEC-008: Absolute paths and `..` components would escape the root.
    #[error("Path escapes storage root: {0}")]
    OutsideRoot(String),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn path_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Creates the folder and any missing parents. Succeeds if it already exists.
    async fn create_folder(&self, path: &str) -> Result<(), StorageError>;

    /// Creates a new file. Never overwrites: an existing file is an error.
    async fn create_file(&self, path: &str, contents: &str) -> Result<(), StorageError>;
}

/// Filesystem storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::OutsideRoot(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(path: &str) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_string(),
        source,
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn path_exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full).await.map_err(io_error(path))
    }

    async fn create_folder(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        tokio::fs::create_dir_all(&full)
            .await
            .map_err(io_error(path))
    }

    async fn create_file(&self, path: &str, contents: &str) -> Result<(), StorageError> {
        use tokio::io::AsyncWriteExt;

        let full = self.resolve(path)?;
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true) // Fails if the file exists, never clobbers a previous digest
            .open(&full)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(io_error(path)(e)),
        };

        let written = match file.write_all(contents.as_bytes()).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };
        drop(file);
        discard_on_error(&full, written)
            .await
            .map_err(io_error(path))
    }
}

/// Removes a file whose write failed part-way, so no truncated digest is left.
/// Removal is best effort; the original write error is what gets returned.
async fn discard_on_error(full: &Path, written: std::io::Result<()>) -> std::io::Result<()> {
    if written.is_err() {
        if let Err(e) = tokio::fs::remove_file(full).await {
            tracing::warn!(path = %full.display(), error = %e, "Failed to remove partial digest");
        }
    }
    written
}
