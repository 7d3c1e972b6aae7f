//! Plain-text document storage.
//!
//! [`TextStorage`] keeps uploaded `.txt` files in one flat directory keyed by
//! file name. The directory is created on first use.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, error};

use crate::error::{RagError, Result};

/// Extension accepted by the storage, compared case-insensitively.
pub const TEXT_EXTENSION: &str = "txt";

/// A file held in [`TextStorage`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub size_bytes: u64,
    /// Last modification time, RFC 3339 in local time.
    pub modified_at: String,
}

/// A directory of `.txt` files.
#[derive(Debug, Clone)]
pub struct TextStorage {
    root: PathBuf,
}

impl TextStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` under `file_name`, overwriting any existing file.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] if the name is not a plain `.txt` file name.
    /// - [`RagError::StorageError`] on I/O failure.
    pub async fn save(&self, file_name: &str, content: &[u8]) -> Result<StoredFile> {
        validate_file_name(file_name)?;
        require_text_extension(file_name)?;
        self.ensure_root().await?;

        let path = self.root.join(file_name);
        fs::write(&path, content).await.map_err(|e| storage_error(&path, e))?;
        debug!(file_name, size_bytes = content.len(), "stored text file");

        self.describe(file_name).await
    }

    /// List stored `.txt` files sorted by file name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StorageError`] if the directory cannot be read.
    pub async fn list(&self) -> Result<Vec<StoredFile>> {
        self.ensure_root().await?;

        let mut entries =
            fs::read_dir(&self.root).await.map_err(|e| storage_error(&self.root, e))?;
        let mut files = Vec::new();
        while let Some(entry) =
            entries.next_entry().await.map_err(|e| storage_error(&self.root, e))?
        {
            let path = entry.path();
            if !has_text_extension(&path) {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| storage_error(&path, e))?;
            if !metadata.is_file() {
                continue;
            }
            files.push(StoredFile {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: metadata.len(),
                modified_at: format_modified(&metadata),
            });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// Read a stored file as text, dropping invalid UTF-8 sequences.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidInput`] for malformed names or a non-`.txt` file.
    /// - [`RagError::NotFound`] if no such file is stored.
    /// - [`RagError::StorageError`] on I/O failure.
    pub async fn read_text(&self, file_name: &str) -> Result<String> {
        validate_file_name(file_name)?;
        self.ensure_root().await?;

        let path = self.root.join(file_name);
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(not_found(file_name)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(not_found(file_name));
            }
            Err(e) => return Err(storage_error(&path, e)),
        }
        require_text_extension(file_name)?;

        let bytes = fs::read(&path).await.map_err(|e| storage_error(&path, e))?;
        Ok(decode_text(&bytes))
    }

    async fn describe(&self, file_name: &str) -> Result<StoredFile> {
        let path = self.root.join(file_name);
        let metadata = fs::metadata(&path).await.map_err(|e| storage_error(&path, e))?;
        Ok(StoredFile {
            file_name: file_name.to_string(),
            size_bytes: metadata.len(),
            modified_at: format_modified(&metadata),
        })
    }

    async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| storage_error(&self.root, e))
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them.
pub fn decode_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Reject names that are empty or could escape the storage directory.
pub fn validate_file_name(file_name: &str) -> Result<()> {
    let invalid = file_name.trim().is_empty()
        || file_name.contains(['/', '\\', '\0'])
        || file_name == "."
        || file_name == "..";
    if invalid {
        return Err(RagError::InvalidInput(format!("invalid file name '{file_name}'")));
    }
    Ok(())
}

/// Require a `.txt` extension (case-insensitive).
pub fn require_text_extension(file_name: &str) -> Result<()> {
    if has_text_extension(Path::new(file_name)) {
        Ok(())
    } else {
        Err(RagError::InvalidInput(format!("only .{TEXT_EXTENSION} files are supported")))
    }
}

fn has_text_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
}

fn format_modified(metadata: &std::fs::Metadata) -> String {
    metadata
        .modified()
        .map(|t| DateTime::<Local>::from(t).to_rfc3339())
        .unwrap_or_default()
}

fn not_found(file_name: &str) -> RagError {
    RagError::NotFound(format!("file '{file_name}' is not in storage"))
}

fn storage_error(path: &Path, source: std::io::Error) -> RagError {
    error!(path = %path.display(), error = %source, "storage operation failed");
    RagError::StorageError { path: path.to_path_buf(), source }
}
