//! Logo storage on the local filesystem.
//!
//! Uploaded files are written under the images directory with a
//! timestamp-prefixed name; listings embed them as base64 data URIs.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use common::errors::{AppError, AppResult};
use common::utils::FileNameGenerator;

/// Attempts at finding an unused name before an upload is refused.
const MAX_NAME_ATTEMPTS: u32 = 16;

/// Reads and writes service logos in a single directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    default_logo: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, default_logo: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            default_logo: default_logo.into(),
        }
    }

    /// File name stored for services created without an upload.
    pub fn default_logo(&self) -> &str {
        &self.default_logo
    }

    /// Creates the images directory if it is missing.
    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Writes an upload under a fresh name and returns that name.
    ///
    /// Existing files are never overwritten: when two uploads land on the
    /// same name, the later one retries with a counter in its name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        self.ensure_dir().await?;
        let millis = Utc::now().timestamp_millis();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let stored = FileNameGenerator::upload_name_attempt(millis, attempt, original_name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&stored))
                .await;
            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(AppError::Image(format!("failed to create {stored}: {e}"))),
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;
            if let Err(e) = written {
                drop(file);
                let _ = tokio::fs::remove_file(self.dir.join(&stored)).await;
                return Err(AppError::Image(format!("failed to write {stored}: {e}")));
            }

            tracing::debug!(file = %stored, size = bytes.len(), "Logo stored");
            return Ok(stored);
        }

        Err(AppError::Image(format!(
            "no free file name for {original_name} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    /// Reads a stored logo and encodes it as a `data:` URI.
    pub async fn data_uri(&self, file_name: &str) -> AppResult<String> {
        let path = self.resolve(file_name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Image(format!("failed to read {file_name}: {e}")))?;
        Ok(format!(
            "data:{};base64,{}",
            mime_for(file_name),
            STANDARD.encode(bytes)
        ))
    }

    /// Removes an uploaded logo. The shared default logo is never removed.
    pub async fn remove(&self, file_name: &str) -> AppResult<()> {
        if file_name == self.default_logo {
            return Ok(());
        }
        let path = self.resolve(file_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Image(format!("failed to remove {file_name}: {e}"))),
        }
    }

    fn resolve(&self, file_name: &str) -> AppResult<PathBuf> {
        if !FileNameGenerator::is_plain(file_name) {
            return Err(AppError::Image(format!("invalid image name: {file_name}")));
        }
        Ok(self.dir.join(file_name))
    }
}

/// Image MIME type guessed from the file extension, JPEG otherwise.
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        _ => "image/jpeg",
    }
}
