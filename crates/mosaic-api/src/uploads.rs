//! Photo uploads.
//!
//! Handlers hand a received [`Upload`] to a [`BlobStore`] and persist only the
//! URL it returns. [`DiskBlobStore`] writes files into a directory that the
//! server exposes under a fixed URL prefix.

use std::{
  future::Future,
  io,
  path::{Path, PathBuf},
};

use bytes::Bytes;
use chrono::Utc;
use tokio::{fs, io::AsyncWriteExt as _};

/// A file part received in a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
  /// Client-supplied file name; only its extension is ever used.
  pub file_name:    Option<String>,
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

/// Somewhere uploaded photos can be kept.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `upload` and return the URL it will be served from.
  fn store(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;
}

// ─── Disk ────────────────────────────────────────────────────────────────────

/// Stores uploads as `<unix-millis><.ext>` files in one directory.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
  dir:        PathBuf,
  url_prefix: String,
}

impl DiskBlobStore {
  /// Create `dir` if needed. Stored files are addressed as
  /// `<url_prefix>/<file name>`.
  pub async fn open(
    dir: impl Into<PathBuf>,
    url_prefix: impl Into<String>,
  ) -> io::Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir).await?;
    let url_prefix = url_prefix.into().trim_end_matches('/').to_owned();
    Ok(Self { dir, url_prefix })
  }

  pub fn dir(&self) -> &Path { &self.dir }
}

/// Lowercased extension of `file_name` with its dot, or nothing when the name
/// has no usable extension.
fn extension(file_name: Option<&str>) -> String {
  file_name
    .and_then(|name| Path::new(name).extension())
    .and_then(|ext| ext.to_str())
    .filter(|ext| {
      !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
    })
    .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
    .unwrap_or_default()
}

impl BlobStore for DiskBlobStore {
  type Error = io::Error;

  async fn store(&self, upload: Upload) -> io::Result<String> {
    let ext = extension(upload.file_name.as_deref());
    let mut stamp = Utc::now().timestamp_millis();

    // Two uploads in the same millisecond bump the later one forward.
    loop {
      let name = format!("{stamp}{ext}");
      let opened = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(self.dir.join(&name))
        .await;

      match opened {
        Ok(mut file) => {
          file.write_all(&upload.bytes).await?;
          file.flush().await?;
          tracing::debug!(file = %name, size = upload.bytes.len(), "stored upload");
          return Ok(format!("{}/{name}", self.url_prefix));
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
        Err(e) => return Err(e),
      }
    }
  }
}
