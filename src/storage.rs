use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::db::new_id;

pub const MEDIA_DIR: &str = "media";
pub const GENERATED_AUDIO_DIR: &str = "audio/generated";
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// A file written under the uploads root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub path: PathBuf,
    pub url: String,
}

/// The uploads directory tree, served publicly at `/uploads`.
///
/// Every write gets a fresh random name and is opened with `create_new`, so
/// two writers never share a path.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Storage { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    pub fn generated_audio_dir(&self) -> PathBuf {
        self.root.join(GENERATED_AUDIO_DIR)
    }

    /// Store an uploaded file, keeping the (sanitized) extension of its
    /// original name.
    pub async fn save_media(&self, bytes: &[u8], original_name: &str) -> io::Result<StoredFile> {
        let extension = sanitize_extension(original_name);
        self.write_new(MEDIA_DIR, extension.as_deref(), bytes).await
    }

    pub async fn save_generated_audio(&self, bytes: &[u8], extension: &str) -> io::Result<StoredFile> {
        self.write_new(GENERATED_AUDIO_DIR, Some(extension), bytes).await
    }

    pub async fn remove_media(&self, filename: &str) -> io::Result<()> {
        self.remove(MEDIA_DIR, filename).await
    }

    pub async fn remove_generated_audio(&self, filename: &str) -> io::Result<()> {
        self.remove(GENERATED_AUDIO_DIR, filename).await
    }

    /// Map a public `/uploads/...` URL back to a file path inside the root.
    /// Returns None for other URLs and for paths escaping the root.
    pub fn resolve_url(&self, url: &str) -> Option<PathBuf> {
        let rest = url.strip_prefix(UPLOADS_URL_PREFIX)?.strip_prefix('/')?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let relative = Path::new(rest);
        let safe = !rest.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        safe.then(|| self.root.join(relative))
    }

    async fn write_new(&self, subdir: &str, extension: Option<&str>, bytes: &[u8]) -> io::Result<StoredFile> {
        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir).await?;

        let id = new_id();
        let filename = match extension {
            Some(ext) if !ext.is_empty() => format!("{id}.{ext}"),
            _ => id.clone(),
        };
        let path = dir.join(&filename);

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());

        Ok(StoredFile {
            url: format!("{UPLOADS_URL_PREFIX}/{subdir}/{filename}"),
            id,
            filename,
            path,
        })
    }

    async fn remove(&self, subdir: &str, filename: &str) -> io::Result<()> {
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to remove {filename:?}"),
            ));
        }
        let path = self.root.join(subdir).join(filename);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("File {} already gone", path.display());
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Lowercased alphanumeric extension of `name`, at most 10 characters.
pub fn sanitize_extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Last path component of a client-supplied file name.
pub fn display_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).trim().to_string()
}
