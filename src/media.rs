//! Filesystem storage for the animated-capture bytes.
//!
//! The capture slot row in the database holds only a reference; the bytes
//! themselves live as flat files under the configured media directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write `bytes` under a fresh reference and return it.
    async fn store(&self, extension: &str, bytes: &[u8]) -> Result<String>;

    /// Read the bytes behind `media_ref`, or `None` if the file is gone.
    async fn load(&self, media_ref: &str) -> Result<Option<Vec<u8>>>;

    /// Delete the file behind `media_ref`. Deleting an absent file is not an
    /// error.
    async fn remove(&self, media_ref: &str) -> Result<()>;
}

pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// References are bare file names; anything that could traverse out of
    /// the media directory is rejected.
    fn resolve(&self, media_ref: &str) -> Result<PathBuf> {
        let name = Path::new(media_ref);
        if media_ref.is_empty()
            || name.components().count() != 1
            || media_ref.contains("..")
        {
            anyhow::bail!("invalid media reference: {media_ref:?}");
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn store(&self, extension: &str, bytes: &[u8]) -> Result<String> {
        let media_ref = format!("{}.{extension}", Uuid::new_v4());
        let path = self.root.join(&media_ref);

        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating media directory {:?}", self.root))?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing media file {path:?}"))?;

        tracing::debug!(media_ref = %media_ref, bytes = bytes.len(), "media file stored");
        Ok(media_ref)
    }

    async fn load(&self, media_ref: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(media_ref)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading media file {path:?}")),
        }
    }

    async fn remove(&self, media_ref: &str) -> Result<()> {
        let path = self.resolve(media_ref)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing media file {path:?}")),
        }
    }
}
