//! Buckets stored as directories on the local filesystem.
//!
//! Object keys map to relative paths under `<root>/<bucket>/`.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use super::ObjectStore;

/// Buckets as directories under a root directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the filesystem path for an object.
    /// Keys that would escape the bucket directory are rejected.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let key_path = Path::new(key);
        let is_contained = key_path
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if bucket.is_empty() || key.is_empty() || !is_contained {
            anyhow::bail!("Invalid object key: '{bucket}/{key}'");
        }
        Ok(self.bucket_path(bucket)?.join(key_path))
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            anyhow::bail!("Invalid bucket name: '{bucket}'");
        }
        Ok(self.root.join(bucket))
    }
}

impl ObjectStore for LocalStore {
    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let bucket_path = self.bucket_path(bucket)?;
        if !bucket_path.is_dir() {
            anyhow::bail!("Bucket does not exist: {}", bucket_path.display());
        }

        let mut keys: Vec<String> = WalkDir::new(&bucket_path)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry.path().strip_prefix(&bucket_path).ok().map(|relative| {
                    relative
                        .components()
                        .map(|component| crate::os_str_to_string(component.as_os_str()))
                        .collect::<Vec<_>>()
                        .join("/")
                })
            })
            .collect();

        keys.sort();
        Ok(keys)
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read object: {}", path.display()))
    }

    async fn upload(&self, bucket: &str, local_path: &Path, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &path)
            .await
            .with_context(|| format!("Failed to upload {} to {}", local_path.display(), path.display()))?;
        Ok(())
    }

    async fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<()> {
        let source = self.object_path(source_bucket, source_key)?;
        self.upload(destination_bucket, &source, destination_key).await
    }
}
