//! Object storage wrappers.
//!
//! Buckets hold objects addressed by `/` separated keys.
//! [`LocalStore`] keeps buckets as directories on disk,
//! [`GcsStore`] talks to the Google Cloud Storage JSON API,
//! [`S3Store`] to Amazon S3 or an S3 compatible server.

mod gcs;
mod local;
mod s3;

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

pub use gcs::{DEFAULT_GCS_ENDPOINT, GcsStore};
pub use local::LocalStore;
pub use s3::S3Store;

/// Read, write and copy objects in buckets.
pub trait ObjectStore: Send + Sync {
    /// List all object keys in a bucket.
    fn list(&self, bucket: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Read the full content of an object.
    fn read(&self, bucket: &str, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Upload a local file as an object.
    fn upload(&self, bucket: &str, local_path: &Path, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Copy an object to another bucket and key.
    fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Read an object as UTF-8 text.
    fn read_to_string(&self, bucket: &str, key: &str) -> impl Future<Output = Result<String>> + Send {
        async move {
            let bytes = self.read(bucket, key).await?;
            String::from_utf8(bytes).with_context(|| format!("Object is not valid UTF-8: {bucket}/{key}"))
        }
    }
}

/// Storage backend selected from config.
#[derive(Debug)]
pub enum Storage {
    Local(LocalStore),
    Gcs(GcsStore),
    S3(S3Store),
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(store) => write!(f, "local ({})", store.root().display()),
            Self::Gcs(store) => write!(f, "gcs ({})", store.endpoint()),
            Self::S3(store) => write!(f, "s3 ({})", store.region().unwrap_or("default region")),
        }
    }
}

impl ObjectStore for Storage {
    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        match self {
            Self::Local(store) => store.list(bucket).await,
            Self::Gcs(store) => store.list(bucket).await,
            Self::S3(store) => store.list(bucket).await,
        }
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        match self {
            Self::Local(store) => store.read(bucket, key).await,
            Self::Gcs(store) => store.read(bucket, key).await,
            Self::S3(store) => store.read(bucket, key).await,
        }
    }

    async fn upload(&self, bucket: &str, local_path: &Path, key: &str) -> Result<()> {
        match self {
            Self::Local(store) => store.upload(bucket, local_path, key).await,
            Self::Gcs(store) => store.upload(bucket, local_path, key).await,
            Self::S3(store) => store.upload(bucket, local_path, key).await,
        }
    }

    async fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<()> {
        match self {
            Self::Local(store) => {
                store
                    .copy(source_bucket, source_key, destination_bucket, destination_key)
                    .await
            }
            Self::Gcs(store) => {
                store
                    .copy(source_bucket, source_key, destination_bucket, destination_key)
                    .await
            }
            Self::S3(store) => {
                store
                    .copy(source_bucket, source_key, destination_bucket, destination_key)
                    .await
            }
        }
    }
}

/// Content type for an uploaded object based on the key extension.
fn content_type(key: &str) -> &'static str {
    match crate::files::get_file_extension(key).to_lowercase().as_str() {
        "json" => "application/json",
        "csv" => "text/csv",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
