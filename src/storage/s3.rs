//! Amazon S3 client.
//!
//! Credentials and the default region come from the standard AWS environment,
//! for example `AWS_PROFILE` or `AWS_ACCESS_KEY_ID` and `AWS_REGION`.

use std::path::Path;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use super::{ObjectStore, content_type};

/// S3 or S3 compatible object storage.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    endpoint: Option<String>,
}

impl S3Store {
    /// Create a client from the AWS environment.
    /// The region and endpoint override the environment when given.
    pub async fn from_env(region: Option<&str>, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.map(str::trim).filter(|region| !region.is_empty()) {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;
        Self::from_sdk_config(&sdk_config, endpoint)
    }

    /// Create a client from an already loaded AWS config.
    #[must_use]
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .map(ToString::to_string);

        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config);
        if let Some(endpoint) = &endpoint {
            // S3 compatible servers expect the bucket in the path
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            endpoint,
        }
    }

    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.client.config().region().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
}

impl ObjectStore for S3Store {
    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .with_context(|| format!("Failed to list objects in bucket: {bucket}"))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(ToString::to_string),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download object: {bucket}/{key}"))?;

        let content = response
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read object: {bucket}/{key}"))?;
        Ok(content.into_bytes().to_vec())
    }

    async fn upload(&self, bucket: &str, local_path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .with_context(|| format!("Failed to read file: {}", local_path.display()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type(key))
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to upload {} to {bucket}/{key}", local_path.display()))?;
        Ok(())
    }

    async fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(copy_source(source_bucket, source_key))
            .bucket(destination_bucket)
            .key(destination_key)
            .send()
            .await
            .with_context(|| {
                format!("Failed to copy {source_bucket}/{source_key} to {destination_bucket}/{destination_key}")
            })?;
        Ok(())
    }
}

/// Copy source header value: bucket and URL-encoded key, with `/` kept between key parts.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded_key}")
}
