//! Google Cloud Storage JSON API client.
//!
//! Documentation:
//! <https://cloud.google.com/storage/docs/json_api/v1/objects>

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;

use super::{ObjectStore, content_type};

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

/// Google Cloud Storage client using an OAuth access token.
#[derive(Debug, Clone)]
pub struct GcsStore {
    client: Client,
    endpoint: Url,
    token: Option<String>,
}

/// Response from the objects list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectItem>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

impl GcsStore {
    /// Create a new client for the given API endpoint.
    /// Requests are sent without authentication if no token is given,
    /// which works with local emulators and public buckets.
    ///
    /// # Errors
    /// Returns an error if the endpoint is not a valid base URL.
    pub fn new(endpoint: &str, token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).with_context(|| format!("Invalid storage endpoint: '{endpoint}'"))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("Invalid storage endpoint: '{endpoint}'");
        }
        Ok(Self {
            client: Client::new(),
            endpoint,
            token: token.filter(|token| !token.trim().is_empty()),
        })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build an API URL from path segments. Segments are percent-encoded,
    /// so object keys containing `/` stay a single segment.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("Invalid storage endpoint: '{}'", self.endpoint))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn objects_url(&self, bucket: &str) -> Result<Url> {
        self.url(&["storage", "v1", "b", bucket, "o"])
    }

    fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        self.url(&["storage", "v1", "b", bucket, "o", key])
    }

    fn upload_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let mut url = self.url(&["upload", "storage", "v1", "b", bucket, "o"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);
        Ok(url)
    }

    fn copy_url(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<Url> {
        self.url(&[
            "storage",
            "v1",
            "b",
            source_bucket,
            "o",
            source_key,
            "copyTo",
            "b",
            destination_bucket,
            "o",
            destination_key,
        ])
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and turn error statuses into errors with the response body.
    async fn send(request: RequestBuilder, action: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send {action} request"))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{action} failed: HTTP {status} - {}", body.trim())
        }
    }
}

impl ObjectStore for GcsStore {
    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.objects_url(bucket)?;
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let response = Self::send(self.request(Method::GET, url), "List objects").await?;
            let body = response.text().await.context("Failed to read object list")?;
            let page: ObjectList = serde_json::from_str(&body).context("Failed to parse object list JSON")?;

            keys.extend(page.items.into_iter().map(|item| item.name));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let mut url = self.object_url(bucket, key)?;
        url.query_pairs_mut().append_pair("alt", "media");

        let response = Self::send(self.request(Method::GET, url), "Download object").await?;
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read object: {bucket}/{key}"))?;
        Ok(bytes.to_vec())
    }

    async fn upload(&self, bucket: &str, local_path: &Path, key: &str) -> Result<()> {
        let content = tokio::fs::read(local_path)
            .await
            .with_context(|| format!("Failed to read file: {}", local_path.display()))?;

        let url = self.upload_url(bucket, key)?;
        let request = self
            .request(Method::POST, url)
            .header(CONTENT_TYPE, content_type(key))
            .body(content);

        Self::send(request, "Upload object").await?;
        Ok(())
    }

    async fn copy(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<()> {
        let url = self.copy_url(source_bucket, source_key, destination_bucket, destination_key)?;
        Self::send(self.request(Method::POST, url), "Copy object").await?;
        Ok(())
    }
}
