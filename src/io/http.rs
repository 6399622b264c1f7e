use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

use super::{ObjectStore, StoredObject};
use crate::error::StorageError;

/// Object store reached over HTTP: objects live at `{base_url}/{key}`
///
/// A request is attempted once unless [`HttpObjectStore::with_max_retry`]
/// asks for more; transport failures otherwise go straight to the caller.
pub struct HttpObjectStore {
    client: Client,
    base_url: String,
    max_retry: u32,
}

impl HttpObjectStore {
    /// Create a store for the given base URL
    pub fn new(base_url: impl Into<String>) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            max_retry: 1,
        })
    }

    /// Attempt timed-out or refused requests up to `max_retry` times in total
    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry.max(1);
        self
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, StorageError> {
        let url = self.url_for(key);
        let mut retry_count = 0;

        loop {
            match self.client.get(&url).send().await {
                Ok(resp) => {
                    if resp.status() == StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if !resp.status().is_success() {
                        return Err(StorageError::Status(resp.status()));
                    }

                    let content_type = resp
                        .headers()
                        .get(reqwest::header::CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    let data = resp.bytes().await?;

                    return Ok(Some(StoredObject { data, content_type }));
                }
                Err(e) if (e.is_timeout() || e.is_connect()) && retry_count + 1 < self.max_retry => {
                    retry_count += 1;
                    warn!(
                        retry = retry_count,
                        max_retry = self.max_retry,
                        error = %e,
                        "connection error fetching object"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) if retry_count > 0 => {
                    return Err(StorageError::RetriesExhausted {
                        key: key.to_string(),
                        attempts: retry_count + 1,
                        source: e,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
