// THEORY:
// The only way bytes enter the engine. `AssetFetcher` is the seam to the network: the
// pipelines hold an `Arc<dyn AssetFetcher>` passed in by the caller and never open a
// connection themselves. `HttpFetcher` is the production implementation; the
// `MemoryFetcher` serves pre-fetched bytes (tests, replays, caller-side caches).
//
// Every fetch is bounded by `fetch_with_timeout`. There are no retries: a candidate
// that fails to arrive in time is disqualified and the other candidates carry on.

use crate::config::FetchConfig;
use crate::error::{AssetError, AssetResult};
use async_trait::async_trait;
use base64::Engine;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> AssetResult<Vec<u8>>;
}

/// Runs one fetch under its own deadline.
pub async fn fetch_with_timeout(
    fetcher: &dyn AssetFetcher,
    url: &str,
    timeout: Duration,
) -> AssetResult<Vec<u8>> {
    match tokio::time::timeout(timeout, fetcher.fetch_bytes(url)).await {
        Ok(result) => result,
        Err(_) => Err(AssetError::Timeout(timeout)),
    }
}

/// Decodes an RFC 2397 `data:` URL.
pub fn decode_data_url(url: &str) -> AssetResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::fetch("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::fetch("data URL without payload"))?;
    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetError::fetch(format!("invalid base64 payload: {e}")))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Fetches over HTTP(S) with a client-level timeout and a response size cap.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> AssetResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> AssetResult<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(AssetError::TooLarge { limit: self.max_bytes });
            }
        }

        // Content-Length may be missing or wrong, so the cap is enforced while streaming.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            append_capped(&mut body, &chunk, self.max_bytes)?;
        }
        debug!(url, bytes = body.len(), "fetched asset");
        Ok(body)
    }
}

/// Appends `chunk` unless the body would grow past `limit` bytes.
pub fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> AssetResult<()> {
    if body.len().saturating_add(chunk.len()) > limit {
        return Err(AssetError::TooLarge { limit });
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Serves bytes from memory; unknown URLs answer like a 404.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(url.into(), bytes);
    }
}

#[async_trait]
impl AssetFetcher for MemoryFetcher {
    async fn fetch_bytes(&self, url: &str) -> AssetResult<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }
        self.assets.get(url).cloned().ok_or_else(|| AssetError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StalledFetcher;

    #[async_trait]
    impl AssetFetcher for StalledFetcher {
        async fn fetch_bytes(&self, _url: &str) -> AssetResult<Vec<u8>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn data_urls_decode_base64_and_plain_payloads() {
        assert_eq!(decode_data_url("data:image/png;base64,AAEC").unwrap(), vec![0, 1, 2]);
        assert_eq!(decode_data_url("data:text/plain,hi").unwrap(), b"hi".to_vec());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("https://x.test").is_err());
    }

    #[test]
    fn streamed_bodies_stop_at_the_size_cap() {
        let mut body = Vec::new();
        append_capped(&mut body, &[1; 6], 10).unwrap();
        append_capped(&mut body, &[2; 4], 10).unwrap();
        assert_eq!(body.len(), 10);

        let err = append_capped(&mut body, &[3], 10).unwrap_err();
        assert!(matches!(err, AssetError::TooLarge { limit: 10 }));
        assert_eq!(body.len(), 10, "rejected chunk must not be buffered");

        let mut oversized = Vec::new();
        assert!(append_capped(&mut oversized, &[0; 11], 10).is_err());
        assert!(oversized.is_empty());
    }

    #[tokio::test]
    async fn memory_fetcher_misses_are_404s() {
        let fetcher = MemoryFetcher::new().with("https://x.test/a.png", vec![1, 2, 3]);
        assert_eq!(fetcher.fetch_bytes("https://x.test/a.png").await.unwrap(), vec![1, 2, 3]);
        let err = fetcher.fetch_bytes("https://x.test/b.png").await.unwrap_err();
        assert!(matches!(err, AssetError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn stalled_fetches_time_out() {
        let err = fetch_with_timeout(&StalledFetcher, "https://slow.test", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
