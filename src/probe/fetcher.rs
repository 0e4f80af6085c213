//! 测速资源下载器抽象接口
//! Resource fetcher abstraction used by the speed probe

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Downloads a resource to completion and reports how many bytes arrived.
///
/// 完整下载一个资源并报告收到的字节数。
///
/// Implementations must not impose their own deadline; the probe wraps every
/// call in the configured timeout and drops the future when it fires.
#[async_trait]
pub trait ResourceFetcher: Send + Sync + 'static {
    /// Streams `url` and returns the total number of bytes received.
    ///
    /// 流式下载 `url` 并返回收到的总字节数。
    async fn fetch(&self, url: &str) -> Result<u64>;
}

/// A fetcher backed by a shared `reqwest` client.
///
/// 基于共享 `reqwest` 客户端的下载器。
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<u64> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus(status.as_u16()));
        }

        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len() as u64;
        }
        Ok(received)
    }
}
