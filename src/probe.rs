//! Throughput probing by timed downloads.
//! 通过计时下载进行吞吐量探测。

use crate::config::ProbeResource;
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::trace;

pub mod fetcher;


pub use fetcher::{HttpFetcher, ResourceFetcher};

const BYTES_TO_MEGABITS: f64 = 8.0 / (1024.0 * 1024.0);

/// Downloads that finish this quickly cannot be timed reliably.
const MIN_MEASURABLE_ELAPSED: Duration = Duration::from_millis(1);

/// The smoothed download speed as seen by callers.
///
/// 调用方看到的平滑下载速度。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedEstimate {
    /// No probe has completed yet.
    /// 尚未完成任何测速。
    Unmeasured,
    /// The most recent probe failed.
    /// 最近一次测速失败。
    Unavailable,
    /// A usable estimate in megabits per second.
    /// 可用的估计值（Mbps）。
    Mbps(f64),
}

impl SpeedEstimate {
    pub(crate) fn from_smoothed(value: Option<f64>) -> Self {
        match value {
            None => SpeedEstimate::Unmeasured,
            Some(mbps) if mbps > 0.0 => SpeedEstimate::Mbps(mbps),
            Some(_) => SpeedEstimate::Unavailable,
        }
    }

    /// Negative when never measured, zero after a failed probe.
    ///
    /// 从未测量时为负数，测速失败后为零。
    pub fn as_mbps(&self) -> f64 {
        match self {
            SpeedEstimate::Unmeasured => -1.0,
            SpeedEstimate::Unavailable => 0.0,
            SpeedEstimate::Mbps(mbps) => *mbps,
        }
    }

    pub fn is_usable(&self) -> bool {
        matches!(self, SpeedEstimate::Mbps(_))
    }
}

/// Times a single download against a hard deadline.
///
/// 在硬性时限内对单次下载计时。
#[derive(Debug)]
pub struct SpeedProbe<F> {
    fetcher: F,
    timeout: Duration,
}

impl<F: ResourceFetcher> SpeedProbe<F> {
    pub fn new(fetcher: F, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Downloads `resource` and returns the raw measured speed in Mbps.
    ///
    /// 下载 `resource` 并返回测得的原始速度（Mbps）。
    ///
    /// Aborts on whichever fires first: `cancel` or the configured timeout.
    /// Bytes from an aborted download are discarded.
    pub async fn measure<C>(&self, resource: &ProbeResource, cancel: C) -> Result<f64>
    where
        C: Future<Output = ()>,
    {
        let started = Instant::now();
        let received = tokio::select! {
            biased;
            _ = cancel => return Err(Error::ProbeCancelled),
            outcome = time::timeout(self.timeout, self.fetcher.fetch(&resource.url)) => {
                outcome.map_err(|_| Error::ProbeTimeout)??
            }
        };
        let elapsed = started.elapsed();

        trace!(
            url = %resource.url,
            bytes = received,
            elapsed_ms = elapsed.as_millis() as u64,
            "Probe download finished"
        );
        speed_mbps(received, elapsed)
    }
}

/// Converts a completed download into megabits per second.
///
/// 将一次完成的下载换算为 Mbps。
pub fn speed_mbps(bytes: u64, elapsed: Duration) -> Result<f64> {
    if elapsed <= MIN_MEASURABLE_ELAPSED {
        return Err(Error::ElapsedTooShort);
    }
    if bytes == 0 {
        return Err(Error::EmptyBody);
    }
    Ok(bytes as f64 * BYTES_TO_MEGABITS / elapsed.as_secs_f64())
}
