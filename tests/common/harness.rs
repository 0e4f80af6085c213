//! tests/common/harness.rs
#![allow(dead_code)]

use async_trait::async_trait;
use batch_pacer::driver::{RoundRequest, Transport};
use batch_pacer::{ControllerConfig, ProbeConfig, ProbeResource, ResourceFetcher, Result};
use std::sync::Once;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "batch_pacer=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// A fetcher that "downloads" a fixed number of bytes in a fixed time.
pub struct TimedFetcher {
    pub bytes: u64,
    pub delay: Duration,
    calls: AtomicU64,
}

impl TimedFetcher {
    pub fn new(bytes: u64, delay: Duration) -> Self {
        Self {
            bytes,
            delay,
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceFetcher for TimedFetcher {
    async fn fetch(&self, _url: &str) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.bytes)
    }
}

/// A transport where every object costs the same time and a fixed share fails.
pub struct FixedTransport {
    pub per_object: Duration,
    pub success_ratio: f64,
}

#[async_trait]
impl Transport for FixedTransport {
    async fn transmit(&self, request: RoundRequest) -> Result<u32> {
        tokio::time::sleep(self.per_object * request.object_count).await;
        Ok((f64::from(request.object_count) * self.success_ratio).floor() as u32)
    }
}

/// A transport that always errors.
pub struct BrokenTransport;

#[async_trait]
impl Transport for BrokenTransport {
    async fn transmit(&self, _request: RoundRequest) -> Result<u32> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Err(batch_pacer::Error::Transport("connection reset".to_string()))
    }
}

/// The worked-example configuration with one probe resource.
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        target_round_duration: Duration::from_secs(4),
        min_round_size: 5,
        max_round_size: 150,
        initial_round_size: Some(20),
        base_decrease_factor: 0.85,
        base_increase_step: 2.0,
        success_rate_threshold: 0.95,
        duration_over_target_factor: 1.3,
        duration_under_target_factor: 0.6,
        speed_smoothing_factor: 0.25,
        duration_smoothing_factor: 0.35,
        probe: ProbeConfig {
            resources: vec![ProbeResource::new("http://probe.test/1mb", MIB)],
            timeout: Duration::from_secs(20),
        },
    }
}
