//! 测试辅助工具模块
//! Test utilities module

#![cfg(test)]

use crate::config::{ControllerConfig, ProbeConfig, ProbeResource};
use crate::error::{Error, Result};
use crate::probe::ResourceFetcher;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

/// What a [`ScriptedFetcher`] does on one call.
#[derive(Debug, Clone)]
pub enum FetchStep {
    /// Sleep for `after`, then report `bytes` received.
    Deliver { bytes: u64, after: Duration },
    /// Sleep for `after`, then fail with the given HTTP status.
    Fail { status: u16, after: Duration },
}

impl FetchStep {
    pub fn deliver(bytes: u64, after: Duration) -> Self {
        FetchStep::Deliver { bytes, after }
    }

    pub fn fail(status: u16) -> Self {
        FetchStep::Fail {
            status,
            after: Duration::from_millis(10),
        }
    }
}

/// A fetcher that replays a script of steps and records every URL it was asked for.
///
/// Sleeps use the tokio clock, so tests run with `start_paused = true` get
/// exact elapsed times.
pub struct ScriptedFetcher {
    steps: Mutex<VecDeque<FetchStep>>,
    fallback: FetchStep,
    urls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    /// Every call behaves like `step`.
    pub fn always(step: FetchStep) -> Self {
        Self::scripted(Vec::new(), step)
    }

    /// Replays `steps` in order, then behaves like `fallback`.
    pub fn scripted(steps: Vec<FetchStep>, fallback: FetchStep) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<u64> {
        self.urls.lock().push(url.to_string());
        let step = self
            .steps
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            FetchStep::Deliver { bytes, after } => {
                tokio::time::sleep(after).await;
                Ok(bytes)
            }
            FetchStep::Fail { status, after } => {
                tokio::time::sleep(after).await;
                Err(Error::HttpStatus(status))
            }
        }
    }
}

/// Two probe resources, `a` and `b`.
pub fn two_resources() -> Vec<ProbeResource> {
    vec![
        ProbeResource::new("http://probe.test/a", MIB),
        ProbeResource::new("http://probe.test/b", 2 * MIB),
    ]
}

/// The configuration used throughout the worked adaptation scenarios.
pub fn scenario_config() -> ControllerConfig {
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
            resources: two_resources(),
            timeout: Duration::from_secs(20),
        },
    }
}
