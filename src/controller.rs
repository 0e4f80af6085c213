//! The object-count controller: decides how many objects to send per round.
//! 对象数量控制器：决定每轮发送多少个对象。
//!
//! Two inputs drive it. Speed probes keep a smoothed throughput estimate that
//! gates transmission, and round outcomes keep a smoothed time per successful
//! object that drives the round size up or down between configured bounds.

use crate::config::{ControllerConfig, ProbeResource};
use crate::error::{Error, Result};
use crate::probe::{HttpFetcher, ResourceFetcher, SpeedEstimate, SpeedProbe};
use crate::smoothing::Ema;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace, warn};

pub mod adjustment;
pub(crate) mod duration;


pub use adjustment::{Adjustment, DecreaseReason};
pub use duration::duration_per_object;

use duration::DurationTracker;

/// Everything that changes at runtime. Guarded by a single lock so that
/// speed and round size are always read as a consistent pair.
#[derive(Debug)]
struct ControllerState {
    round_size: u32,
    speed: Ema,
    duration: DurationTracker,
    probe_index: usize,
}

/// Adaptive round-size controller.
///
/// 自适应轮次大小控制器。
///
/// Safe to share across tasks behind an `Arc`: one task may probe on a timer
/// while another reports round outcomes.
#[derive(Debug)]
pub struct ObjectCountController<F = HttpFetcher> {
    config: ControllerConfig,
    probe: SpeedProbe<F>,
    state: Mutex<ControllerState>,
}

impl ObjectCountController<HttpFetcher> {
    /// Creates a controller that probes over HTTP.
    ///
    /// 创建一个通过HTTP测速的控制器。
    pub fn with_http(config: ControllerConfig) -> Self {
        Self::new(config, HttpFetcher::new())
    }
}

impl<F: ResourceFetcher> ObjectCountController<F> {
    /// Creates a controller. The configuration is validated (clamped) first.
    ///
    /// 创建控制器。配置会先经过校验（限制范围）。
    pub fn new(config: ControllerConfig, fetcher: F) -> Self {
        let config = config.validate();
        let state = ControllerState {
            round_size: config.resolved_initial_round_size(),
            speed: Ema::new(config.speed_smoothing_factor),
            duration: DurationTracker::new(config.duration_smoothing_factor),
            probe_index: 0,
        };
        let probe = SpeedProbe::new(fetcher, config.probe.timeout);
        debug!(
            initial = state.round_size,
            min = config.min_round_size,
            max = config.max_round_size,
            "Object-count controller created"
        );
        Self {
            config,
            probe,
            state: Mutex::new(state),
        }
    }

    /// The validated configuration in use.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        self.probe.fetcher()
    }

    /// The number of objects to send in the next round, or 0 when there is no
    /// usable speed estimate and the caller should wait.
    ///
    /// 下一轮应发送的对象数；没有可用速度估计时返回0，调用方应等待。
    pub fn current_round_size(&self) -> u32 {
        self.snapshot().0
    }

    /// The gated round size and the speed estimate, read under one lock.
    ///
    /// 在同一把锁下读取的（受门控的）轮次大小与速度估计。
    pub fn snapshot(&self) -> (u32, SpeedEstimate) {
        let state = self.state.lock();
        let speed = SpeedEstimate::from_smoothed(state.speed.value());
        let size = if speed.is_usable() { state.round_size } else { 0 };
        (size, speed)
    }

    /// The internal round size, regardless of the speed gate.
    pub fn round_size(&self) -> u32 {
        self.state.lock().round_size
    }

    /// Smoothed speed in Mbps: negative if never measured, 0 after a failed probe.
    ///
    /// 平滑速度（Mbps）：从未测量时为负，测速失败后为0。
    pub fn current_speed_mbps(&self) -> f64 {
        self.speed_estimate().as_mbps()
    }

    pub fn speed_estimate(&self) -> SpeedEstimate {
        SpeedEstimate::from_smoothed(self.state.lock().speed.value())
    }

    /// Smoothed seconds per successful object, once a valid round has been recorded.
    pub fn smoothed_duration_per_object(&self) -> Option<f64> {
        self.state.lock().duration.per_object()
    }

    /// Performs one speed probe and folds the result into the smoothed speed.
    ///
    /// 执行一次测速并将结果并入平滑速度。
    ///
    /// Returns the raw measured speed, or `None` on any failure (no resources,
    /// bad resource, HTTP error, timeout, or `cancel` firing first). A failure
    /// forces the smoothed speed to exactly 0. Never touches the round size.
    pub async fn probe_speed<C>(&self, cancel: C) -> Option<f64>
    where
        C: Future<Output = ()>,
    {
        let outcome = match self.next_probe_resource() {
            Ok(resource) => self.probe.measure(&resource, cancel).await,
            Err(err) => Err(err),
        };

        let mut state = self.state.lock();
        match outcome {
            Ok(sample) => {
                let smoothed = state.speed.update(sample);
                debug!(sample, smoothed, "Speed probe succeeded");
                Some(sample)
            }
            Err(err) => {
                state.speed.force(0.0);
                warn!(error = %err, "Speed probe failed, estimate reset to 0");
                None
            }
        }
    }

    /// Reports one completed round and adapts the round size.
    ///
    /// 报告一轮已完成的发送并调整轮次大小。
    ///
    /// Returns `None` if the outcome was ignored (`attempted == 0`) or if no
    /// valid duration estimate exists yet. `succeeded` is capped at `attempted`.
    pub fn record_outcome(
        &self,
        duration: Duration,
        attempted: u32,
        succeeded: u32,
    ) -> Option<Adjustment> {
        if attempted == 0 {
            trace!("Ignoring round with nothing attempted");
            return None;
        }
        let succeeded = succeeded.min(attempted);
        let success_rate = f64::from(succeeded) / f64::from(attempted);

        let mut state = self.state.lock();
        state.duration.observe(duration, succeeded);

        let Some(per_object) = state.duration.per_object() else {
            trace!(
                attempted,
                succeeded,
                "No valid duration estimate yet, round size unchanged"
            );
            return None;
        };

        let adjustment =
            adjustment::decide(&self.config, state.round_size, success_rate, per_object);
        match adjustment {
            Adjustment::Decrease {
                reason,
                from,
                to,
                factor,
                duration_ratio,
            } => debug!(
                ?reason,
                from,
                to,
                factor,
                duration_ratio,
                success_rate,
                "Decreasing round size"
            ),
            Adjustment::Increase {
                from,
                to,
                factor,
                duration_ratio,
            } => debug!(from, to, factor, duration_ratio, "Increasing round size"),
            Adjustment::Hold {
                size,
                duration_ratio,
            } => trace!(size, duration_ratio, success_rate, "Round size stable"),
        }
        state.round_size = adjustment.new_size();
        Some(adjustment)
    }

    /// Advances the rotation and returns the resource to probe.
    fn next_probe_resource(&self) -> Result<ProbeResource> {
        let resources = &self.config.probe.resources;
        if resources.is_empty() {
            return Err(Error::NoProbeResources);
        }

        let index = {
            let mut state = self.state.lock();
            state.probe_index = (state.probe_index + 1) % resources.len();
            state.probe_index
        };
        match resources.get(index) {
            Some(resource) if resource.is_usable() => Ok(resource.clone()),
            _ => Err(Error::InvalidProbeResource { index }),
        }
    }
}
