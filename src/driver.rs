//! 驱动循环：测速、发送、反馈
//! Driver loop: probe, transmit, report
//!
//! 职责：
//! - 每轮先测速，再读取推荐的轮次大小
//! - 通过 `Transport` 发送并计时
//! - 将结果反馈给控制器，并在轮次之间暂停

use crate::controller::{Adjustment, ObjectCountController};
use crate::error::Result;
use crate::probe::ResourceFetcher;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

pub mod simulated;

pub use simulated::SimulatedTransport;

/// What the driver asks the transport to send.
/// 驱动请求传输层发送的内容。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRequest {
    pub object_count: u32,
    /// Smoothed link speed at the time the round was planned.
    pub speed_mbps: f64,
}

/// Carries one round of objects to the remote side.
///
/// 将一轮对象发送到远端。
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends the round and returns how many objects were delivered.
    ///
    /// 发送本轮并返回成功送达的对象数。
    async fn transmit(&self, request: RoundRequest) -> Result<u32>;
}

/// Pacing parameters for the driver loop.
///
/// 驱动循环的节奏参数。
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Pause after a completed round.
    /// 完成一轮后的暂停时间。
    pub round_interval: Duration,
    /// Pause when the controller is not ready (no usable speed estimate).
    /// 控制器未就绪（没有可用速度估计）时的暂停时间。
    pub not_ready_backoff: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            round_interval: Duration::from_millis(1500),
            not_ready_backoff: Duration::from_secs(1),
        }
    }
}

/// Running totals kept by the driver.
///
/// 驱动维护的累计统计。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub rounds: u64,
    pub objects_attempted: u64,
    pub objects_succeeded: u64,
    pub probe_failures: u64,
    pub transport_failures: u64,
    pub not_ready: u64,
}

/// The result of one driver iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundStep {
    /// No usable speed estimate; nothing was sent.
    NotReady,
    Completed {
        attempted: u32,
        succeeded: u32,
        elapsed: Duration,
        adjustment: Option<Adjustment>,
    },
}

/// Repeatedly probes, transmits and reports into a shared controller.
///
/// 反复测速、发送并向共享控制器反馈。
pub struct Driver<F, T> {
    controller: Arc<ObjectCountController<F>>,
    transport: T,
    config: DriverConfig,
    stats: DriverStats,
}

impl<F: ResourceFetcher, T: Transport> Driver<F, T> {
    pub fn new(controller: Arc<ObjectCountController<F>>, transport: T, config: DriverConfig) -> Self {
        Self {
            controller,
            transport,
            config,
            stats: DriverStats::default(),
        }
    }

    pub fn controller(&self) -> &Arc<ObjectCountController<F>> {
        &self.controller
    }

    pub fn stats(&self) -> &DriverStats {
        &self.stats
    }

    /// Runs one iteration without pausing afterwards. A shutdown signal
    /// cancels an in-flight probe.
    ///
    /// 执行一次迭代（之后不暂停）。关闭信号会取消正在进行的测速。
    pub async fn run_round(&mut self, shutdown: &watch::Receiver<bool>) -> RoundStep {
        if self
            .controller
            .probe_speed(shutdown_signalled(shutdown.clone()))
            .await
            .is_none()
        {
            self.stats.probe_failures += 1;
        }

        let (object_count, speed) = self.controller.snapshot();
        if object_count == 0 {
            debug!(speed = speed.as_mbps(), "Controller not ready, skipping round");
            self.stats.not_ready += 1;
            return RoundStep::NotReady;
        }

        let request = RoundRequest {
            object_count,
            speed_mbps: speed.as_mbps(),
        };
        let started = Instant::now();
        let succeeded = match self.transport.transmit(request).await {
            Ok(delivered) => delivered.min(object_count),
            Err(err) => {
                warn!(error = %err, object_count, "Transport failed, counting round as failed");
                self.stats.transport_failures += 1;
                0
            }
        };
        let elapsed = started.elapsed();
        let adjustment = self
            .controller
            .record_outcome(elapsed, object_count, succeeded);

        self.stats.rounds += 1;
        self.stats.objects_attempted += u64::from(object_count);
        self.stats.objects_succeeded += u64::from(succeeded);
        debug!(
            object_count,
            succeeded,
            elapsed_ms = elapsed.as_millis() as u64,
            next = self.controller.round_size(),
            "Round completed"
        );

        RoundStep::Completed {
            attempted: object_count,
            succeeded,
            elapsed,
            adjustment,
        }
    }

    /// Loops until `shutdown` turns `true` or its sender is dropped, then
    /// returns the accumulated statistics.
    ///
    /// 循环运行直到 `shutdown` 变为 `true` 或其发送端被丢弃，然后返回累计统计。
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) -> DriverStats {
        info!(
            round_interval_ms = self.config.round_interval.as_millis() as u64,
            "Driver started"
        );

        loop {
            let stop = *shutdown.borrow();
            if stop {
                break;
            }

            let pause = match self.run_round(&shutdown).await {
                RoundStep::NotReady => self.config.not_ready_backoff,
                RoundStep::Completed { .. } => self.config.round_interval,
            };

            tokio::select! {
                _ = shutdown_signalled(shutdown.clone()) => break,
                _ = time::sleep(pause) => {}
            }
        }

        info!(
            rounds = self.stats.rounds,
            attempted = self.stats.objects_attempted,
            succeeded = self.stats.objects_succeeded,
            "Driver stopped"
        );
        self.stats
    }
}

/// Resolves once shutdown is requested. A dropped sender counts as a request.
async fn shutdown_signalled(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
