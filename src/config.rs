//! 定义了批量控制器和测速的可配置参数。
//! Defines configurable parameters for the round-size controller and the speed probe.

use std::time::Duration;

const MIN_TARGET_ROUND_DURATION: Duration = Duration::from_millis(1);

/// A structure containing all configurable parameters for the controller.
///
/// 包含控制器所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a single round should take.
    /// 单轮发送的目标耗时。
    pub target_round_duration: Duration,
    /// The smallest round size the controller will ever recommend.
    /// 控制器推荐的最小轮次大小。
    pub min_round_size: u32,
    /// The largest round size the controller will ever recommend.
    /// 控制器推荐的最大轮次大小。
    pub max_round_size: u32,
    /// The round size to start from. Defaults to the midpoint of the bounds.
    /// 初始轮次大小。默认为上下界的中点。
    pub initial_round_size: Option<u32>,
    /// The fraction of the current size retained on a decrease.
    /// 减小时保留的当前大小的比例。
    pub base_decrease_factor: f64,
    /// Objects added on an increase, before reward scaling.
    /// 增大时添加的对象数（缩放前）。
    pub base_increase_step: f64,
    /// Success rates below this force a decrease.
    /// 成功率低于此值时强制减小。
    pub success_rate_threshold: f64,
    /// Duration ratios above this force a decrease.
    /// 耗时比高于此值时强制减小。
    pub duration_over_target_factor: f64,
    /// Duration ratios below this permit an increase.
    /// 耗时比低于此值时允许增大。
    pub duration_under_target_factor: f64,
    /// EMA weight of the newest speed sample.
    /// 最新速度样本的EMA权重。
    pub speed_smoothing_factor: f64,
    /// EMA weight of the newest duration-per-object sample.
    /// 最新单对象耗时样本的EMA权重。
    pub duration_smoothing_factor: f64,
    /// Speed probe parameters.
    /// 测速参数。
    pub probe: ProbeConfig,
}

/// Speed probe parameters.
///
/// 测速参数。
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Resources downloaded in round-robin order.
    /// 按轮询顺序下载的资源。
    pub resources: Vec<ProbeResource>,
    /// Hard limit for a single probe download.
    /// 单次测速下载的硬性时限。
    pub timeout: Duration,
}

/// A downloadable resource used to measure throughput.
///
/// 用于测量吞吐量的可下载资源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResource {
    pub url: String,
    /// Expected size in bytes. Only used to reject misconfigured entries;
    /// the speed is computed from the bytes actually received.
    pub size_bytes: u64,
}

impl ProbeResource {
    pub fn new(url: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            url: url.into(),
            size_bytes,
        }
    }

    pub(crate) fn is_usable(&self) -> bool {
        !self.url.is_empty() && self.size_bytes > 0
    }
}

impl ControllerConfig {
    /// Returns a copy with every parameter forced into its valid range and the
    /// initial round size resolved.
    ///
    /// 返回一个所有参数都被限制在有效范围内、并已确定初始轮次大小的副本。
    /// Out-of-range values are corrected, never rejected.
    pub fn validate(mut self) -> Self {
        self.target_round_duration = self.target_round_duration.max(MIN_TARGET_ROUND_DURATION);
        self.min_round_size = self.min_round_size.max(1);
        self.max_round_size = self
            .max_round_size
            .max(self.min_round_size.saturating_add(1));
        self.base_decrease_factor = clamp_fraction(self.base_decrease_factor, 0.1, 0.99);
        self.base_increase_step = self.base_increase_step.max(1.0);
        self.success_rate_threshold = clamp_fraction(self.success_rate_threshold, 0.5, 1.0);
        self.duration_over_target_factor = self.duration_over_target_factor.max(1.0);
        self.duration_under_target_factor =
            clamp_fraction(self.duration_under_target_factor, 0.1, 1.0);
        self.speed_smoothing_factor = clamp_fraction(self.speed_smoothing_factor, 0.01, 1.0);
        self.duration_smoothing_factor = clamp_fraction(self.duration_smoothing_factor, 0.01, 1.0);

        let initial = self
            .initial_round_size
            .unwrap_or(self.max_round_size / 2)
            .clamp(self.min_round_size, self.max_round_size);
        self.initial_round_size = Some(initial);
        self
    }

    /// The resolved initial round size.
    ///
    /// 已确定的初始轮次大小。
    pub fn resolved_initial_round_size(&self) -> u32 {
        self.initial_round_size
            .unwrap_or(self.max_round_size / 2)
            .clamp(self.min_round_size, self.max_round_size.max(self.min_round_size))
    }
}

// NaN falls back to the lower bound; `f64::clamp` would propagate it.
fn clamp_fraction(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_round_duration: Duration::from_secs(5),
            min_round_size: 1,
            max_round_size: 100,
            initial_round_size: None,
            base_decrease_factor: 0.90,
            base_increase_step: 1.0,
            success_rate_threshold: 0.98,
            duration_over_target_factor: 1.2,
            duration_under_target_factor: 0.7,
            speed_smoothing_factor: 0.2,
            duration_smoothing_factor: 0.3,
            probe: ProbeConfig::default(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            resources: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }
}
