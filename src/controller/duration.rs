//! 单对象耗时跟踪器
//! Duration-per-object tracker

use crate::smoothing::Ema;
use std::time::Duration;
use tracing::trace;

/// Smoothed time per *successful* object, in seconds.
///
/// 每个成功对象的平滑耗时（秒）。
#[derive(Debug, Clone)]
pub(crate) struct DurationTracker {
    ema: Ema,
}

impl DurationTracker {
    pub(crate) fn new(alpha: f64) -> Self {
        Self {
            ema: Ema::new(alpha),
        }
    }

    /// Folds in one round. Rounds with no successes or no elapsed time are
    /// skipped so that failures can never make the link look faster.
    pub(crate) fn observe(&mut self, duration: Duration, succeeded: u32) -> Option<f64> {
        let sample = duration_per_object(duration, succeeded)?;
        let smoothed = self.ema.update(sample);
        trace!(sample, smoothed, "Duration per object updated");
        Some(smoothed)
    }

    /// The smoothed value, if one exists and is positive.
    pub(crate) fn per_object(&self) -> Option<f64> {
        self.ema.value().filter(|secs| *secs > 0.0)
    }
}

/// Seconds per successful object for one round, or `None` if the round
/// carries no usable timing.
pub fn duration_per_object(duration: Duration, succeeded: u32) -> Option<f64> {
    if succeeded == 0 || duration.is_zero() {
        return None;
    }
    Some(duration.as_secs_f64() / f64::from(succeeded))
}
