//! 轮次大小调整决策
//! Round-size adjustment decision
//!
//! 职责：
//! - 比较成功率与耗时比和配置阈值
//! - 计算惩罚/奖励因子
//! - 在 [min, max] 范围内给出新的轮次大小

use crate::config::ControllerConfig;

/// Extra weight applied to how far the success rate fell below the threshold.
const SUCCESS_PENALTY_SCALE: f64 = 1.5;
/// Extra weight applied to how far the round finished under target.
const UNDER_TARGET_REWARD_SCALE: f64 = 1.2;

/// Why a decrease was triggered.
/// 触发减小的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecreaseReason {
    /// The success rate fell below the threshold.
    /// 成功率低于阈值。
    LowSuccessRate,
    /// The projected round duration overshot the target.
    /// 预计轮次耗时超出目标。
    OverTarget,
}

/// The outcome of one adaptation step.
/// 一次自适应调整的结果。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Decrease {
        reason: DecreaseReason,
        from: u32,
        to: u32,
        /// Penalty multiplier applied to the base decrease.
        factor: f64,
        duration_ratio: f64,
    },
    Increase {
        from: u32,
        to: u32,
        /// Reward multiplier applied to the base increase step.
        factor: f64,
        duration_ratio: f64,
    },
    /// Between thresholds: size is left alone.
    Hold { size: u32, duration_ratio: f64 },
}

impl Adjustment {
    /// The round size after this step.
    ///
    /// 本次调整后的轮次大小。
    pub fn new_size(&self) -> u32 {
        match *self {
            Adjustment::Decrease { to, .. } | Adjustment::Increase { to, .. } => to,
            Adjustment::Hold { size, .. } => size,
        }
    }

    pub fn duration_ratio(&self) -> f64 {
        match *self {
            Adjustment::Decrease { duration_ratio, .. }
            | Adjustment::Increase { duration_ratio, .. }
            | Adjustment::Hold { duration_ratio, .. } => duration_ratio,
        }
    }
}

/// Decides the next round size.
///
/// 决定下一轮的大小。
///
/// `per_object_secs` must be a positive smoothed estimate. The success-rate
/// test runs before the duration test so a poor success rate is never masked
/// by an acceptable duration.
pub fn decide(
    config: &ControllerConfig,
    current: u32,
    success_rate: f64,
    per_object_secs: f64,
) -> Adjustment {
    let target_secs = config.target_round_duration.as_secs_f64();
    let duration_ratio = per_object_secs * f64::from(current) / target_secs;
    let threshold = config.success_rate_threshold;

    let penalty = if success_rate < threshold {
        let factor = 1.0 + (1.0 - success_rate / threshold) * SUCCESS_PENALTY_SCALE;
        Some((DecreaseReason::LowSuccessRate, factor.max(1.0)))
    } else if duration_ratio > config.duration_over_target_factor {
        let factor = duration_ratio / config.duration_over_target_factor;
        Some((DecreaseReason::OverTarget, factor.max(1.0)))
    } else {
        None
    };

    if let Some((reason, factor)) = penalty {
        let amount = (f64::from(current) * (1.0 - config.base_decrease_factor) * factor)
            .ceil()
            .max(1.0);
        let to = (f64::from(current) - amount).max(f64::from(config.min_round_size)) as u32;
        return Adjustment::Decrease {
            reason,
            from: current,
            to,
            factor,
            duration_ratio,
        };
    }

    if duration_ratio < config.duration_under_target_factor && success_rate >= threshold {
        let factor =
            (config.duration_under_target_factor / duration_ratio * UNDER_TARGET_REWARD_SCALE)
                .max(1.0);
        let amount = (config.base_increase_step * factor).ceil().max(1.0);
        let to = (f64::from(current) + amount).min(f64::from(config.max_round_size)) as u32;
        return Adjustment::Increase {
            from: current,
            to,
            factor,
            duration_ratio,
        };
    }

    Adjustment::Hold {
        size: current,
        duration_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scenario_config;

    fn config() -> ControllerConfig {
        scenario_config().validate()
    }

    fn assert_f64_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "Floats not equal: {} vs {}", a, b);
    }

    #[test]
    fn test_fast_successful_round_increases() {
        // 0.1 s/object * 20 = 2 s against a 4 s target.
        let adjustment = decide(&config(), 20, 1.0, 0.1);
        match adjustment {
            Adjustment::Increase {
                from,
                to,
                factor,
                duration_ratio,
            } => {
                assert_eq!(from, 20);
                assert_eq!(to, 23);
                assert_f64_eq(factor, 1.44);
                assert_f64_eq(duration_ratio, 0.5);
            }
            other => panic!("expected increase, got {:?}", other),
        }
    }

    #[test]
    fn test_low_success_rate_decreases() {
        let adjustment = decide(&config(), 23, 15.0 / 23.0, 0.135);
        match adjustment {
            Adjustment::Decrease {
                reason, from, to, ..
            } => {
                assert_eq!(reason, DecreaseReason::LowSuccessRate);
                assert_eq!(from, 23);
                assert_eq!(to, 17);
            }
            other => panic!("expected decrease, got {:?}", other),
        }
    }

    #[test]
    fn test_low_success_rate_wins_over_fast_duration() {
        // Duration ratio alone would allow an increase.
        let adjustment = decide(&config(), 20, 0.5, 0.01);
        assert!(matches!(
            adjustment,
            Adjustment::Decrease {
                reason: DecreaseReason::LowSuccessRate,
                ..
            }
        ));
    }

    #[test]
    fn test_overshoot_decreases_with_scaled_penalty() {
        // 0.4 s/object * 20 = 8 s, twice the 4 s target.
        let adjustment = decide(&config(), 20, 1.0, 0.4);
        match adjustment {
            Adjustment::Decrease {
                reason, to, factor, ..
            } => {
                assert_eq!(reason, DecreaseReason::OverTarget);
                assert_f64_eq(factor, 2.0 / 1.3);
                // ceil(20 * 0.15 * 1.54) = 5
                assert_eq!(to, 15);
            }
            other => panic!("expected decrease, got {:?}", other),
        }
    }

    #[test]
    fn test_dead_zone_holds() {
        // Ratio 1.0 sits between the 0.6 and 1.3 thresholds.
        let adjustment = decide(&config(), 20, 1.0, 0.2);
        assert_eq!(
            adjustment,
            Adjustment::Hold {
                size: 20,
                duration_ratio: 1.0
            }
        );
        assert_eq!(adjustment.new_size(), 20);
    }

    #[test]
    fn test_success_rate_at_threshold_may_increase() {
        let at_threshold = decide(&config(), 20, 0.95, 0.1);
        assert!(matches!(at_threshold, Adjustment::Increase { .. }));
    }

    #[test]
    fn test_decrease_is_at_least_one_object() {
        let config = ControllerConfig {
            base_decrease_factor: 0.99,
            ..config()
        };
        // Ratio 1.35 overshoots; 6 * 0.01 * 1.04 rounds up to 1.
        let adjustment = decide(&config, 6, 1.0, 0.9);
        assert_eq!(adjustment.new_size(), 5);
    }

    #[test]
    fn test_decrease_never_goes_below_min() {
        let adjustment = decide(&config(), 6, 0.0, 1.0);
        assert_eq!(adjustment.new_size(), 5);
        let adjustment = decide(&config(), 5, 0.0, 1.0);
        assert_eq!(adjustment.new_size(), 5);
    }

    #[test]
    fn test_increase_never_goes_above_max() {
        let adjustment = decide(&config(), 149, 1.0, 0.0001);
        assert_eq!(adjustment.new_size(), 150);
        let adjustment = decide(&config(), 150, 1.0, 0.0001);
        assert_eq!(adjustment.new_size(), 150);
    }
}
