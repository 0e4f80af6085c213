//! A transport that fakes rounds with speed-dependent timing and random losses.
//! 根据速度模拟耗时并随机丢失对象的传输层。

use super::{RoundRequest, Transport};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::time;

const MIN_ROUND_SECS: f64 = 0.1;
const MAX_FAILURE_CHANCE: f64 = 0.15;
const MAX_SUCCESS_REDUCTION: f64 = 0.6;

/// The simulated cost of one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedRound {
    pub duration: Duration,
    pub succeeded: u32,
}

/// Simulates a link whose per-object time shrinks as the estimated speed grows.
///
/// 模拟一条链路：估计速度越高，单对象耗时越短。
///
/// Each object costs 20-80 ms scaled by `10 / speed` (clamped to 0.3..=10),
/// with ±25% jitter. Slower rounds are more likely to lose objects; a loss
/// removes up to 60% of the round.
pub struct SimulatedTransport {
    rng: Mutex<StdRng>,
}

impl SimulatedTransport {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// A reproducible transport for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draws the timing and losses for one round without sleeping.
    pub fn plan(&self, request: RoundRequest) -> SimulatedRound {
        let count = request.object_count;
        if count == 0 {
            return SimulatedRound {
                duration: Duration::from_secs_f64(MIN_ROUND_SECS),
                succeeded: 0,
            };
        }
        let mut rng = self.rng.lock();

        let speed_factor = if request.speed_mbps > 1.0 {
            10.0 / request.speed_mbps
        } else {
            10.0
        }
        .clamp(0.3, 10.0);
        let secs_per_object = (0.02 + rng.random::<f64>() * 0.06) * speed_factor;
        let jitter = 1.0 + (rng.random::<f64>() * 0.5 - 0.25);
        let secs = (f64::from(count) * secs_per_object * jitter).max(MIN_ROUND_SECS);

        let time_factor = (secs / f64::from(count)).clamp(0.0, 0.5);
        let failure_chance = (0.01 + time_factor * 0.2 + rng.random::<f64>() * 0.05)
            .clamp(0.0, MAX_FAILURE_CHANCE);

        let succeeded = if rng.random::<f64>() < failure_chance {
            let reduction = rng.random::<f64>() * MAX_SUCCESS_REDUCTION;
            ((f64::from(count) * (1.0 - reduction)).floor() as u32).min(count)
        } else {
            count
        };

        SimulatedRound {
            duration: Duration::from_secs_f64(secs),
            succeeded,
        }
    }
}

impl Default for SimulatedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn transmit(&self, request: RoundRequest) -> Result<u32> {
        let round = self.plan(request);
        time::sleep(round.duration).await;
        Ok(round.succeeded)
    }
}
