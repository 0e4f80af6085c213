#![deny(clippy::expect_used, clippy::unwrap_used)]

//! Adaptive round sizing for bulk transmission over a variable link.
//! 面向可变带宽链路的批量传输自适应轮次大小控制。
//!
//! A [`controller::ObjectCountController`] keeps a smoothed throughput estimate
//! fed by timed probe downloads and a smoothed time per delivered object fed by
//! round outcomes, and recommends how many objects the next round should carry.

pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod probe;
pub mod smoothing;

mod testing;

pub use config::{ControllerConfig, ProbeConfig, ProbeResource};
pub use controller::{Adjustment, DecreaseReason, ObjectCountController};
pub use error::{Error, Result};
pub use probe::{HttpFetcher, ResourceFetcher, SpeedEstimate};
