//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the batch pacing library.
/// 批量节奏控制库的主要错误类型。
///
/// None of these are fatal. Probe failures are collapsed into the failure
/// sentinel by [`crate::controller::ObjectCountController::probe_speed`].
#[derive(Debug, Error)]
pub enum Error {
    /// No probe resources are configured.
    /// 未配置任何测速资源。
    #[error("no probe resources configured")]
    NoProbeResources,

    /// The selected probe resource has an empty URL or a non-positive expected size.
    /// 选中的测速资源URL为空或预期大小不为正。
    #[error("probe resource #{index} is invalid")]
    InvalidProbeResource { index: usize },

    /// An underlying HTTP error occurred.
    /// 发生了底层的HTTP错误。
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    /// 服务器返回了非成功状态码。
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The probe download did not finish within the configured timeout.
    /// 测速下载未在配置的超时时间内完成。
    #[error("probe timed out")]
    ProbeTimeout,

    /// The caller cancelled the probe.
    /// 调用方取消了测速。
    #[error("probe cancelled")]
    ProbeCancelled,

    /// The download finished too quickly to yield a meaningful speed.
    /// 下载完成过快，无法得到有意义的速度。
    #[error("elapsed time too short to measure")]
    ElapsedTooShort,

    /// The probe resource returned no bytes.
    /// 测速资源没有返回任何字节。
    #[error("probe body was empty")]
    EmptyBody,

    /// The transport failed to deliver a round.
    /// 传输层未能完成一轮发送。
    #[error("transport failed: {0}")]
    Transport(String),
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
