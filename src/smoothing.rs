//! An exponential moving average shared by the speed and duration estimators.
//! 速度与耗时估算器共用的指数移动平均。

/// An exponential moving average.
///
/// 一个指数移动平均值。
///
/// Starts without a value. The first sample is taken as-is; later samples are
/// blended as `alpha * sample + (1 - alpha) * value`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// Creates an empty average with the given weight for new samples.
    ///
    /// 使用给定的新样本权重创建一个空的平均值。
    pub fn new(alpha: f64) -> Self {
        Self { alpha, value: None }
    }

    /// Folds a sample into the average and returns the new value.
    ///
    /// 将一个样本并入平均值并返回新值。
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            None => sample,
            Some(current) => self.alpha * sample + (1.0 - self.alpha) * current,
        };
        self.value = Some(next);
        next
    }

    /// Overwrites the value without blending. The next sample blends against it.
    pub fn force(&mut self, value: f64) {
        self.value = Some(value);
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}
