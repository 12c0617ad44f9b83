//! 对数空间中的 Li 阈值.
//!
//! 强度先被截断于噪声下限, 取对数, 再线性拉伸到 \[0, 1\].
//! Li 阈值以及系数与上下界都作用于该空间, 最后映射回原始强度.

use super::global::threshold_li;
use super::histogram::min_max;

/// 对数变换的参数, 用于把对数空间中的阈值映射回原始强度.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LogTransform {
    /// 截断并取对数后的最小值.
    pub(crate) log_min: f64,

    /// 截断并取对数后的最大值.
    pub(crate) log_max: f64,
}

impl LogTransform {
    /// 对 `values` 做截断, 取对数与拉伸, 返回变换后的数据和变换参数.
    ///
    /// `values` 必须非空且非负.
    pub(crate) fn apply(values: &[f64]) -> (Vec<f64>, Self) {
        let (lo, hi) = min_max(values);
        let noise_min = lo + (hi - lo) / 256.0 + f32::EPSILON as f64;
        let logged: Vec<f64> = values.iter().map(|v| v.max(noise_min).ln()).collect();
        let (log_min, log_max) = min_max(&logged);
        let t = Self { log_min, log_max };
        let stretched = if log_max > log_min {
            logged
                .into_iter()
                .map(|v| (v - log_min) / (log_max - log_min))
                .collect()
        } else {
            logged
        };
        (stretched, t)
    }

    /// 将拉伸后对数空间中的值 `t` 映射回原始强度.
    #[inline]
    pub(crate) fn inverse(&self, t: f64) -> f64 {
        if self.log_max > self.log_min {
            (t * (self.log_max - self.log_min) + self.log_min).exp()
        } else {
            self.log_min.exp()
        }
    }
}

/// 对数空间中的原始 Li 阈值, 以及对应的变换参数.
pub(crate) fn log_li_threshold(values: &[f64]) -> (f64, LogTransform) {
    let (stretched, t) = LogTransform::apply(values);
    (threshold_li(&stretched), t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_log_transform_inverse() {
        let v = [0.0, 0.1, 0.5, 1.0];
        let (s, t) = LogTransform::apply(&v);
        // 被截断的最小值映射到 0, 最大值映射到 1.
        assert_abs_diff_eq!(s[0], 0.0);
        assert_abs_diff_eq!(s[3], 1.0);
        for (x, y) in v.iter().zip(s.iter()).skip(1) {
            assert_abs_diff_eq!(t.inverse(*y), *x, epsilon = 1e-9);
        }
        // 截断下限为 1/256 + ε.
        assert_abs_diff_eq!(t.inverse(0.0), 1.0 / 256.0, epsilon = 1e-6);
    }

    #[test]
    fn test_log_li_between_modes() {
        let mut v = vec![0.05; 50];
        v.extend(vec![0.9; 20]);
        v.extend([0.0, 1.0]);
        let (raw, t) = log_li_threshold(&v);
        assert!(raw > 0.0 && raw < 1.0);
        let back = t.inverse(raw);
        assert!(back > 0.05 && back < 0.9, "log li = {back}");
    }

    #[test]
    fn test_constant_volume() {
        let (raw, t) = log_li_threshold(&[0.0; 4]);
        assert!(t.inverse(raw) > 0.0);
    }
}
