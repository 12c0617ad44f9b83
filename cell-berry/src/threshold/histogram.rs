//! 以数据实际范围为区间的等宽直方图.

/// 等宽直方图. 区间为 \[min, max\], 最后一个分箱包含右端点.
#[derive(Debug, Clone)]
pub(crate) struct Histogram {
    /// 每个分箱的样本个数.
    pub counts: Vec<f64>,

    /// 每个分箱的中心.
    pub centers: Vec<f64>,
}

impl Histogram {
    /// 统计 `values` 的直方图. `values` 必须非空, 否则程序 panic.
    ///
    /// 当数据为常数时, 区间扩展为 \[v - 0.5, v + 0.5\].
    pub fn new(values: &[f64], bins: usize) -> Self {
        debug_assert!(bins > 0);
        let (mut lo, mut hi) = min_max(values);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;
        let mut counts = vec![0.0; bins];
        for v in values {
            let i = (((v - lo) / (hi - lo)) * bins as f64) as usize;
            counts[i.min(bins - 1)] += 1.0;
        }
        let centers = (0..bins).map(|i| lo + (i as f64 + 0.5) * width).collect();
        Self { counts, centers }
    }

    /// 分箱个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }
}

/// 最小值与最大值. `values` 必须非空.
#[inline]
pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        })
}

/// 第一个最大值的下标. `it` 必须非空.
#[inline]
pub(crate) fn arg_max<I: IntoIterator<Item = f64>>(it: I) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, v) in it.into_iter().enumerate() {
        if v > best.1 {
            best = (i, v);
        }
    }
    best.0
}
