//! 全局阈值算法. 所有函数都要求输入非空.

use ordered_float::OrderedFloat;

use super::histogram::{arg_max, min_max, Histogram};
use crate::consts::{HISTOGRAM_BINS, LI_MAX_ROUNDS};
use crate::error::{invalid, SegResult};

/// Otsu 阈值: 使两类间方差最大的分箱中心.
pub(crate) fn threshold_otsu(values: &[f64]) -> f64 {
    let (lo, hi) = min_max(values);
    if lo == hi {
        return lo;
    }
    let Histogram { counts, centers } = Histogram::new(values, HISTOGRAM_BINS);
    let n = counts.len();

    // 前缀 (类 1) 与后缀 (类 2) 的权重和均值.
    let mut w1 = vec![0.0; n];
    let mut m1 = vec![0.0; n];
    let (mut acc_w, mut acc_m) = (0.0, 0.0);
    for i in 0..n {
        acc_w += counts[i];
        acc_m += counts[i] * centers[i];
        w1[i] = acc_w;
        m1[i] = if acc_w > 0.0 { acc_m / acc_w } else { 0.0 };
    }
    let mut w2 = vec![0.0; n];
    let mut m2 = vec![0.0; n];
    let (mut acc_w, mut acc_m) = (0.0, 0.0);
    for i in (0..n).rev() {
        acc_w += counts[i];
        acc_m += counts[i] * centers[i];
        w2[i] = acc_w;
        m2[i] = if acc_w > 0.0 { acc_m / acc_w } else { 0.0 };
    }

    let idx = arg_max((0..n - 1).map(|i| w1[i] * w2[i + 1] * (m1[i] - m2[i + 1]).powi(2)));
    centers[idx]
}

/// 三分类 multi-Otsu 阈值, 返回 (低阈值, 高阈值).
///
/// 直方图中非空分箱少于 3 个时返回 `Err`.
pub(crate) fn threshold_multiotsu(values: &[f64]) -> SegResult<(f64, f64)> {
    let Histogram { counts, centers } = Histogram::new(values, HISTOGRAM_BINS);
    let nonzero: Vec<usize> = (0..counts.len()).filter(|i| counts[*i] > 0.0).collect();
    match nonzero.len() {
        0..=2 => {
            return invalid(format!(
                "multi-Otsu 需要至少 3 个不同的强度等级, 实际只有 {}",
                nonzero.len()
            ))
        }
        3 => return Ok((centers[nonzero[0]], centers[nonzero[1]])),
        _ => {}
    }

    let n = counts.len();
    let total: f64 = counts.iter().sum();
    // 零阶矩与一阶矩的前缀和, zero[i] 为 [0, i) 的和.
    let mut zero = vec![0.0; n + 1];
    let mut first = vec![0.0; n + 1];
    for i in 0..n {
        let p = counts[i] / total;
        zero[i + 1] = zero[i] + p;
        first[i + 1] = first[i] + p * centers[i];
    }
    // 分箱区间 [a, b] 的类间方差贡献.
    let var = |a: usize, b: usize| {
        let w = zero[b + 1] - zero[a];
        let m = first[b + 1] - first[a];
        if w > 0.0 {
            m * m / w
        } else {
            0.0
        }
    };

    let mut best = (0, 1, f64::NEG_INFINITY);
    for t1 in 0..n - 2 {
        let head = var(0, t1);
        for t2 in t1 + 1..n - 1 {
            let v = head + var(t1 + 1, t2) + var(t2 + 1, n - 1);
            if v > best.2 {
                best = (t1, t2, v);
            }
        }
    }
    Ok((centers[best.0], centers[best.1]))
}

/// Li 最小交叉熵迭代阈值.
pub(crate) fn threshold_li(values: &[f64]) -> f64 {
    let (lo, hi) = min_max(values);
    if lo == hi {
        return lo;
    }

    // 容差取相邻不同取值最小间距的一半.
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    sorted.dedup();
    let tolerance = sorted
        .windows(2)
        .map(|w| w[1].0 - w[0].0)
        .fold(f64::INFINITY, f64::min)
        / 2.0;

    // 平移到以 0 为下界.
    let shifted: Vec<f64> = values.iter().map(|v| v - lo).collect();
    let mut t_next = shifted.iter().sum::<f64>() / shifted.len() as f64;
    let mut t_curr = -2.0 * tolerance;

    for _ in 0..LI_MAX_ROUNDS {
        if (t_next - t_curr).abs() <= tolerance {
            break;
        }
        t_curr = t_next;
        let (mut fore, mut n_fore, mut back, mut n_back) = (0.0, 0usize, 0.0, 0usize);
        for v in shifted.iter() {
            if *v > t_curr {
                fore += v;
                n_fore += 1;
            } else {
                back += v;
                n_back += 1;
            }
        }
        if n_fore == 0 || n_back == 0 {
            break;
        }
        let (mean_fore, mean_back) = (fore / n_fore as f64, back / n_back as f64);
        if mean_back == 0.0 {
            break;
        }
        t_next = (mean_back - mean_fore) / (mean_back.ln() - mean_fore.ln());
    }
    t_next + lo
}

/// Triangle 阈值: 直方图峰值与最远非空端点连线上, 距离直方图最远的分箱中心.
pub(crate) fn threshold_triangle(values: &[f64]) -> f64 {
    let (lo, hi) = min_max(values);
    if lo == hi {
        return lo;
    }
    let Histogram { mut counts, centers } = Histogram::new(values, HISTOGRAM_BINS);
    let n = counts.len();

    let mut arg_peak = arg_max(counts.iter().copied());
    let peak_height = counts[arg_peak];
    let mut nonzero = (0..n).filter(|i| counts[*i] > 0.0);
    let mut arg_low = nonzero.next().unwrap_or(0);
    let arg_high = nonzero.last().unwrap_or(arg_low);
    if arg_low == arg_high {
        return lo;
    }

    // 保证峰值的长尾一侧位于左边.
    let flip = arg_peak - arg_low < arg_high - arg_peak;
    if flip {
        counts.reverse();
        arg_low = n - arg_high - 1;
        arg_peak = n - arg_peak - 1;
    }

    let width = (arg_peak - arg_low) as f64;
    let norm = (peak_height * peak_height + width * width).sqrt();
    let (peak_n, width_n) = (peak_height / norm, width / norm);
    let mut arg_level = arg_low
        + arg_max(
            (0..arg_peak - arg_low).map(|x| peak_n * x as f64 - width_n * counts[x + arg_low]),
        );
    if flip {
        arg_level = n - arg_level - 1;
    }
    centers[arg_level]
}

/// 算术平均值.
#[inline]
pub(crate) fn threshold_mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// 第 50 百分位数, 在相邻两个次序统计量之间线性插值.
pub(crate) fn threshold_median(values: &[f64]) -> f64 {
    let mut sorted: Vec<OrderedFloat<f64>> = values.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    let pos = 0.5 * (sorted.len() - 1) as f64;
    let (i, frac) = (pos.floor() as usize, pos.fract());
    match sorted.get(i + 1) {
        Some(next) if frac > 0.0 => sorted[i].0 + frac * (next.0 - sorted[i].0),
        _ => sorted[i].0,
    }
}

/// Triangle 阈值与中位数的平均值.
#[inline]
pub(crate) fn threshold_ave_tri_med(values: &[f64]) -> f64 {
    0.5 * (threshold_triangle(values) + threshold_median(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 两个分离良好的模态.
    fn bimodal() -> Vec<f64> {
        let mut v = vec![0.1; 60];
        v.extend([0.12, 0.08, 0.11, 0.09]);
        v.extend(vec![0.8; 30]);
        v.extend([0.82, 0.78, 0.79, 0.81]);
        v
    }

    #[test]
    fn test_otsu_separates_modes() {
        let v = bimodal();
        let t = threshold_otsu(&v);
        assert!(t >= 0.11 && t < 0.78, "otsu = {t}");
        assert_eq!(threshold_otsu(&[0.3, 0.3]), 0.3);
    }

    #[test]
    fn test_li_separates_modes() {
        let v = bimodal();
        let t = threshold_li(&v);
        assert!(t > 0.12 && t < 0.78, "li = {t}");
        assert_eq!(threshold_li(&[2.0; 5]), 2.0);
    }

    #[test]
    fn test_multiotsu() {
        let mut v = vec![0.0; 20];
        v.extend(vec![0.5; 20]);
        v.extend(vec![1.0; 20]);
        v.extend([0.02, 0.48, 0.52, 0.98]);
        let (low, high) = threshold_multiotsu(&v).unwrap();
        assert!(low >= 0.01 && low < 0.48, "low = {low}");
        assert!(high > 0.5 && high < 0.98, "high = {high}");

        // 恰好三个强度等级.
        let (low, high) = threshold_multiotsu(&[0.0, 0.5, 1.0]).unwrap();
        assert!(low < 0.01 && high > 0.49 && high < 0.51);

        assert!(threshold_multiotsu(&[0.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_triangle() {
        // 峰值在左, 长尾向右.
        let mut v = vec![0.0; 100];
        for i in 1..=50 {
            v.extend(vec![i as f64 / 50.0; (51 - i) / 5 + 1]);
        }
        let t = threshold_triangle(&v);
        assert!(t > 0.0 && t < 1.0, "triangle = {t}");

        // 翻转后结果对称.
        let flipped: Vec<f64> = v.iter().map(|x| 1.0 - x).collect();
        let tf = threshold_triangle(&flipped);
        assert_abs_diff_eq!(tf, 1.0 - t, epsilon = 1e-9);
    }

    #[test]
    fn test_mean_median() {
        assert_abs_diff_eq!(threshold_mean(&[1.0, 2.0, 6.0]), 3.0);
        assert_abs_diff_eq!(threshold_median(&[4.0, 1.0, 2.0]), 2.0);
        assert_abs_diff_eq!(threshold_median(&[4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_abs_diff_eq!(threshold_median(&[7.0]), 7.0);

        let v = [0.0, 0.0, 1.0, 1.0, 1.0];
        assert_abs_diff_eq!(
            threshold_ave_tri_med(&v),
            0.5 * (threshold_triangle(&v) + 1.0)
        );
    }
}
