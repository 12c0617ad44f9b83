//! Sauvola 局部阈值.

use itertools::iproduct;
use ndarray::{Array3, ArrayView3};

use crate::consts::{SAUVOLA_K, SAUVOLA_WINDOW};
use crate::Idx3d;

/// 三维累加表, 下标整体偏移 1, `table[(z, h, w)]` 为 `[0, z) × [0, h) × [0, w)` 的和.
fn summed_volume(img: ArrayView3<f32>, square: bool) -> Array3<f64> {
    let (d, h, w) = img.dim();
    let mut table = Array3::<f64>::zeros((d + 1, h + 1, w + 1));
    for (z, y, x) in iproduct!(0..d, 0..h, 0..w) {
        let v = img[(z, y, x)] as f64;
        let v = if square { v * v } else { v };
        table[(z + 1, y + 1, x + 1)] = v
            + table[(z, y + 1, x + 1)]
            + table[(z + 1, y, x + 1)]
            + table[(z + 1, y + 1, x)]
            - table[(z, y, x + 1)]
            - table[(z, y + 1, x)]
            - table[(z + 1, y, x)]
            + table[(z, y, x)];
    }
    table
}

/// 左闭右开区间 `[lo, hi)` 的长方体之和.
#[inline]
fn box_sum(t: &Array3<f64>, (z0, y0, x0): Idx3d, (z1, y1, x1): Idx3d) -> f64 {
    t[(z1, y1, x1)] - t[(z0, y1, x1)] - t[(z1, y0, x1)] - t[(z1, y1, x0)]
        + t[(z0, y0, x1)]
        + t[(z0, y1, x0)]
        + t[(z1, y0, x0)]
        - t[(z0, y0, x0)]
}

/// 以 `window` 为边长的窗口计算 Sauvola 阈值曲面 `m · (1 + k · (s / R - 1))`,
/// 其中 `R` 为动态范围的一半. 窗口在体数据边界处被裁剪.
pub fn sauvola_surface(img: ArrayView3<f32>, window: usize, k: f64) -> Array3<f64> {
    let (d, h, w) = img.dim();
    let (lo, hi) = img
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    let r = 0.5 * (hi as f64 - lo as f64);

    let sum = summed_volume(img, false);
    let sq = summed_volume(img, true);
    let before = window / 2;
    let after = window - before;

    Array3::from_shape_fn((d, h, w), |(z, y, x)| {
        let from = (
            z.saturating_sub(before),
            y.saturating_sub(before),
            x.saturating_sub(before),
        );
        let to = ((z + after).min(d), (y + after).min(h), (x + after).min(w));
        let n = ((to.0 - from.0) * (to.1 - from.1) * (to.2 - from.2)) as f64;
        let mean = box_sum(&sum, from, to) / n;
        let var = (box_sum(&sq, from, to) / n - mean * mean).max(0.0);
        let ratio = if r > 0.0 { var.sqrt() / r } else { 0.0 };
        mean * (1.0 + k * (ratio - 1.0))
    })
}

/// 使用默认窗口与 `k` 的 Sauvola 阈值曲面.
#[inline]
pub fn threshold_sauvola(img: ArrayView3<f32>) -> Array3<f64> {
    sauvola_surface(img, SAUVOLA_WINDOW, SAUVOLA_K)
}
