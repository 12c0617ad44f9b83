//! 信号预处理: 归一化, 逐切片中值滤波与高斯平滑.
//!
//! 两种滤波都只作用于水平切片 (高, 宽), 不跨越 z 方向.
//! 启用 `rayon` feature 时各切片并行处理, 结果与串行版本完全一致.

use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};
use ordered_float::OrderedFloat;

use crate::consts::GAUSSIAN_TRUNCATE;
use crate::error::{invalid, SegResult};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 将强度线性拉伸到 \[0, 1\]. 强度恒定 (或为空) 的数组映射为全 0.
pub fn min_max_intensity_normalization(img: ArrayView3<f32>) -> Array3<f32> {
    let (lo, hi) = img
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !(hi > lo) {
        return Array3::zeros(img.raw_dim());
    }
    let range = hi - lo;
    img.mapv(|v| (v - lo) / range)
}

/// 对每个水平切片独立运行 `op(输入切片, 输出切片)`.
fn for_each_plane<F>(src: ArrayView3<f32>, op: F) -> Array3<f32>
where
    F: Fn(ArrayView2<f32>, ArrayViewMut2<f32>) + Sync + Send,
{
    let mut dst = Array3::<f32>::zeros(src.raw_dim());
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            dst.axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(src.axis_iter(Axis(0)).into_par_iter())
                .for_each(|(d, s)| op(s, d));
        } else {
            dst.axis_iter_mut(Axis(0))
                .zip(src.axis_iter(Axis(0)))
                .for_each(|(d, s)| op(s, d));
        }
    }
    dst
}

/// 半像素对称 (`d c b a | a b c d | d c b a`) 的边界折返.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    let m = i.rem_euclid(2 * n);
    (if m < n { m } else { 2 * n - 1 - m }) as usize
}

/// 以 `size × size` 窗口逐切片中值滤波. 边界按半像素对称折返.
///
/// 窗口偏移范围为 `-(size / 2) ..= size - size / 2 - 1`, 偶数窗口取较高的中位数.
/// `size <= 1` 时直接返回输入的拷贝.
pub fn median_filter_slice_by_slice(img: ArrayView3<f32>, size: usize) -> Array3<f32> {
    if size <= 1 || img.is_empty() {
        return img.to_owned();
    }
    let lo = -((size / 2) as isize);
    let hi = (size - size / 2) as isize - 1;
    let rank = size * size / 2;

    for_each_plane(img, |src, mut dst| {
        let (height, width) = src.dim();
        let mut buf = Vec::with_capacity(size * size);
        for ((h, w), out) in dst.indexed_iter_mut() {
            buf.clear();
            for dh in lo..=hi {
                let hh = reflect(h as isize + dh, height);
                for dw in lo..=hi {
                    let ww = reflect(w as isize + dw, width);
                    buf.push(OrderedFloat(src[(hh, ww)]));
                }
            }
            let (_, m, _) = buf.select_nth_unstable(rank);
            *out = m.0;
        }
    })
}

/// 截断于 `truncate · sigma` 的归一化一维高斯核.
fn gaussian_kernel(sigma: f64, truncate: f64) -> Array1<f64> {
    let radius = (truncate * sigma + 0.5) as usize;
    let r = radius as isize;
    let kernel =
        Array1::from_iter((-r..=r).map(|x| (-0.5 * (x * x) as f64 / (sigma * sigma)).exp()));
    let sum = kernel.sum();
    kernel / sum
}

/// 沿一个轴做一维卷积, 边界取最近的像素.
fn convolve_nearest(src: ArrayView2<f32>, kernel: &Array1<f64>, axis: usize) -> Array2<f32> {
    let (height, width) = src.dim();
    let radius = (kernel.len() / 2) as isize;
    Array2::from_shape_fn((height, width), |(h, w)| {
        let (pos, len) = if axis == 0 { (h, height) } else { (w, width) };
        let mut acc = 0.0f64;
        for (k, weight) in kernel.iter().enumerate() {
            let i = (pos as isize + k as isize - radius).clamp(0, len as isize - 1) as usize;
            let v = if axis == 0 { src[(i, w)] } else { src[(h, i)] };
            acc += weight * v as f64;
        }
        acc as f32
    })
}

/// 以标准差 `sigma` 逐切片高斯平滑, 可分离实现, 边界取最近的像素.
///
/// `sigma == 0` 时直接返回输入的拷贝; 负数或非有限值返回 `Err`.
pub fn gaussian_smoothing_slice_by_slice(
    img: ArrayView3<f32>,
    sigma: f64,
) -> SegResult<Array3<f32>> {
    if !sigma.is_finite() || sigma < 0.0 {
        return invalid(format!("高斯平滑的 sigma 必须为非负有限值, 实际为 {sigma}"));
    }
    if sigma == 0.0 || img.is_empty() {
        return Ok(img.to_owned());
    }
    let kernel = gaussian_kernel(sigma, GAUSSIAN_TRUNCATE);
    Ok(for_each_plane(img, |src, mut dst| {
        let tmp = convolve_nearest(src, &kernel, 0);
        dst.assign(&convolve_nearest(tmp.view(), &kernel, 1));
    }))
}

/// 归一化到 \[0, 1\], 然后依次进行逐切片中值滤波与高斯平滑.
pub fn scale_and_smooth(
    img: ArrayView3<f32>,
    median_size: usize,
    gauss_sigma: f64,
) -> SegResult<Array3<f32>> {
    let normalized = min_max_intensity_normalization(img);
    let med = median_filter_slice_by_slice(normalized.view(), median_size);
    gaussian_smoothing_slice_by_slice(med.view(), gauss_sigma)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegError;
    use approx::assert_abs_diff_eq;
    use ndarray::{Array, Array3};

    #[test]
    fn test_normalization() {
        let img = Array::from_shape_vec((1, 1, 3), vec![2.0f32, 4.0, 6.0]).unwrap();
        let n = min_max_intensity_normalization(img.view());
        assert_eq!(n.as_slice().unwrap(), &[0.0, 0.5, 1.0]);

        let constant = Array3::<f32>::from_elem((2, 2, 2), 7.0);
        let n = min_max_intensity_normalization(constant.view());
        assert!(n.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(-1, 1), 0);
        assert_eq!(reflect(2, 1), 0);
    }

    #[test]
    fn test_median_reflect_border() {
        // 边缘处的尖峰经过折返后在窗口中占多数, 因此保留.
        let img = Array::from_shape_vec((1, 1, 4), vec![5.0f32, 0.0, 0.0, 0.0]).unwrap();
        let m = median_filter_slice_by_slice(img.view(), 3);
        assert_eq!(m.as_slice().unwrap(), &[5.0, 0.0, 0.0, 0.0]);

        // 内部的孤立尖峰被移除.
        let img = Array::from_shape_vec((1, 1, 5), vec![0.0f32, 0.0, 5.0, 0.0, 0.0]).unwrap();
        let m = median_filter_slice_by_slice(img.view(), 3);
        assert!(m.iter().all(|v| *v == 0.0));

        // 各切片相互独立.
        let mut img = Array3::<f32>::zeros((3, 5, 5));
        img[(1, 2, 2)] = 1.0;
        img[(0, 2, 2)] = 1.0;
        img[(2, 2, 2)] = 1.0;
        let m = median_filter_slice_by_slice(img.view(), 3);
        assert!(m.iter().all(|v| *v == 0.0));

        assert_eq!(median_filter_slice_by_slice(img.view(), 1), img);
    }

    #[test]
    fn test_gaussian() {
        let mut img = Array3::<f32>::zeros((2, 9, 9));
        img[(0, 4, 4)] = 1.0;
        let g = gaussian_smoothing_slice_by_slice(img.view(), 1.0).unwrap();

        // 不跨越 z 方向.
        assert!(g.index_axis(Axis(0), 1).iter().all(|v| *v == 0.0));
        // 内部冲激的响应对称, 总和为 1.
        assert_abs_diff_eq!(g.sum(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(g[(0, 3, 4)], g[(0, 5, 4)], epsilon = 1e-7);
        assert_abs_diff_eq!(g[(0, 4, 3)], g[(0, 3, 4)], epsilon = 1e-7);
        assert!(g[(0, 4, 4)] > g[(0, 3, 4)]);
        assert!(g[(0, 3, 4)] > g[(0, 3, 3)]);

        let constant = Array3::<f32>::from_elem((1, 4, 4), 0.25);
        let g = gaussian_smoothing_slice_by_slice(constant.view(), 2.0).unwrap();
        g.iter().for_each(|v| assert_abs_diff_eq!(*v, 0.25, epsilon = 1e-6));

        assert_eq!(gaussian_smoothing_slice_by_slice(img.view(), 0.0).unwrap(), img);
    }

    #[test]
    fn test_gaussian_invalid_sigma() {
        let img = Array3::<f32>::zeros((1, 2, 2));
        assert!(matches!(
            gaussian_smoothing_slice_by_slice(img.view(), -1.0),
            Err(SegError::InvalidParameter(_))
        ));
        assert!(scale_and_smooth(img.view(), 2, f64::NAN).is_err());
    }

    #[test]
    fn test_scale_and_smooth_range() {
        let img = Array3::from_shape_fn((2, 6, 6), |(z, h, w)| (z * 36 + h * 6 + w) as f32 * 3.0);
        let s = scale_and_smooth(img.view(), 2, 1.34).unwrap();
        assert_eq!(s.dim(), (2, 6, 6));
        assert!(s.iter().all(|v| (-1e-6..=1.0 + 1e-6).contains(v)));
    }
}
