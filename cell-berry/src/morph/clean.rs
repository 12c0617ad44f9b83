use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ProcessMode;
use crate::error::{invalid, SegResult};
use crate::Mask;

/// 以像素 (逐切片) 或体素 (三维) 个数表示的尺寸过滤参数.
///
/// 面积 `H` 满足 `hole_min <= H <= hole_max` 且不接触边缘的背景区域被填充为前景;
/// 面积小于 `min_size` 的前景区域被移除.
/// 因此 `hole_max == 0` 时不填充孔洞, `min_size == 0` 时不移除目标.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SizeBounds {
    /// 可填充孔洞的最小面积 (含).
    pub hole_min: usize,

    /// 可填充孔洞的最大面积 (含).
    pub hole_max: usize,

    /// 保留目标的最小面积 (含).
    pub min_size: usize,
}

impl SizeBounds {
    /// 初始化. 如果 `hole_min > hole_max` 则返回 `Err`.
    pub fn new(hole_min: usize, hole_max: usize, min_size: usize) -> SegResult<Self> {
        if hole_min > hole_max {
            return invalid(format!("孔洞面积下界 {hole_min} 大于上界 {hole_max}"));
        }
        Ok(Self {
            hole_min,
            hole_max,
            min_size,
        })
    }
}

/// 以线性宽度表示的尺寸过滤参数.
///
/// 宽度 `w` 在逐切片模式下换算为面积 `w²`, 在三维模式下换算为体积 `w³`.
/// 面积 `H` 满足 `min² <= H <= max²` 的孔洞被填充, 满足 `H >= small²` 的目标被保留
/// (三维模式下为立方), 比较均针对未取整的换算值.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FillFilter {
    /// 可填充孔洞的最小宽度.
    pub hole_min_width: f64,

    /// 可填充孔洞的最大宽度.
    pub hole_max_width: f64,

    /// 保留目标的最小宽度.
    pub small_obj_width: f64,

    /// 作用方式.
    pub mode: ProcessMode,
}

impl FillFilter {
    /// 直接初始化, 不检查参数.
    #[inline]
    pub const fn new(
        hole_min_width: f64,
        hole_max_width: f64,
        small_obj_width: f64,
        mode: ProcessMode,
    ) -> Self {
        Self {
            hole_min_width,
            hole_max_width,
            small_obj_width,
            mode,
        }
    }

    /// 将线性宽度换算为面积/体积.
    pub fn bounds(&self) -> SegResult<SizeBounds> {
        let exp = match self.mode {
            ProcessMode::PerSlice => 2,
            ProcessMode::Volumetric => 3,
        };
        let convert = |w: f64| -> SegResult<f64> {
            if !w.is_finite() || w < 0.0 {
                return invalid(format!("宽度必须为非负有限值, 实际为 {w}"));
            }
            Ok(w.powi(exp))
        };
        if self.hole_min_width > self.hole_max_width {
            return invalid(format!(
                "孔洞宽度下界 {} 大于上界 {}",
                self.hole_min_width, self.hole_max_width
            ));
        }
        let hole_min = convert(self.hole_min_width)?.ceil() as usize;
        let hole_max = convert(self.hole_max_width)?.floor() as usize;
        let min_size = convert(self.small_obj_width)?.ceil() as usize;

        // 区间内没有整数面积时不填充.
        if hole_min > hole_max {
            return SizeBounds::new(0, 0, min_size);
        }
        SizeBounds::new(hole_min, hole_max, min_size)
    }
}

/// 填充孔洞, 然后移除小目标. 返回新的掩膜.
pub fn fill_and_filter(mask: &Mask, bounds: &SizeBounds, mode: ProcessMode) -> Mask {
    let mut out = mask.clone();
    let SizeBounds {
        hole_min,
        hole_max,
        min_size,
    } = *bounds;
    let is_hole = |len: usize| hole_min <= len && len <= hole_max;

    let (mut filled, mut removed) = (0usize, 0usize);
    match mode {
        ProcessMode::PerSlice => {
            for mut s in out.slice_iter_mut() {
                if hole_max > 0 {
                    for area in s.areas(false) {
                        if is_hole(area.len()) && !s.touches_border(&area) {
                            filled += 1;
                            s.fill_batch(area, true);
                        }
                    }
                }
                if min_size > 0 {
                    for area in s.areas(true) {
                        if area.len() < min_size {
                            removed += 1;
                            s.fill_batch(area, false);
                        }
                    }
                }
            }
        }
        ProcessMode::Volumetric => {
            if hole_max > 0 {
                for area in out.areas(false) {
                    if is_hole(area.len()) && !out.touches_border(&area) {
                        filled += 1;
                        out.fill_batch(area, true);
                    }
                }
            }
            if min_size > 0 {
                for area in out.areas(true) {
                    if area.len() < min_size {
                        removed += 1;
                        out.fill_batch(area, false);
                    }
                }
            }
        }
    }
    debug!("{mode}: 填充 {filled} 个孔洞, 移除 {removed} 个小目标");
    out
}

/// 以线性宽度为参数的 [`fill_and_filter`].
#[inline]
pub fn fill_and_filter_linear_size(mask: &Mask, filter: &FillFilter) -> SegResult<Mask> {
    Ok(fill_and_filter(mask, &filter.bounds()?, filter.mode))
}
