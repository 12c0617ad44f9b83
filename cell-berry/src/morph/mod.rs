//! 二值形态学: 孔洞填充, 小目标移除, 连通区域标记, 膨胀/腐蚀与异或.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Idx2d, Idx3d, SegError};

mod algebra;
mod clean;
mod label;

pub use algebra::{binary_dilation, binary_erosion, logical_xor};
pub use clean::{fill_and_filter, fill_and_filter_linear_size, FillFilter, SizeBounds};
pub use label::label_uint16;

/// 形态学操作的作用方式.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProcessMode {
    /// 逐个水平切片独立处理, 使用 4-邻接.
    PerSlice,

    /// 作为整体三维数据处理, 使用 6-邻接 (钻石型).
    Volumetric,
}

impl fmt::Display for ProcessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerSlice => f.write_str("slice_by_slice"),
            Self::Volumetric => f.write_str("3D"),
        }
    }
}

impl FromStr for ProcessMode {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slice_by_slice" | "slice-by-slice" | "2D" => Ok(Self::PerSlice),
            "3D" => Ok(Self::Volumetric),
            other => Err(SegError::InvalidParameter(format!("未知的处理方式 `{other}`"))),
        }
    }
}

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 获得 `(z, h, w)` 的 6-邻居索引. 不检查越界.
#[inline]
pub(crate) fn neighbour6((z, h, w): Idx3d) -> [Idx3d; 6] {
    [
        (z.wrapping_sub(1), h, w),
        (z.saturating_add(1), h, w),
        (z, h.wrapping_sub(1), w),
        (z, h.saturating_add(1), w),
        (z, h, w.wrapping_sub(1)),
        (z, h, w.saturating_add(1)),
    ]
}
