use ndarray::{Array3, Zip};

use super::neighbour6;
use crate::error::{invalid, SegResult};
use crate::{Mask, VolumeAttr};

/// 以 6-邻域十字形结构元素进行一次二值膨胀. 体数据之外视为背景.
pub fn binary_dilation(mask: &Mask) -> Mask {
    let data = mask.data();
    Mask::new(Array3::from_shape_fn(mask.shape(), |pos| {
        data[pos]
            || neighbour6(pos)
                .into_iter()
                .any(|p| matches!(data.get(p), Some(true)))
    }))
}

/// 以 6-邻域十字形结构元素进行一次二值腐蚀. 体数据之外视为前景,
/// 因此实心体数据不会从表面开始被腐蚀.
pub fn binary_erosion(mask: &Mask) -> Mask {
    let data = mask.data();
    Mask::new(Array3::from_shape_fn(mask.shape(), |pos| {
        data[pos]
            && neighbour6(pos)
                .into_iter()
                .all(|p| !matches!(data.get(p), Some(false)))
    }))
}

/// 逐体素异或. 两个掩膜形状不一致时返回 `Err`.
pub fn logical_xor(a: &Mask, b: &Mask) -> SegResult<Mask> {
    if a.shape() != b.shape() {
        return invalid(format!(
            "掩膜形状不一致: {:?} 与 {:?}",
            a.shape(),
            b.shape()
        ));
    }
    let data = Zip::from(a.data())
        .and(b.data())
        .map_collect(|x, y| *x ^ *y);
    Ok(Mask::new(data))
}
