use std::ops::Index;

use ndarray::{Array3, ArrayView3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{Mask, VolumeAttr};
use crate::consts::LABEL_BACKGROUND;
use crate::Idx3d;

/// 三维连通区域标签图. `0` 为背景, `1..=K` 为 K 个互不相交的区域.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LabelMap {
    data: Array3<u16>,
}

impl VolumeAttr for LabelMap {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for LabelMap {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LabelMap {
    /// 直接初始化. 调用者需保证标签从 1 开始连续.
    #[inline]
    pub fn new(data: Array3<u16>) -> Self {
        Self { data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u16> {
        self.data.view()
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<u16> {
        self.data
    }

    /// 区域个数, 即最大标签值.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.iter().copied().max().unwrap_or(LABEL_BACKGROUND) as usize
    }

    /// 是否不含任何区域?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.iter().all(|v| *v == LABEL_BACKGROUND)
    }

    /// 将所有非背景标签视为前景, 得到二值掩膜.
    #[inline]
    pub fn to_mask(&self) -> Mask {
        Mask::new(self.data.mapv(|v| v != LABEL_BACKGROUND))
    }

    /// 统计每个区域的体素个数. 第 `i` 个元素对应标签 `i + 1`.
    pub fn sizes(&self) -> Vec<usize> {
        let mut ans = vec![0; self.len()];
        for &v in self.data.iter().filter(|v| **v != LABEL_BACKGROUND) {
            ans[v as usize - 1] += 1;
        }
        ans
    }

    /// 统计值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u16) -> usize {
        self.data.iter().filter(|v| **v == label).count()
    }
}

#[cfg(test)]
mod tests {
    use super::LabelMap;
    use ndarray::Array3;

    #[test]
    fn test_label_map_stat() {
        let mut raw = Array3::<u16>::zeros((1, 2, 4));
        raw[(0, 0, 0)] = 1;
        raw[(0, 0, 1)] = 1;
        raw[(0, 1, 3)] = 2;
        let labels = LabelMap::new(raw);
        assert_eq!(labels.len(), 2);
        assert!(!labels.is_empty());
        assert_eq!(labels.sizes(), vec![2, 1]);
        assert_eq!(labels.count(0), 5);
        assert_eq!(labels.to_mask().count(), 3);

        let empty = LabelMap::new(Array3::zeros((2, 2, 2)));
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
        assert!(empty.sizes().is_empty());
    }
}
