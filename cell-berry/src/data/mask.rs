use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use ndarray::{Array3, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{MaskSlice, MaskSliceMut, VolumeAttr};
use crate::{Area3d, Areas3d, Idx3d};

/// 三维二值掩膜, 按 (z, 高, 宽) 组织. `true` 为前景.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mask {
    data: Array3<bool>,
}

impl VolumeAttr for Mask {
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl Index<Idx3d> for Mask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Mask {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl From<Array3<bool>> for Mask {
    #[inline]
    fn from(data: Array3<bool>) -> Self {
        Self::new(data)
    }
}

impl Mask {
    /// 直接初始化.
    #[inline]
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// 创建形状为 `shape` 的全背景掩膜.
    #[inline]
    pub fn empty(shape: Idx3d) -> Self {
        Self::new(Array3::from_elem(shape, false))
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }

    /// 前景体素个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.data.iter().any(|p| *p)
    }

    /// 获取 z 空间的第 `z_index` 层不可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> MaskSlice<'_> {
        MaskSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取 z 空间的第 `z_index` 层可变切片.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at_mut(&mut self, z_index: usize) -> MaskSliceMut<'_> {
        MaskSliceMut::new(self.data.index_axis_mut(Axis(0), z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = MaskSlice> {
        self.data.axis_iter(Axis(0)).map(MaskSlice::new)
    }

    /// 获取能按升序迭代水平可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = MaskSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(MaskSliceMut::new)
    }

    /// 将 `it` 给出的所有位置设置为 `value`.
    #[inline]
    pub fn fill_batch<I: IntoIterator<Item = Idx3d>>(&mut self, it: I, value: bool) {
        it.into_iter().for_each(|pos| self[pos] = value);
    }

    /// 按照 6-相邻 (钻石型) 规则获取所有值为 `value` 的区域.
    ///
    /// 区域按行优先序的首次出现位置排列, 区域内部按 BFS 顺序排列.
    pub fn areas(&self, value: bool) -> Areas3d {
        let mut ans = Areas3d::new();
        let mut vis = Array3::from_elem(self.shape(), false);
        let mut bfs_q = VecDeque::with_capacity(16);

        for (pos, &pix) in self.data.indexed_iter() {
            if pix != value || vis[pos] {
                continue;
            }
            vis[pos] = true;
            bfs_q.push_back(pos);
            let mut this_area = Area3d::with_capacity(1);
            while let Some(cur) = bfs_q.pop_front() {
                this_area.push(cur);
                for neigh in self.diamond_neighbours(cur) {
                    if self[neigh] == value && !vis[neigh] {
                        vis[neigh] = true;
                        bfs_q.push_back(neigh);
                    }
                }
            }
            ans.push(this_area);
        }
        ans
    }

    /// 区域 `area` 是否接触到长方体的某个表面?
    #[inline]
    pub fn touches_border(&self, area: &[Idx3d]) -> bool {
        area.iter().any(|p| self.is_at_border(*p))
    }
}
