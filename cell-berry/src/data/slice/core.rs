use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use ndarray::{Array2, ArrayView2, ArrayViewMut2};

use crate::{Area2d, Areas2d, Idx2d};

/// 不可变、借用的二维水平掩膜切片.
pub struct MaskSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Mask`].
    data: ArrayView2<'a, bool>,
}

impl Index<Idx2d> for MaskSlice<'_> {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维水平掩膜切片.
pub struct MaskSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Mask`].
    data: ArrayViewMut2<'a, bool>,
}

/// 可变方法集合.
impl<'a> MaskSliceMut<'a> {
    /// 将 `it` 给出的所有位置设置为 `value`.
    #[inline]
    pub fn fill_batch<I: IntoIterator<Item = Idx2d>>(&mut self, it: I, value: bool) {
        it.into_iter().for_each(|pos| self.data[pos] = value);
    }
}

impl Index<Idx2d> for MaskSliceMut<'_> {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for MaskSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// mask 不可变方法集合.
macro_rules! impl_mask_slice_immut {
    ($life: lifetime, $slice: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $slice {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                self.data.dim()
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 判断一个索引是否合法 (未越界).
            #[inline]
            pub fn check(&self, (h, w): Idx2d) -> bool {
                let (h_len, w_len) = self.shape();
                h < h_len && w < w_len
            }

            /// 统计前景像素个数.
            #[inline]
            pub fn count(&self) -> usize {
                self.data.iter().filter(|&p| *p).count()
            }

            /// 判断一个索引是否位于图像的边缘.
            #[inline]
            pub fn is_at_border(&self, (h, w): Idx2d) -> bool {
                h == 0
                    || h.saturating_add(1) == self.height()
                    || w == 0
                    || w.saturating_add(1) == self.width()
            }

            /// 区域 `area` 是否接触到图像边缘?
            #[inline]
            pub fn touches_border(&self, area: &[Idx2d]) -> bool {
                area.iter().any(|p| self.is_at_border(*p))
            }

            /// 获得 `pos` 的 4-邻域像素索引. 保证返回的索引都不越界.
            pub fn n4_positions(&self, pos: Idx2d) -> Vec<Idx2d> {
                crate::morph::neighbour4(pos)
                    .into_iter()
                    .filter(|p| self.check(*p))
                    .collect()
            }

            /// 按照 4-相邻规则获取所有值为 `value` 的区域.
            /// 两个像素 `p1` 和 `p2` 属于同一个区域, 当且仅当存在一条从 `p1` 到
            /// `p2` 的 4-相邻路径, 且路径上的所有像素值都为 `value`.
            ///
            /// 区域按行优先序的首次出现位置排列.
            pub fn areas(&self, value: bool) -> Areas2d {
                let mut ans = Areas2d::with_capacity(1);
                let mut bfs_q = VecDeque::with_capacity(4);
                let mut vis = Array2::from_elem(self.shape(), false);

                for (pos, &pix) in self.data.indexed_iter() {
                    if pix != value || vis[pos] {
                        continue;
                    }
                    vis[pos] = true;
                    bfs_q.push_back(pos);
                    let mut this_area = Area2d::with_capacity(1);
                    while let Some(cur_pos) = bfs_q.pop_front() {
                        this_area.push(cur_pos);

                        // bfs
                        for neigh in self.n4_positions(cur_pos) {
                            if self.data[neigh] == value && !vis[neigh] {
                                vis[neigh] = true;
                                bfs_q.push_back(neigh);
                            }
                        }
                    }
                    ans.push(this_area);
                }
                ans
            }
        }
    };
}

impl_mask_slice_immut!('a, MaskSlice<'a>, ArrayView2<'a, bool>);
impl_mask_slice_immut!('a, MaskSliceMut<'a>, ArrayViewMut2<'a, bool>);

#[cfg(test)]
mod tests {
    use crate::Mask;
    use ndarray::Array3;

    #[test]
    fn test_slice_areas_n4() {
        // 0 1 0
        // 1 0 1
        // 0 1 1
        let raw = [[false, true, false], [true, false, true], [false, true, true]];
        let m = Mask::new(Array3::from_shape_fn((1, 3, 3), |(_, h, w)| raw[h][w]));
        let s = m.slice_at(0);

        let fg = s.areas(true);
        assert_eq!(fg.len(), 3);
        assert_eq!(fg[0], vec![(0, 1)]);
        assert_eq!(fg[1], vec![(1, 0)]);
        assert_eq!(fg[2].len(), 3);

        let bg = s.areas(false);
        assert_eq!(bg.len(), 4);
        assert_eq!(bg[2], vec![(1, 1)]);
        assert!(!s.touches_border(&bg[2]));
        assert!(s.touches_border(&bg[3]));
        assert_eq!(s.count(), 5);
        assert!(s[(0, 1)] && !s[(1, 1)]);
    }

    #[test]
    fn test_slice_mut_fill() {
        let mut m = Mask::empty((2, 3, 3));
        let mut s = m.slice_at_mut(1);
        s.fill_batch([(1, 1), (0, 2)], true);
        s[(2, 2)] = true;
        assert!(s[(0, 2)]);
        assert_eq!(s.count(), 3);
        s[(2, 2)] = false;
        assert_eq!(m.count(), 2);
        assert!(m[(1, 1, 1)]);
        assert!(!m.slice_at(0).is_at_border((1, 1)));
    }
}
