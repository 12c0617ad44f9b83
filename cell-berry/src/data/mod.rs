use crate::Idx3d;

mod label_map;
mod mask;
mod slice;
mod stack;

pub use label_map::LabelMap;
pub use mask::Mask;
pub use slice::{MaskSlice, MaskSliceMut};
pub use stack::{select_channel_from_raw, CellStack};

/// 三维数据 (z, 高, 宽) 的共用属性和部分通用操作.
pub trait VolumeAttr {
    /// 获取数据形状大小.
    fn shape(&self) -> Idx3d;

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 判断一个索引是否位于长方体的六个表面上.
    #[inline]
    fn is_at_border(&self, (z0, h0, w0): Idx3d) -> bool {
        let (z, h, w) = self.shape();
        z0 == 0
            || z0.saturating_add(1) == z
            || h0 == 0
            || h0.saturating_add(1) == h
            || w0 == 0
            || w0.saturating_add(1) == w
    }

    /// 获取 `pos` 前后上下左右六个点中不越界的坐标.
    #[inline]
    fn diamond_neighbours(&self, pos: Idx3d) -> Vec<Idx3d> {
        crate::morph::neighbour6(pos)
            .into_iter()
            .filter(|p| self.check(p))
            .collect()
    }
}
