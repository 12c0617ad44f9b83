use ndarray::{Array3, Array4, ArrayView3, ArrayView4, ArrayViewMut4, Axis};
use num::ToPrimitive;

use super::VolumeAttr;
use crate::error::{invalid, SegError, SegResult};
use crate::Idx3d;

/// 线性解混后的多通道三维显微图像, 按 (通道, z, 高, 宽) 组织.
/// 强度值以 `f32` 保存, 且保证非负、有限.
#[derive(Debug, Clone)]
pub struct CellStack {
    data: Array4<f32>,
}

impl VolumeAttr for CellStack {
    #[inline]
    fn shape(&self) -> Idx3d {
        let (_, z, h, w) = self.data.dim();
        (z, h, w)
    }
}

impl CellStack {
    /// 直接用 `f32` 数据初始化. 如果存在负数或非有限值, 则返回 `Err`.
    pub fn new(data: Array4<f32>) -> SegResult<Self> {
        if data.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return invalid("图像强度必须为非负有限值");
        }
        Ok(Self { data })
    }

    /// 从任意原始数值类型 (`u8`, `u16`, `f64` 等) 的 CZYX 数组创建图像.
    pub fn from_raw<A: ToPrimitive>(raw: ArrayView4<A>) -> SegResult<Self> {
        let mut data = Array4::<f32>::zeros(raw.raw_dim());
        for (dst, src) in data.iter_mut().zip(raw.iter()) {
            *dst = to_intensity(src)?;
        }
        Self::new(data)
    }

    /// 通道个数.
    #[inline]
    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 提取第 `channel` 个通道的三维强度数组. 返回的数组与 `self` 不共享内存.
    ///
    /// `channel` 为 `None` 或越界时返回 [`SegError::InvalidChannel`].
    pub fn channel(&self, channel: Option<usize>) -> SegResult<Array3<f32>> {
        self.channel_view(channel).map(|v| v.to_owned())
    }

    /// 获取第 `channel` 个通道的不可变视图.
    pub fn channel_view(&self, channel: Option<usize>) -> SegResult<ArrayView3<'_, f32>> {
        let n = self.channels();
        match channel {
            Some(c) if c < n => Ok(self.data.index_axis(Axis(0), c)),
            _ => Err(SegError::InvalidChannel(channel, n)),
        }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView4<'_, f32> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    ///
    /// 调用者需自行保证写入的值非负、有限.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut4<'_, f32> {
        self.data.view_mut()
    }
}

#[inline]
fn to_intensity<A: ToPrimitive>(v: &A) -> SegResult<f32> {
    match v.to_f32() {
        Some(f) if f.is_finite() => Ok(f),
        _ => invalid("图像强度无法表示为有限 f32"),
    }
}

/// 直接从原始 CZYX 数组中提取第 `channel` 个通道, 并转换为 `f32`.
///
/// 与 [`CellStack::channel`] 不同, 该函数不会检查整幅图像, 仅转换所选通道.
pub fn select_channel_from_raw<A: ToPrimitive>(
    raw: ArrayView4<A>,
    channel: Option<usize>,
) -> SegResult<Array3<f32>> {
    let n = raw.len_of(Axis(0));
    let c = match channel {
        Some(c) if c < n => c,
        _ => return Err(SegError::InvalidChannel(channel, n)),
    };
    let view = raw.index_axis(Axis(0), c);
    let mut ans = Array3::<f32>::zeros(view.raw_dim());
    for (dst, src) in ans.iter_mut().zip(view.iter()) {
        *dst = to_intensity(src)?;
    }
    Ok(ans)
}
