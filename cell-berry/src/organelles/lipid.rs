use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{get_or_infer, infer_and_export, Organelle};
use crate::conditioning::scale_and_smooth;
use crate::consts::channel::LIPID_CH;
use crate::morph::{fill_and_filter_linear_size, label_uint16, FillFilter, ProcessMode};
use crate::store::{Metadata, ResultStore};
use crate::threshold::{apply_threshold, ThresholdMethod, ThresholdSpec};
use crate::{CellStack, LabelMap, SegResult, VolumeAttr};

/// 脂滴推断参数.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LipidParams {
    /// 脂滴通道.
    pub channel: Option<usize>,

    /// 中值滤波窗口边长.
    pub median_size: usize,

    /// 高斯平滑标准差.
    pub gauss_sigma: f64,

    /// 阈值参数.
    pub threshold: ThresholdSpec,

    /// 孔洞填充与小目标移除参数.
    pub fill_filter: FillFilter,
}

impl LipidParams {
    /// 固定参数.
    pub const FIXED: Self = Self {
        channel: Some(LIPID_CH),
        median_size: 2,
        gauss_sigma: 1.34,
        threshold: ThresholdSpec::new(ThresholdMethod::Otsu, 0.99, 0.5, 1.0),
        fill_filter: FillFilter::new(0.0, 2.5, 4.0, ProcessMode::PerSlice),
    };
}

impl Default for LipidParams {
    #[inline]
    fn default() -> Self {
        Self::FIXED
    }
}

/// 推断脂滴标签.
pub fn infer_lipid(stack: &CellStack, params: &LipidParams) -> SegResult<LabelMap> {
    let lipid = stack.channel_view(params.channel)?;
    let lipid = scale_and_smooth(lipid, params.median_size, params.gauss_sigma)?;
    let mask = apply_threshold(lipid.view(), &params.threshold)?;
    debug!("脂滴阈值化后前景体素: {}", mask.count());
    let mask = fill_and_filter_linear_size(&mask, &params.fill_filter)?;
    label_uint16(&mask, ProcessMode::Volumetric)
}

/// 使用 [`LipidParams::FIXED`] 推断脂滴标签.
#[inline]
pub fn fixed_infer_lipid(stack: &CellStack) -> SegResult<LabelMap> {
    infer_lipid(stack, &LipidParams::FIXED)
}

/// 以固定参数推断脂滴并写入 `store`.
pub fn infer_and_export_lipid<S: ResultStore + ?Sized>(
    stack: &CellStack,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    infer_and_export(Organelle::Lipid, meta, store, || fixed_infer_lipid(stack))
}

/// 读取已保存的脂滴标签, 不存在时以固定参数推断并写入.
pub fn get_lipid<S: ResultStore + ?Sized>(
    stack: &CellStack,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    get_or_infer(Organelle::Lipid, meta, store, stack.shape(), || {
        fixed_infer_lipid(stack)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NpyStore;
    use crate::SegError;
    use ndarray::{s, Array4};

    /// 8 通道图像, 脂滴通道中有两个 8×8 的亮斑和一个 2×2 的噪点.
    fn lipid_stack() -> CellStack {
        let mut raw = Array4::<f32>::zeros((8, 4, 32, 32));
        let mut ch = raw.slice_mut(s![LIPID_CH, .., .., ..]);
        ch.slice_mut(s![.., 4..12, 4..12]).fill(120.0);
        ch.slice_mut(s![.., 18..26, 18..26]).fill(120.0);
        ch.slice_mut(s![1, 26..28, 4..6]).fill(120.0);
        CellStack::new(raw).unwrap()
    }

    #[test]
    fn test_fixed_lipid() {
        let stack = lipid_stack();
        let labels = fixed_infer_lipid(&stack).unwrap();
        assert_eq!(labels.len(), 2);
        let (a, b) = (labels[(2, 8, 8)], labels[(2, 22, 22)]);
        assert!(a != 0 && b != 0 && a != b);
        // 同一脂滴跨切片连通.
        assert_eq!(labels[(0, 8, 8)], a);
        assert_eq!(labels[(1, 27, 5)], 0);
    }

    #[test]
    fn test_lipid_channel_out_of_range() {
        let stack = CellStack::new(Array4::zeros((3, 2, 8, 8))).unwrap();
        assert!(matches!(
            fixed_infer_lipid(&stack),
            Err(SegError::InvalidChannel(Some(LIPID_CH), 3))
        ));
    }

    #[test]
    fn test_get_lipid_exports() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path().join("lipid"));
        let meta = Metadata::new("cell");
        let stack = lipid_stack();

        let labels = get_lipid(&stack, &meta, &store).unwrap();
        let path = store.path_of(Organelle::Lipid, &meta);
        assert!(path.is_file());
        assert_eq!(store.import(Organelle::Lipid, &meta).unwrap(), labels);
        assert_eq!(infer_and_export_lipid(&stack, &meta, &store).unwrap(), labels);
    }
}
