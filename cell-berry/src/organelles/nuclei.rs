use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{get_or_infer, infer_and_export, Organelle};
use crate::conditioning::scale_and_smooth;
use crate::consts::channel::NUC_CH;
use crate::morph::{
    binary_dilation, binary_erosion, fill_and_filter_linear_size, label_uint16, logical_xor,
    FillFilter, ProcessMode,
};
use crate::store::{Metadata, ResultStore};
use crate::threshold::{apply_threshold, ThresholdMethod, ThresholdSpec};
use crate::{CellStack, LabelMap, Mask, SegResult, VolumeAttr};

/// 从细胞核荧光通道推断细胞核的参数.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleiParams {
    /// 细胞核通道.
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

impl NucleiParams {
    /// 固定参数.
    pub const FIXED: Self = Self {
        channel: Some(NUC_CH),
        median_size: 4,
        gauss_sigma: 1.34,
        threshold: ThresholdSpec::new(ThresholdMethod::LogLi, 0.9, 0.1, 1.0),
        fill_filter: FillFilter::new(0.0, 25.0, 15.0, ProcessMode::Volumetric),
    };
}

impl Default for NucleiParams {
    #[inline]
    fn default() -> Self {
        Self::FIXED
    }
}

/// 从细胞核荧光通道推断细胞核标签.
pub fn infer_nuclei_fromlabel(stack: &CellStack, params: &NucleiParams) -> SegResult<LabelMap> {
    let nuclei = stack.channel_view(params.channel)?;
    let nuclei = scale_and_smooth(nuclei, params.median_size, params.gauss_sigma)?;
    let mask = apply_threshold(nuclei.view(), &params.threshold)?;
    debug!("细胞核阈值化后前景体素: {}", mask.count());
    let mask = fill_and_filter_linear_size(&mask, &params.fill_filter)?;
    label_uint16(&mask, ProcessMode::Volumetric)
}

/// 使用 [`NucleiParams::FIXED`] 推断细胞核标签.
#[inline]
pub fn fixed_infer_nuclei_fromlabel(stack: &CellStack) -> SegResult<LabelMap> {
    infer_nuclei_fromlabel(stack, &NucleiParams::FIXED)
}

/// 从细胞质掩膜推断细胞核的参数. 宽度均为线性尺寸.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NucleiFromCytoplasmParams {
    /// 细胞核 (即细胞质中的孔洞) 的最小宽度.
    pub nuc_min_width: f64,

    /// 细胞核的最大宽度.
    pub nuc_max_width: f64,

    /// 移除膨胀/腐蚀伪影时保留目标的最小宽度.
    pub small_obj_width: f64,

    /// 作用方式.
    pub mode: ProcessMode,
}

impl NucleiFromCytoplasmParams {
    /// 固定参数.
    pub const FIXED: Self = Self {
        nuc_min_width: 0.0,
        nuc_max_width: 500.0,
        small_obj_width: 20.0,
        mode: ProcessMode::Volumetric,
    };
}

impl Default for NucleiFromCytoplasmParams {
    #[inline]
    fn default() -> Self {
        Self::FIXED
    }
}

/// 将细胞质掩膜中被包围的孔洞视为细胞核, 推断细胞核标签.
///
/// 依次进行: 膨胀, 填充孔洞, 腐蚀, 与原掩膜异或, 移除小目标, 标记.
pub fn infer_nuclei_fromcytoplasm(
    cytoplasm: &Mask,
    params: &NucleiFromCytoplasmParams,
) -> SegResult<LabelMap> {
    let dilated = binary_dilation(cytoplasm);
    let filled = fill_and_filter_linear_size(
        &dilated,
        &FillFilter::new(params.nuc_min_width, params.nuc_max_width, 0.0, params.mode),
    )?;
    let eroded = binary_erosion(&filled);
    let nuclei = logical_xor(cytoplasm, &eroded)?;
    let nuclei = fill_and_filter_linear_size(
        &nuclei,
        &FillFilter::new(0.0, 0.0, params.small_obj_width, params.mode),
    )?;
    label_uint16(&nuclei, ProcessMode::Volumetric)
}

/// 使用 [`NucleiFromCytoplasmParams::FIXED`] 从细胞质掩膜推断细胞核标签.
#[inline]
pub fn fixed_infer_nuclei_fromcytoplasm(cytoplasm: &Mask) -> SegResult<LabelMap> {
    infer_nuclei_fromcytoplasm(cytoplasm, &NucleiFromCytoplasmParams::FIXED)
}

/// 以固定参数推断细胞核并写入 `store`.
pub fn infer_and_export_nuclei<S: ResultStore + ?Sized>(
    stack: &CellStack,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    infer_and_export(Organelle::Nuclei, meta, store, || {
        fixed_infer_nuclei_fromlabel(stack)
    })
}

/// 读取已保存的细胞核标签, 不存在时以固定参数推断并写入.
pub fn get_nuclei<S: ResultStore + ?Sized>(
    stack: &CellStack,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    get_or_infer(Organelle::Nuclei, meta, store, stack.shape(), || {
        fixed_infer_nuclei_fromlabel(stack)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NpyStore;
    use crate::{SegError, StoreError};
    use ndarray::{s, Array3, Array4};

    /// 单通道图像, 含两个 16×20×20 的亮块.
    fn two_nuclei_stack() -> CellStack {
        let mut raw = Array4::<f32>::from_elem((1, 20, 64, 64), 10.0);
        raw.slice_mut(s![0, 2..18, 22..42, 4..24]).fill(200.0);
        raw.slice_mut(s![0, 2..18, 22..42, 40..60]).fill(180.0);
        CellStack::new(raw).unwrap()
    }

    #[test]
    fn test_fixed_from_label() {
        let stack = two_nuclei_stack();
        let labels = fixed_infer_nuclei_fromlabel(&stack).unwrap();
        assert_eq!(labels.len(), 2);
        let (a, b) = (labels[(10, 32, 14)], labels[(10, 32, 50)]);
        assert!(a != 0 && b != 0 && a != b);
        assert_eq!(labels[(10, 2, 2)], 0);
        assert_eq!(labels[(0, 32, 14)], 0);
    }

    #[test]
    fn test_from_label_invalid_channel() {
        let stack = two_nuclei_stack();
        let params = NucleiParams {
            channel: None,
            ..NucleiParams::FIXED
        };
        assert!(matches!(
            infer_nuclei_fromlabel(&stack, &params),
            Err(SegError::InvalidChannel(None, 1))
        ));
        let params = NucleiParams {
            channel: Some(1),
            ..NucleiParams::FIXED
        };
        assert!(infer_nuclei_fromlabel(&stack, &params).is_err());
    }

    #[test]
    fn test_from_cytoplasm_round_trip() {
        // 20³ 的细胞质中央挖去 6³ 的细胞核.
        let cyto = Mask::new(Array3::from_shape_fn((24, 24, 24), |(z, h, w)| {
            let inside = |i: usize| (2..22).contains(&i);
            let cavity = |i: usize| (9..15).contains(&i);
            inside(z) && inside(h) && inside(w) && !(cavity(z) && cavity(h) && cavity(w))
        }));
        let params = NucleiFromCytoplasmParams {
            nuc_min_width: 0.0,
            nuc_max_width: 10.0,
            small_obj_width: 2.0,
            mode: ProcessMode::Volumetric,
        };
        let labels = infer_nuclei_fromcytoplasm(&cyto, &params).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.count(1), 216);
        assert!(labels[(9, 9, 9)] == 1 && labels[(14, 14, 14)] == 1);
        assert_eq!(labels[(8, 9, 9)], 0);

        // 固定参数要求细胞核至少 20³ 个体素, 6³ 的孔洞被移除.
        assert!(fixed_infer_nuclei_fromcytoplasm(&cyto).unwrap().is_empty());
    }

    #[test]
    fn test_fixed_from_cytoplasm() {
        // 厚度为 2 的细胞质外壳包围 21³ 的细胞核.
        let cyto = Mask::new(Array3::from_shape_fn((29, 29, 29), |(z, h, w)| {
            let inside = |i: usize| (2..27).contains(&i);
            let cavity = |i: usize| (4..25).contains(&i);
            inside(z) && inside(h) && inside(w) && !(cavity(z) && cavity(h) && cavity(w))
        }));
        let labels = fixed_infer_nuclei_fromcytoplasm(&cyto).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.count(1), 21 * 21 * 21);
        assert_eq!(labels[(14, 14, 14)], 1);
        assert_eq!(labels[(3, 14, 14)], 0);
    }

    #[test]
    fn test_get_nuclei_corrupt_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path());
        let meta = Metadata::new("broken");
        std::fs::write(store.path_of(Organelle::Nuclei, &meta), b"not an npy file").unwrap();

        // 损坏的结果不会被静默地重新计算覆盖.
        let stack = two_nuclei_stack();
        assert!(matches!(
            get_nuclei(&stack, &meta, &store),
            Err(SegError::Store(StoreError::Corrupt(..)))
        ));
        assert_eq!(
            std::fs::read(store.path_of(Organelle::Nuclei, &meta)).unwrap(),
            b"not an npy file"
        );
    }

    #[test]
    fn test_get_nuclei_trusts_stale_result() {
        let _ = simple_logger::init_with_level(log::Level::Debug);
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path());
        let meta = Metadata::new("two_nuclei");
        let mut stack = two_nuclei_stack();

        let first = get_nuclei(&stack, &meta, &store).unwrap();
        assert_eq!(first, infer_and_export_nuclei(&stack, &meta, &store).unwrap());
        assert!(store.path_of(Organelle::Nuclei, &meta).is_file());

        // 输入变化后仍然返回旧结果.
        stack.data_mut().slice_mut(s![0, .., .., 32..]).fill(10.0);
        let second = get_nuclei(&stack, &meta, &store).unwrap();
        assert_eq!(second, first);
        assert_eq!(second.len(), 2);

        // 强制重新计算.
        let fresh = infer_and_export_nuclei(&stack, &meta, &store).unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(get_nuclei(&stack, &meta, &store).unwrap(), fresh);
    }

    #[test]
    fn test_get_nuclei_shape_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = NpyStore::new(dir.path());
        let meta = Metadata::new("reshaped");
        let wrong = LabelMap::new(Array3::zeros((1, 2, 3)));
        store.export(&wrong, Organelle::Nuclei, &meta).unwrap();

        let stack = two_nuclei_stack();
        let labels = get_nuclei(&stack, &meta, &store).unwrap();
        assert_eq!(labels.shape(), stack.shape());
        assert_eq!(store.import(Organelle::Nuclei, &meta).unwrap(), labels);
    }
}
