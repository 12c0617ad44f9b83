use super::{get_or_infer, infer_and_export, Organelle};
use crate::morph::{binary_erosion, label_uint16, logical_xor, ProcessMode};
use crate::store::{Metadata, ResultStore};
use crate::{LabelMap, Mask, SegResult, VolumeAttr};

/// 从胞体中除去细胞核, 得到细胞质掩膜.
///
/// `erode` 为真时先对细胞核腐蚀一次, 使细胞核表层并入细胞质.
/// 两个掩膜形状不一致时返回 `Err`.
pub fn infer_cytosol(nuclei: &Mask, soma: &Mask, erode: bool) -> SegResult<Mask> {
    if erode {
        logical_xor(soma, &binary_erosion(nuclei))
    } else {
        logical_xor(soma, nuclei)
    }
}

/// 腐蚀细胞核后推断细胞质.
#[inline]
pub fn fixed_infer_cytosol(nuclei: &Mask, soma: &Mask) -> SegResult<Mask> {
    infer_cytosol(nuclei, soma, true)
}

fn fixed_infer_cytosol_labels(nuclei: &LabelMap, soma: &Mask) -> SegResult<LabelMap> {
    let cytosol = fixed_infer_cytosol(&nuclei.to_mask(), soma)?;
    label_uint16(&cytosol, ProcessMode::Volumetric)
}

/// 推断细胞质并写入 `store`.
pub fn infer_and_export_cytosol<S: ResultStore + ?Sized>(
    nuclei: &LabelMap,
    soma: &Mask,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    infer_and_export(Organelle::Cytosol, meta, store, || {
        fixed_infer_cytosol_labels(nuclei, soma)
    })
}

/// 读取已保存的细胞质标签, 不存在时重新推断并写入.
pub fn get_cytosol<S: ResultStore + ?Sized>(
    nuclei: &LabelMap,
    soma: &Mask,
    meta: &Metadata,
    store: &S,
) -> SegResult<LabelMap> {
    get_or_infer(Organelle::Cytosol, meta, store, soma.shape(), || {
        fixed_infer_cytosol_labels(nuclei, soma)
    })
}
