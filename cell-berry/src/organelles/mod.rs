//! 亚细胞结构的推断流程.
//!
//! 每个流程都由一个参数结构体驱动, 其 `FIXED` 常量为调过参的固定版本.
//! `infer_and_export_*` 总是重新计算并保存结果;
//! `get_*` 优先读取已保存的结果, 仅在结果不存在时重新计算.
//!
//! # 注意
//!
//! 已保存的结果会被无条件信任: 即使参数或输入图像发生了变化,
//! 只要形状一致, `get_*` 就会直接返回旧结果.

use std::fmt;
use std::time::Instant;

use log::{debug, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::store::{Metadata, ResultStore};
use crate::{Idx3d, LabelMap, SegResult, StoreError, VolumeAttr};

mod cytosol;
mod lipid;
mod nuclei;

pub use cytosol::{fixed_infer_cytosol, get_cytosol, infer_and_export_cytosol, infer_cytosol};
pub use lipid::{fixed_infer_lipid, get_lipid, infer_and_export_lipid, infer_lipid, LipidParams};
pub use nuclei::{
    fixed_infer_nuclei_fromcytoplasm, fixed_infer_nuclei_fromlabel, get_nuclei,
    infer_and_export_nuclei, infer_nuclei_fromcytoplasm, infer_nuclei_fromlabel,
    NucleiFromCytoplasmParams, NucleiParams,
};

/// 亚细胞结构种类.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Organelle {
    /// 细胞核.
    Nuclei,

    /// 细胞质 (胞体除去细胞核).
    Cytosol,

    /// 脂滴.
    Lipid,
}

impl Organelle {
    /// 结构名, 用于结果文件名.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nuclei => "nuclei",
            Self::Cytosol => "cytosol",
            Self::Lipid => "lipid",
        }
    }
}

impl fmt::Display for Organelle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 运行 `infer` 并将结果写入 `store`. 写入失败时返回 `Err`.
pub fn infer_and_export<S, F>(
    organelle: Organelle,
    meta: &Metadata,
    store: &S,
    infer: F,
) -> SegResult<LabelMap>
where
    S: ResultStore + ?Sized,
    F: FnOnce() -> SegResult<LabelMap>,
{
    let labels = infer()?;
    let path = store.export(&labels, organelle, meta)?;
    info!("推断得到 {} 个 {organelle}, 写入 {}", labels.len(), path.display());
    Ok(labels)
}

/// 读取已保存的结果; 若不存在或形状与 `shape` 不一致, 则运行 `infer` 并写入.
///
/// 除 [`StoreError::Missing`] 以外的读取错误会直接返回.
pub fn get_or_infer<S, F>(
    organelle: Organelle,
    meta: &Metadata,
    store: &S,
    shape: Idx3d,
    infer: F,
) -> SegResult<LabelMap>
where
    S: ResultStore + ?Sized,
    F: FnOnce() -> SegResult<LabelMap>,
{
    match store.import(organelle, meta) {
        Ok(labels) if labels.shape() == shape => {
            debug!("读取已保存的 {organelle}: {}", meta.name);
            return Ok(labels);
        }
        Ok(labels) => warn!(
            "已保存的 {organelle} 形状 {:?} 与输入 {shape:?} 不一致, 重新计算",
            labels.shape()
        ),
        Err(StoreError::Missing(path)) => debug!("未找到 {}", path.display()),
        Err(e) => return Err(e.into()),
    }

    info!("开始推断 {organelle}: {}", meta.name);
    let start = Instant::now();
    let labels = infer_and_export(organelle, meta, store, infer)?;
    info!(
        "推断 {organelle} 耗时 {:.2} 秒",
        start.elapsed().as_secs_f64()
    );
    Ok(labels)
}
