//! 推断结果的持久化.
//!
//! 标签图以 `.npy` 格式保存在 `{输出目录}/{图像名}-{结构名}.npy`.

use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::organelles::Organelle;
use crate::{LabelMap, StoreError};

/// 指定输出目录的环境变量名.
pub const OUT_DIR_ENV: &str = "INFER_SUBC_OUT_DIR";

/// 图像元信息. 目前只用于确定结果文件名.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    /// 图像名称, 不含扩展名.
    pub name: String,
}

impl Metadata {
    /// 直接初始化.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 推断结果的存取接口.
pub trait ResultStore {
    /// 读取已保存的结果. 不存在时返回 [`StoreError::Missing`].
    fn import(&self, organelle: Organelle, meta: &Metadata) -> Result<LabelMap, StoreError>;

    /// 保存结果, 返回写入的位置.
    fn export(
        &self,
        labels: &LabelMap,
        organelle: Organelle,
        meta: &Metadata,
    ) -> Result<PathBuf, StoreError>;
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    ans.extend(it);
    Some(ans)
}

/// 获取推断结果的输出目录.
///
/// 1. 若环境变量 `$INFER_SUBC_OUT_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/infer_subc`. 无法确定用户主目录时返回 `None`.
pub fn out_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var(OUT_DIR_ENV) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => home_dataset_dir_with(["infer_subc"]),
    }
}

/// 以 `.npy` 文件保存结果的本地存储.
#[derive(Debug, Clone)]
pub struct NpyStore {
    dir: PathBuf,
}

impl NpyStore {
    /// 以 `dir` 为输出目录. 目录会在首次写入时创建.
    #[inline]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// 以 [`out_dir_from_env_or_home`] 为输出目录.
    #[inline]
    pub fn from_env_or_home() -> Option<Self> {
        out_dir_from_env_or_home().map(Self::new)
    }

    /// 结果文件的完整路径.
    #[inline]
    pub fn path_of(&self, organelle: Organelle, meta: &Metadata) -> PathBuf {
        self.dir.join(format!("{}-{}.npy", meta.name, organelle.name()))
    }
}

impl ResultStore for NpyStore {
    fn import(&self, organelle: Organelle, meta: &Metadata) -> Result<LabelMap, StoreError> {
        let path = self.path_of(organelle, meta);
        if !path.is_file() {
            return Err(StoreError::Missing(path));
        }
        let file = File::open(&path)?;
        match Array3::<u16>::read_npy(file) {
            Ok(data) => Ok(LabelMap::new(data)),
            Err(e) => Err(StoreError::Corrupt(path, e)),
        }
    }

    fn export(
        &self,
        labels: &LabelMap,
        organelle: Organelle,
        meta: &Metadata,
    ) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_of(organelle, meta);
        let writer = BufWriter::new(File::create(&path)?);
        match labels.data().write_npy(writer) {
            Ok(()) => Ok(path),
            Err(e) => Err(StoreError::Write(path, e)),
        }
    }
}
