//! 运行时错误.

use std::io;
use std::path::PathBuf;

use ndarray_npy::{ReadNpyError, WriteNpyError};
use thiserror::Error;

/// 分割流程的运行时错误.
#[derive(Debug, Error)]
pub enum SegError {
    /// 通道索引为空或越界.
    ///
    /// 第一个参数代表请求的通道, 第二个参数代表图像实际的通道个数.
    #[error("无效的通道 {0:?}, 图像共有 {1} 个通道")]
    InvalidChannel(Option<usize>, usize),

    /// 数值参数非法 (负数, 非有限值, 上下界颠倒, 形状不一致等).
    #[error("参数非法: {0}")]
    InvalidParameter(String),

    /// 不支持的阈值方法名.
    #[error("不支持的阈值方法 `{0}`")]
    UnsupportedMethod(String),

    /// 连通区域个数超出 `u16` 标签能表示的范围. 参数为实际区域个数.
    #[error("共有 {0} 个连通区域, 超出 u16 标签上限 {max}", max = u16::MAX)]
    LabelOverflow(usize),

    /// 读写已保存结果时的非预期错误.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 读写已保存结果的错误.
///
/// 其中只有 [`StoreError::Missing`] 是预期内的 "缓存未命中",
/// 其它变体都代表需要调用者关注的问题.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 不存在已保存的结果.
    #[error("未找到已保存的结果 `{}`", .0.display())]
    Missing(PathBuf),

    /// 文件存在, 但无法解析为三维 `u16` 标签.
    #[error("无法解析已保存的结果 `{}`: {1}", .0.display())]
    Corrupt(PathBuf, #[source] ReadNpyError),

    /// 写入结果失败.
    #[error("写入结果 `{}` 失败: {1}", .0.display())]
    Write(PathBuf, #[source] WriteNpyError),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// 分割流程运行时错误.
pub type SegResult<T> = Result<T, SegError>;

/// 构造 [`SegError::InvalidParameter`].
#[inline]
pub(crate) fn invalid<T>(msg: impl Into<String>) -> SegResult<T> {
    Err(SegError::InvalidParameter(msg.into()))
}
