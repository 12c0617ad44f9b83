#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从线性解混后的多通道三维显微图像 (CZYX) 推断亚细胞结构
//! (细胞核, 细胞质, 脂滴) 的连通区域标签.
//!
//! 每种亚细胞结构的推断都是一条确定的流水线:
//! 提取通道 -> 归一化与平滑 -> 阈值化 -> 孔洞填充与小目标移除 -> 连通区域标记.
//!
//! # 注意
//!
//! 1. 该 crate 仅实现少量固定的、针对特定结构调过参的流程,
//!   并不是通用的图像处理库.
//! 2. 所有组件都是作用于数组的无状态函数, 不会就地修改输入.
//!   非法输入以 [`SegError`] 的形式同步返回, 不会返回不完整的结果.
//!
//! # 开发计划
//!
//! ### 通道提取与信号预处理 ✅
//!
//! 最小-最大归一化到 \[0, 1\], 再逐切片进行中值滤波与高斯平滑.
//!
//! 实现位于 `cell-berry/src/data/stack.rs` 与 `cell-berry/src/conditioning.rs`.
//!
//! ### 阈值引擎 ✅
//!
//! Otsu, 三分类 multi-Otsu (低/高), 对数空间 Li, Li, triangle, Sauvola,
//! 均值, 中位数, triangle-中位数平均. 阈值经过系数调整后被限制在 \[min, max\] 内.
//!
//! 实现位于 `cell-berry/src/threshold`.
//!
//! ### 二值形态学 ✅
//!
//! 1. 孔洞填充 (闭区间 `[hole_min, hole_max]`) 与小目标移除 (`size < min_size`);
//! 2. 逐切片 (4-邻接) 与三维 (6-邻接, 钻石型) 两种模式;
//! 3. `u16` 连通区域标记, 超过 65535 个区域时报错;
//! 4. 单次膨胀/腐蚀与异或.
//!
//! 实现位于 `cell-berry/src/morph`.
//!
//! ### 亚细胞结构流程 ✅
//!
//! 细胞核 (从荧光通道或从细胞质掩膜推断), 细胞质 (胞体减去细胞核), 脂滴.
//! 每个流程都有固定参数版本, 以及 "读取或重新计算" 的缓存包装.
//!
//! 实现位于 `cell-berry/src/organelles`.
//!
//! ### 结果持久化 ✅
//!
//! 以 `.npy` 格式存储标签. 已保存的结果会被无条件信任 (不检查参数是否变化).
//!
//! 实现位于 `cell-berry/src/store.rs`.

/// 二维索引 (高, 宽).
pub type Idx2d = (usize, usize);

/// 三维索引 (z, 高, 宽).
pub type Idx3d = (usize, usize, usize);

type Area2d = Vec<Idx2d>;
type Areas2d = Vec<Area2d>;

type Area3d = Vec<Idx3d>;
type Areas3d = Vec<Area3d>;

/// 多通道图像, 二值掩膜与标签的基础数据结构.
mod data;

pub use data::{
    select_channel_from_raw, CellStack, LabelMap, Mask, MaskSlice, MaskSliceMut, VolumeAttr,
};

mod error;

pub use error::{SegError, SegResult, StoreError};

pub mod consts;

pub mod conditioning;

pub mod threshold;

pub mod morph;

pub mod organelles;

pub mod store;

pub mod prelude;
