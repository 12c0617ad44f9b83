//! 通用常量.

/// 线性解混后的多通道图像中, 各荧光通道的默认索引.
pub mod channel {
    /// 细胞核通道.
    pub const NUC_CH: usize = 0;

    /// 溶酶体通道.
    pub const LYSO_CH: usize = 1;

    /// 线粒体通道.
    pub const MITO_CH: usize = 2;

    /// 高尔基体通道.
    pub const GOLGI_CH: usize = 3;

    /// 过氧化物酶体通道.
    pub const PEROX_CH: usize = 4;

    /// 内质网通道.
    pub const ER_CH: usize = 5;

    /// 脂滴通道.
    pub const LIPID_CH: usize = 6;

    /// 残余信号通道.
    pub const RESIDUAL_CH: usize = 7;
}

/// 标签图中背景的值.
pub const LABEL_BACKGROUND: u16 = 0;

/// 基于直方图的阈值方法使用的分箱个数.
pub const HISTOGRAM_BINS: usize = 256;

/// Sauvola 局部阈值的窗口边长.
pub const SAUVOLA_WINDOW: usize = 15;

/// Sauvola 局部阈值的 `k` 参数.
pub const SAUVOLA_K: f64 = 0.2;

/// 高斯核截断位置 (以 sigma 为单位).
pub const GAUSSIAN_TRUNCATE: f64 = 3.0;

/// Li 迭代的最大轮数.
pub const LI_MAX_ROUNDS: usize = 10_000;
