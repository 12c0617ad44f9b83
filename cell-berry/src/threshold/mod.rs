//! 阈值引擎. 将预处理后的强度数组转化为二值掩膜.
//!
//! 所有方法都遵循同一规则: 原始阈值乘以系数后被限制在 \[min, max\] 内,
//! 强度不低于该阈值的体素为前景.

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView3, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{invalid, SegError, SegResult};
use crate::Mask;

mod global;
mod histogram;
mod local;
mod log_li;

use global::{
    threshold_ave_tri_med, threshold_li, threshold_mean, threshold_median, threshold_multiotsu,
    threshold_otsu, threshold_triangle,
};
pub use local::{sauvola_surface, threshold_sauvola};
use log_li::log_li_threshold;

/// 阈值方法.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ThresholdMethod {
    /// Otsu.
    Otsu,

    /// 三分类 multi-Otsu 的低阈值.
    MultiOtsuLow,

    /// 三分类 multi-Otsu 的高阈值.
    MultiOtsuHigh,

    /// 拉伸对数空间中的 Li. 系数与上下界也作用于该空间.
    LogLi,

    /// Li 最小交叉熵.
    Li,

    /// Triangle.
    Triangle,

    /// Sauvola 局部阈值.
    Sauvola,

    /// 均值.
    Mean,

    /// 中位数.
    Median,

    /// Triangle 与中位数的平均.
    AveTriMed,
}

impl ThresholdMethod {
    /// 是否为逐体素的局部阈值?
    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Sauvola)
    }

    /// 方法的规范名称.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Otsu => "otsu",
            Self::MultiOtsuLow => "multi_otsu",
            Self::MultiOtsuHigh => "multi_otsu_high",
            Self::LogLi => "log_li",
            Self::Li => "li",
            Self::Triangle => "triangle",
            Self::Sauvola => "sauvola",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::AveTriMed => "ave_tri_med",
        }
    }
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ThresholdMethod {
    type Err = SegError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "otsu" => Self::Otsu,
            "multi_otsu" | "multiotsu" => Self::MultiOtsuLow,
            "multi_otsu_high" => Self::MultiOtsuHigh,
            "log_li" => Self::LogLi,
            "li" | "cross_entropy" => Self::Li,
            "tri" | "triangle" => Self::Triangle,
            "sauvola" => Self::Sauvola,
            "mean" => Self::Mean,
            "med" | "median" => Self::Median,
            "ave" | "ave_tri_med" => Self::AveTriMed,
            other => return Err(SegError::UnsupportedMethod(other.to_owned())),
        })
    }
}

/// 阈值参数: 方法, 调整系数与绝对上下界.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThresholdSpec {
    /// 阈值方法.
    pub method: ThresholdMethod,

    /// 调整系数, 必须为正.
    pub factor: f64,

    /// 阈值下界.
    pub min: f64,

    /// 阈值上界.
    pub max: f64,
}

impl ThresholdSpec {
    /// 直接初始化, 不检查参数.
    #[inline]
    pub const fn new(method: ThresholdMethod, factor: f64, min: f64, max: f64) -> Self {
        Self {
            method,
            factor,
            min,
            max,
        }
    }

    /// 检查 `factor > 0`, `min <= max` 且均为有限值.
    pub fn validate(&self) -> SegResult<()> {
        if !(self.factor.is_finite() && self.factor > 0.0) {
            return invalid(format!("阈值系数必须为正, 实际为 {}", self.factor));
        }
        if !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max) {
            return invalid(format!("阈值上下界非法: [{}, {}]", self.min, self.max));
        }
        Ok(())
    }

    /// 调整并限制原始阈值.
    #[inline]
    pub fn clamp(&self, raw: f64) -> f64 {
        (raw * self.factor).clamp(self.min, self.max)
    }
}

/// 收集非空数组的全部强度.
fn collect_values(img: ArrayView3<f32>) -> SegResult<Vec<f64>> {
    if img.is_empty() {
        return invalid("无法对空数组计算阈值");
    }
    Ok(img.iter().map(|v| *v as f64).collect())
}

/// 计算全局方法的原始阈值 (未经系数调整与限制).
///
/// 对 [`ThresholdMethod::LogLi`], 返回值已映射回原始强度.
/// 局部方法没有全局阈值, 返回 `Err`.
pub fn global_threshold(img: ArrayView3<f32>, method: ThresholdMethod) -> SegResult<f64> {
    let values = collect_values(img)?;
    raw_threshold(&values, method)
}

fn raw_threshold(values: &[f64], method: ThresholdMethod) -> SegResult<f64> {
    use ThresholdMethod::*;

    Ok(match method {
        Otsu => threshold_otsu(values),
        MultiOtsuLow => threshold_multiotsu(values)?.0,
        MultiOtsuHigh => threshold_multiotsu(values)?.1,
        LogLi => {
            let (t, transform) = log_li_threshold(values);
            transform.inverse(t)
        }
        Li => threshold_li(values),
        Triangle => threshold_triangle(values),
        Mean => threshold_mean(values),
        Median => threshold_median(values),
        AveTriMed => threshold_ave_tri_med(values),
        Sauvola => return invalid("局部阈值方法没有单一的全局阈值"),
    })
}

/// 计算全局方法经过系数调整与上下界限制后的最终阈值.
///
/// 对 [`ThresholdMethod::LogLi`], 调整与限制在拉伸对数空间中进行, 然后映射回原始强度.
pub fn effective_threshold(img: ArrayView3<f32>, spec: &ThresholdSpec) -> SegResult<f64> {
    spec.validate()?;
    let values = collect_values(img)?;
    match spec.method {
        ThresholdMethod::LogLi => {
            let (t, transform) = log_li_threshold(&values);
            Ok(transform.inverse(spec.clamp(t)))
        }
        method => Ok(spec.clamp(raw_threshold(&values, method)?)),
    }
}

/// 按照 `spec` 对 `img` 进行阈值化.
pub fn apply_threshold(img: ArrayView3<f32>, spec: &ThresholdSpec) -> SegResult<Mask> {
    if spec.method.is_local() {
        spec.validate()?;
        if img.is_empty() {
            return invalid("无法对空数组计算阈值");
        }
        let surface = threshold_sauvola(img);
        let mask = Zip::from(&img)
            .and(&surface)
            .map_collect(|v, t| *v as f64 >= spec.clamp(*t));
        return Ok(Mask::new(mask));
    }

    let t = effective_threshold(img, spec)?;
    log::debug!("{} 阈值: {t}", spec.method);
    Ok(Mask::new(img.mapv(|v| v as f64 >= t)))
}

/// 对数空间 Li 阈值化的快捷方式.
#[inline]
pub fn apply_log_li_threshold(
    img: ArrayView3<f32>,
    factor: f64,
    min: f64,
    max: f64,
) -> SegResult<Mask> {
    apply_threshold(
        img,
        &ThresholdSpec::new(ThresholdMethod::LogLi, factor, min, max),
    )
}
