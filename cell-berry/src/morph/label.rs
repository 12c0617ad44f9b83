use ndarray::{Array3, Axis};

use super::ProcessMode;
use crate::error::{SegError, SegResult};
use crate::{LabelMap, Mask, VolumeAttr};

/// 为每个前景连通区域分配唯一的 `u16` 标签.
///
/// 标签按区域在行优先序 (z, 高, 宽) 中首次出现的位置从 1 开始递增.
/// 逐切片模式下使用 4-邻接, 计数器跨切片延续, 因此标签全局唯一.
/// 区域个数超过 65535 时返回 [`SegError::LabelOverflow`].
pub fn label_uint16(mask: &Mask, mode: ProcessMode) -> SegResult<LabelMap> {
    let mut data = Array3::<u16>::zeros(mask.shape());
    let count = match mode {
        ProcessMode::Volumetric => {
            let areas = mask.areas(true);
            let total = areas.len();
            check_overflow(total)?;
            for (i, area) in areas.into_iter().enumerate() {
                let label = (i + 1) as u16;
                area.into_iter().for_each(|pos| data[pos] = label);
            }
            total
        }
        ProcessMode::PerSlice => {
            let per_slice: Vec<_> = mask.slice_iter().map(|s| s.areas(true)).collect();
            let total = per_slice.iter().map(Vec::len).sum();
            check_overflow(total)?;
            let mut next = 0u16;
            for (areas, mut plane) in per_slice.into_iter().zip(data.axis_iter_mut(Axis(0))) {
                for area in areas {
                    next += 1;
                    area.into_iter().for_each(|pos| plane[pos] = next);
                }
            }
            total
        }
    };
    log::debug!("{mode}: 共标记 {count} 个连通区域");
    Ok(LabelMap::new(data))
}

#[inline]
fn check_overflow(count: usize) -> SegResult<()> {
    if count > u16::MAX as usize {
        return Err(SegError::LabelOverflow(count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn two_blobs() -> Mask {
        let mut m = Mask::empty((3, 6, 6));
        // 跨越两个切片的块.
        m.fill_batch([(0, 1, 1), (0, 1, 2), (1, 1, 1)], true);
        // 单独的点.
        m.fill_batch([(0, 4, 4)], true);
        m
    }

    #[test]
    fn test_label_order() {
        let m = two_blobs();
        let labels = label_uint16(&m, ProcessMode::Volumetric).unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[(0, 1, 1)], 1);
        assert_eq!(labels[(1, 1, 1)], 1);
        assert_eq!(labels[(0, 4, 4)], 2);
        assert_eq!(labels.sizes(), vec![3, 1]);

        // 逐切片模式下, 第二个切片中的像素是新的区域.
        let labels = label_uint16(&m, ProcessMode::PerSlice).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[(0, 1, 2)], 1);
        assert_eq!(labels[(0, 4, 4)], 2);
        assert_eq!(labels[(1, 1, 1)], 3);
    }

    #[test]
    fn test_label_idempotent() {
        let m = two_blobs();
        for mode in [ProcessMode::Volumetric, ProcessMode::PerSlice] {
            let first = label_uint16(&m, mode).unwrap();
            let second = label_uint16(&first.to_mask(), mode).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.to_mask(), m);
        }
        let empty = label_uint16(&Mask::empty((2, 2, 2)), ProcessMode::Volumetric).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_label_overflow() {
        // 6-邻接下互不相连的棋盘格, 共 65536 个区域.
        let m = Mask::new(Array3::from_shape_fn((2, 256, 256), |(z, h, w)| {
            (z + h + w) % 2 == 0
        }));
        assert!(matches!(
            label_uint16(&m, ProcessMode::Volumetric),
            Err(SegError::LabelOverflow(65536))
        ));
        assert!(matches!(
            label_uint16(&m, ProcessMode::PerSlice),
            Err(SegError::LabelOverflow(65536))
        ));

        // 去掉一个点后恰好不溢出.
        let mut m = m;
        m[(0, 0, 0)] = false;
        let labels = label_uint16(&m, ProcessMode::Volumetric).unwrap();
        assert_eq!(labels.len(), u16::MAX as usize);
    }
}
