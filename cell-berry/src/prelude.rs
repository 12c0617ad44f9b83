//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::{CellStack, LabelMap, Mask, MaskSlice, MaskSliceMut, VolumeAttr};
pub use crate::{SegError, SegResult, StoreError};

pub use crate::consts::channel::*;
pub use crate::consts::LABEL_BACKGROUND;

pub use crate::conditioning::{min_max_intensity_normalization, scale_and_smooth};

pub use crate::threshold::{apply_threshold, global_threshold, ThresholdMethod, ThresholdSpec};

pub use crate::morph::{fill_and_filter_linear_size, label_uint16, FillFilter, ProcessMode};

pub use crate::organelles::{
    fixed_infer_cytosol, fixed_infer_lipid, fixed_infer_nuclei_fromcytoplasm,
    fixed_infer_nuclei_fromlabel, get_cytosol, get_lipid, get_nuclei, infer_and_export_cytosol,
    infer_and_export_lipid, infer_and_export_nuclei, Organelle,
};

pub use crate::store::{home_dataset_dir_with, Metadata, NpyStore, ResultStore};
