//! 二维水平掩膜切片的操作.

mod core;

pub use core::{MaskSlice, MaskSliceMut};
