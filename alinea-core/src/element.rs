//! Element types the engine computes with

use num_traits::Num;
use std::fmt::{Debug, Display};

/// Numeric element of a vector or matrix
///
/// Any `Copy` numeric type with the four basic operations qualifies:
/// integers compute exactly, floats follow IEEE rounding of the naive
/// summation order (products are always accumulated in increasing inner
/// index).
pub trait Element: Num + Copy + PartialEq + Default + Debug + Display + 'static {
    /// `0 - self`, defined for unsigned types too
    #[inline]
    fn negate(self) -> Self {
        Self::zero() - self
    }
}

impl<T> Element for T where T: Num + Copy + PartialEq + Default + Debug + Display + 'static {}
