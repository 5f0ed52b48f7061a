use num_traits::{PrimInt, Unsigned, WrappingAdd, WrappingNeg, WrappingSub};
use std::fmt::{Debug, Display};

/// Unsigned machine integers that can carry a share. Protocol arithmetic runs
/// on `u64` words; this trait moves shares in and out of that representation.
pub trait ShareInt:
    PrimInt
    + Unsigned
    + WrappingAdd
    + WrappingSub
    + WrappingNeg
    + Default
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
    const K: usize;

    fn to_word(self) -> u64;

    /// Keeps the low `K` bits of `value`.
    fn from_word(value: u64) -> Self;
}

impl ShareInt for u32 {
    const K: usize = Self::BITS as usize;

    #[inline(always)]
    fn to_word(self) -> u64 {
        self as u64
    }

    #[inline(always)]
    fn from_word(value: u64) -> Self {
        value as u32
    }
}

impl ShareInt for u64 {
    const K: usize = Self::BITS as usize;

    #[inline(always)]
    fn to_word(self) -> u64 {
        self
    }

    #[inline(always)]
    fn from_word(value: u64) -> Self {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive;

    fn words<T: ShareInt>(values: &[T]) -> Vec<u64> {
        values.iter().map(|v| v.to_word()).collect()
    }

    #[test]
    fn test_word_conversion_through_references() {
        assert_eq!(words(&[7u32, u32::MAX]), vec![7, u32::MAX as u64]);
        assert_eq!(words(&[u64::MAX]), vec![u64::MAX]);
        // the num-traits conversion is still reachable and distinct
        assert_eq!(ToPrimitive::to_u64(&5u32), Some(5));
        assert_eq!(u32::from_word((1 << 32) + 9), 9);
        assert_eq!(u64::from_word(u64::MAX), u64::MAX);
    }
}
