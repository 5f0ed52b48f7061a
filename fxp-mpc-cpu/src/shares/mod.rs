pub mod field;
pub mod int_ring;
pub mod ring;

pub use field::FieldConfig;
pub use int_ring::ShareInt;
pub use ring::RingConfig;

/// All-ones mask of `bits` bits, saturating at 128.
#[inline]
pub fn mask(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

/// Smallest `b` with `2^b >= x`.
#[inline]
pub fn ceil_log2(x: u128) -> u32 {
    if x <= 1 {
        0
    } else {
        128 - (x - 1).leading_zeros()
    }
}

/// Floor division rounding towards negative infinity.
#[inline]
pub fn div_floor(a: i128, b: i128) -> i128 {
    a.div_euclid(b) - if b < 0 && a.rem_euclid(b) != 0 { 1 } else { 0 }
}
