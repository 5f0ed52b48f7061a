use super::{int_ring::ShareInt, mask};
use crate::error::Error;

/// Power-of-two ring `Z_{2^bits}` with `1 <= bits <= 64`. Elements are kept as
/// reduced `u64` words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingConfig {
    bits: u32,
    mask: u64,
}

impl RingConfig {
    pub fn new(bits: usize) -> Result<Self, Error> {
        if !(1..=64).contains(&bits) {
            return Err(Error::InvalidBitLength(bits));
        }
        let bits = bits as u32;
        Ok(Self {
            bits,
            mask: mask(bits) as u64,
        })
    }

    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn mask(&self) -> u64 {
        self.mask
    }

    #[inline]
    pub fn modulus(&self) -> u128 {
        1u128 << self.bits
    }

    #[inline]
    pub fn reduce(&self, v: u64) -> u64 {
        v & self.mask
    }

    #[inline]
    pub fn is_reduced(&self, v: u64) -> bool {
        v & !self.mask == 0
    }

    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        a.wrapping_add(b) & self.mask
    }

    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        a.wrapping_sub(b) & self.mask
    }

    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        a.wrapping_neg() & self.mask
    }

    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        a.wrapping_mul(b) & self.mask
    }

    #[inline]
    pub fn msb(&self, v: u64) -> bool {
        (v >> (self.bits - 1)) & 1 == 1
    }

    /// Two's complement reading of a reduced element.
    #[inline]
    pub fn to_signed(&self, v: u64) -> i64 {
        let pad = 64 - self.bits;
        ((v << pad) as i64) >> pad
    }

    #[inline]
    pub fn from_signed(&self, v: i64) -> u64 {
        (v as u64) & self.mask
    }

    /// Arithmetic right shift of the signed reading of `v`.
    #[inline]
    pub fn shr_signed(&self, v: u64, shift: u32) -> u64 {
        self.from_signed(self.to_signed(v) >> shift)
    }

    pub(crate) fn check_width<T: ShareInt>(&self) -> Result<(), Error> {
        if self.bits as usize > T::K {
            return Err(Error::UnsupportedShareWidth {
                bits: self.bits,
                width: T::K,
            });
        }
        Ok(())
    }

    /// Converts caller shares to words, rejecting any that are not reduced.
    pub(crate) fn load<T: ShareInt>(&self, input: &[T]) -> Result<Vec<u64>, Error> {
        self.check_width::<T>()?;
        input
            .iter()
            .enumerate()
            .map(|(index, v)| {
                let v = v.to_word();
                if self.is_reduced(v) {
                    Ok(v)
                } else {
                    Err(Error::UnreducedShare { index })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_bitlength() {
        assert_eq!(RingConfig::new(0), Err(Error::InvalidBitLength(0)));
        assert_eq!(RingConfig::new(65), Err(Error::InvalidBitLength(65)));
        assert!(RingConfig::new(64).is_ok());
    }

    #[test]
    fn test_signed_roundtrip() -> Result<(), Error> {
        let ring = RingConfig::new(37)?;
        for v in [-1234567i64, -1, 0, 1, (1 << 36) - 1, -(1 << 36)] {
            let u = ring.from_signed(v);
            assert!(ring.is_reduced(u));
            assert_eq!(ring.to_signed(u), v);
        }
        let full = RingConfig::new(64)?;
        assert_eq!(full.to_signed(u64::MAX), -1);
        let one = RingConfig::new(1)?;
        assert_eq!(one.to_signed(1), -1);
        Ok(())
    }

    #[test]
    fn test_shr_signed() -> Result<(), Error> {
        let ring = RingConfig::new(16)?;
        assert_eq!(ring.to_signed(ring.shr_signed(ring.from_signed(-9), 2)), -3);
        assert_eq!(ring.to_signed(ring.shr_signed(ring.from_signed(9), 2)), 2);
        Ok(())
    }

    #[test]
    fn test_load_checks() -> Result<(), Error> {
        let ring = RingConfig::new(8)?;
        assert_eq!(ring.load(&[1u32, 255])?, vec![1, 255]);
        assert_eq!(
            ring.load(&[1u32, 256]),
            Err(Error::UnreducedShare { index: 1 })
        );
        let wide = RingConfig::new(40)?;
        assert_eq!(
            wide.load(&[0u32]),
            Err(Error::UnsupportedShareWidth { bits: 40, width: 32 })
        );
        Ok(())
    }
}
