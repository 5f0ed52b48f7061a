use super::{ceil_log2, int_ring::ShareInt};
use crate::error::Error;

/// Largest supported modulus width. Sign/wrap extraction compares values up
/// to `3p/2`, which has to fit a `u64` word.
pub const MAX_FIELD_BITS: u32 = 62;

/// Prime field `Z_p`. In a signed field residues at or above `(p + 1) / 2`
/// denote negative values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldConfig {
    p: u64,
    bits: u32,
    signed: bool,
}

impl FieldConfig {
    pub fn new(p: u64, signed: bool) -> Result<Self, Error> {
        if p < 3 || p % 2 == 0 {
            return Err(Error::InvalidFieldModulus {
                modulus: p,
                reason: "must be an odd prime",
            });
        }
        if p >> MAX_FIELD_BITS != 0 {
            return Err(Error::InvalidFieldModulus {
                modulus: p,
                reason: "must be below 2^62",
            });
        }
        if !is_prime(p) {
            return Err(Error::InvalidFieldModulus {
                modulus: p,
                reason: "not prime",
            });
        }
        Ok(Self {
            p,
            bits: ceil_log2(p as u128),
            signed,
        })
    }

    #[inline]
    pub fn p(&self) -> u64 {
        self.p
    }

    /// `ceil(log2 p)`
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    #[inline]
    pub fn signed(&self) -> bool {
        self.signed
    }

    #[inline]
    pub fn neg_threshold(&self) -> u64 {
        (self.p + 1) / 2
    }

    #[inline]
    pub fn is_reduced(&self, v: u64) -> bool {
        v < self.p
    }

    #[inline]
    pub fn reduce(&self, v: u64) -> u64 {
        v % self.p
    }

    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.p as u128) as u64
    }

    #[inline]
    pub fn sub(&self, a: u64, b: u64) -> u64 {
        self.add(a, self.neg(b % self.p))
    }

    #[inline]
    pub fn neg(&self, a: u64) -> u64 {
        let a = a % self.p;
        if a == 0 {
            0
        } else {
            self.p - a
        }
    }

    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.p as u128) as u64
    }

    /// Integer denoted by a reduced residue.
    #[inline]
    pub fn to_signed(&self, v: u64) -> i64 {
        if self.signed && v >= self.neg_threshold() {
            v as i64 - self.p as i64
        } else {
            v as i64
        }
    }

    #[inline]
    pub fn from_signed(&self, v: i64) -> u64 {
        v.rem_euclid(self.p as i64) as u64
    }

    pub(crate) fn load<T: ShareInt>(&self, input: &[T]) -> Result<Vec<u64>, Error> {
        if self.bits as usize > T::K {
            return Err(Error::UnsupportedShareWidth {
                bits: self.bits,
                width: T::K,
            });
        }
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

fn pow_mod(base: u64, mut exp: u64, m: u64) -> u64 {
    let m = m as u128;
    let mut acc = 1u128;
    let mut b = base as u128 % m;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = acc * b % m;
        }
        b = b * b % m;
        exp >>= 1;
    }
    acc as u64
}

/// Deterministic Miller-Rabin; the witness set is exact for all `u64`.
pub fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for w in WITNESSES {
        if n % w == 0 {
            return n == w;
        }
    }
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = ((x as u128 * x as u128) % n as u128) as u64;
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
