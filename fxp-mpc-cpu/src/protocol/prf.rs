use crate::shares::{FieldConfig, RingConfig};
use rand::{Rng, SeedableRng};

pub use rand_chacha::ChaCha20Rng as PrfRng;

pub type PrfSeed = <PrfRng as SeedableRng>::Seed;

/// Local randomness of one worker: masks for OT messages and fresh shares.
#[derive(Clone, Debug)]
pub struct Prf {
    pub my_prf: PrfRng,
}

impl Prf {
    pub fn new(my_key: PrfSeed) -> Self {
        Self {
            my_prf: PrfRng::from_seed(my_key),
        }
    }

    #[inline]
    pub fn get_my_prf(&mut self) -> &mut PrfRng {
        &mut self.my_prf
    }

    pub fn gen_bits(&mut self, n: usize) -> Vec<bool> {
        (0..n).map(|_| self.my_prf.gen()).collect()
    }

    pub fn gen_ring(&mut self, ring: &RingConfig, n: usize) -> Vec<u64> {
        (0..n).map(|_| ring.reduce(self.my_prf.gen())).collect()
    }

    pub fn gen_field(&mut self, field: &FieldConfig, n: usize) -> Vec<u64> {
        (0..n)
            .map(|_| random_mod_p(&mut self.my_prf, field.p()))
            .collect()
    }
}

/// Uniform element of `[0, p)`.
#[inline]
pub fn random_mod_p<R: Rng + ?Sized>(rng: &mut R, p: u64) -> u64 {
    rng.gen_range(0..p)
}
