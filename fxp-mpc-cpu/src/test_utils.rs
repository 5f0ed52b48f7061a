//! Helpers for tests, benches and the local demo: secret sharing in the clear
//! and running both parties of a computation on two threads.

use crate::{
    execution::{local::LocalRuntime, session::Session},
    shares::{FieldConfig, RingConfig, ShareInt},
};
use eyre::{eyre, Result};
use rand::Rng;
use std::thread;

pub fn share_ring<T: ShareInt, R: Rng>(
    rng: &mut R,
    values: &[i64],
    ring: &RingConfig,
) -> (Vec<T>, Vec<T>) {
    values
        .iter()
        .map(|v| {
            let x = ring.from_signed(*v);
            let s0 = ring.reduce(rng.gen());
            (T::from_word(s0), T::from_word(ring.sub(x, s0)))
        })
        .unzip()
}

pub fn reconstruct_ring<T: ShareInt>(s0: &[T], s1: &[T], ring: &RingConfig) -> Vec<i64> {
    s0.iter()
        .zip(s1)
        .map(|(a, b)| ring.to_signed(ring.add(a.to_word(), b.to_word())))
        .collect()
}

pub fn share_field<T: ShareInt, R: Rng>(
    rng: &mut R,
    values: &[i64],
    field: &FieldConfig,
) -> (Vec<T>, Vec<T>) {
    values
        .iter()
        .map(|v| {
            let x = field.from_signed(*v);
            let s0 = rng.gen_range(0..field.p());
            (T::from_word(s0), T::from_word(field.sub(x, s0)))
        })
        .unzip()
}

pub fn reconstruct_field<T: ShareInt>(s0: &[T], s1: &[T], field: &FieldConfig) -> Vec<i64> {
    s0.iter()
        .zip(s1)
        .map(|(a, b)| field.to_signed(field.add(a.to_word(), b.to_word())))
        .collect()
}

/// XOR-shares a bit vector.
pub fn split_bits<R: Rng>(rng: &mut R, bits: &[bool]) -> (Vec<bool>, Vec<bool>) {
    bits.iter()
        .map(|b| {
            let r: bool = rng.gen();
            (r, r ^ b)
        })
        .unzip()
}

/// Runs `a` and `b` on two scoped threads and joins both. A panic on either
/// side is reported as an error.
pub fn run_pair<A, B, RA, RB>(a: A, b: B) -> Result<(RA, RB)>
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    thread::scope(|s| {
        let ha = s.spawn(a);
        let hb = s.spawn(b);
        let ra = ha.join().map_err(|_| eyre!("server side panicked"));
        let rb = hb.join().map_err(|_| eyre!("client side panicked"));
        Ok((ra?, rb?))
    })
}

/// Runs one protocol on a fresh single-worker session pair seeded with
/// `seed`.
pub fn run_session_pair<A, B, RA, RB>(seed: u64, a: A, b: B) -> Result<(RA, RB)>
where
    A: FnOnce(&mut Session) -> Result<RA> + Send,
    B: FnOnce(&mut Session) -> Result<RB> + Send,
    RA: Send,
    RB: Send,
{
    let (mut server, mut client) = LocalRuntime::session_pair(seed)?;
    let (ra, rb) = run_pair(move || a(&mut server), move || b(&mut client))?;
    Ok((ra?, rb?))
}
