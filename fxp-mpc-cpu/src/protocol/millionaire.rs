//! Secure comparison of a server-held value against a client-held value.
//!
//! Both inputs are split into radix-16 digits. For each digit the server
//! offers a 1-out-of-16 OT of masked `(x > y, x == y)` bits for every
//! possible client digit. The per-digit results are merged pairwise up a
//! binary tree with
//! `gt = gt_hi ^ (eq_hi & gt_lo)` and `eq = eq_hi & eq_lo`.

use crate::{execution::session::Session, protocol::binary::and_many, shares::mask};
use eyre::{bail, Result};
use static_assertions::const_assert;
use tracing::instrument;

const RADIX_BITS: u32 = 4;
const LEAF_CHOICES: usize = 1 << RADIX_BITS;

// leaf choices are carried in a single byte
const_assert!(LEAF_CHOICES <= 256);

#[derive(Clone, Copy, Debug, Default)]
struct Node {
    gt: bool,
    eq: bool,
}

/// Boolean shares of `x > y` where the server inputs `x` and the client `y`,
/// both unsigned and below `2^bitwidth`.
#[instrument(
    level = "trace",
    target = "smpc::millionaire",
    skip_all,
    fields(n = values.len(), bitwidth = bitwidth)
)]
pub fn greater_than(session: &mut Session, values: &[u64], bitwidth: u32) -> Result<Vec<bool>> {
    if bitwidth > 64 {
        bail!("Comparison width {bitwidth} exceeds 64 bits");
    }
    let n = values.len();
    if bitwidth == 0 || n == 0 {
        return Ok(vec![false; n]);
    }
    let m = mask(bitwidth) as u64;
    if let Some(v) = values.iter().find(|v| **v & !m != 0) {
        bail!("Comparison input {v} does not fit {bitwidth} bits");
    }
    let num_digits = bitwidth.div_ceil(RADIX_BITS) as usize;
    let digit_mask = LEAF_CHOICES as u64 - 1;
    let digit = |v: u64, k: usize| ((v >> (k as u32 * RADIX_BITS)) & digit_mask) as usize;

    // leaves, value-major and least significant digit first
    let mut nodes: Vec<Node> = if session.is_server() {
        let gt_masks = session.prf.gen_bits(n * num_digits);
        let eq_masks = session.prf.gen_bits(n * num_digits);
        let mut messages = Vec::with_capacity(n * num_digits * LEAF_CHOICES);
        for (i, v) in values.iter().enumerate() {
            for k in 0..num_digits {
                let x = digit(*v, k);
                let idx = i * num_digits + k;
                messages.extend((0..LEAF_CHOICES).map(|y| {
                    let gt = (x > y) ^ gt_masks[idx];
                    let eq = (x == y) ^ eq_masks[idx];
                    (gt as u128) | ((eq as u128) << 1)
                }));
            }
        }
        session.ot_mut().send_1oon(LEAF_CHOICES, &messages, 2)?;
        gt_masks
            .into_iter()
            .zip(eq_masks)
            .map(|(gt, eq)| Node { gt, eq })
            .collect()
    } else {
        let choices: Vec<u8> = values
            .iter()
            .flat_map(|v| (0..num_digits).map(move |k| digit(*v, k) as u8))
            .collect();
        session
            .ot_mut()
            .recv_1oon(LEAF_CHOICES, &choices, 2)?
            .into_iter()
            .map(|r| Node {
                gt: r & 1 == 1,
                eq: r & 2 == 2,
            })
            .collect()
    };

    let mut width = num_digits;
    while width > 1 {
        let pairs = width / 2;
        let next_width = width.div_ceil(2);
        let last_level = next_width == 1;

        // gathered per pair: eq_hi & gt_lo, then eq_hi & eq_lo unless last
        let mut lhs = Vec::with_capacity(2 * n * pairs);
        let mut rhs = Vec::with_capacity(2 * n * pairs);
        for i in 0..n {
            let row = &nodes[i * width..(i + 1) * width];
            for t in 0..pairs {
                let (lo, hi) = (row[2 * t], row[2 * t + 1]);
                lhs.push(hi.eq);
                rhs.push(lo.gt);
                if !last_level {
                    lhs.push(hi.eq);
                    rhs.push(lo.eq);
                }
            }
        }
        let products = and_many(session, &lhs, &rhs)?;
        let per_pair = if last_level { 1 } else { 2 };

        let mut next = Vec::with_capacity(n * next_width);
        for i in 0..n {
            let row = &nodes[i * width..(i + 1) * width];
            for t in 0..pairs {
                let hi = row[2 * t + 1];
                let base = (i * pairs + t) * per_pair;
                next.push(Node {
                    gt: hi.gt ^ products[base],
                    eq: if last_level { false } else { products[base + 1] },
                });
            }
            if width % 2 == 1 {
                next.push(row[width - 1]);
            }
        }
        nodes = next;
        width = next_width;
    }

    Ok(nodes.into_iter().map(|node| node.gt).collect())
}
