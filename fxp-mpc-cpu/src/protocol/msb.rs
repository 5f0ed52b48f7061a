use crate::{
    execution::session::Session,
    protocol::millionaire::greater_than,
    shares::{FieldConfig, RingConfig},
};
use eyre::Result;
use tracing::instrument;

/// Boolean shares of the MSB of ring-shared values.
///
/// `msb(x) = msb(u_S) ^ msb(u_C) ^ carry`, where the carry out of the low
/// `l - 1` bits is `low_S > 2^(l-1) - 1 - low_C`.
#[instrument(level = "trace", target = "smpc::msb", skip_all, fields(n = shares.len()))]
pub fn msb_ring(session: &mut Session, shares: &[u64], ring: &RingConfig) -> Result<Vec<bool>> {
    let low_bits = ring.bits() - 1;
    let half_mask = (1u64 << low_bits).wrapping_sub(1);
    let is_server = session.is_server();
    let inputs: Vec<u64> = shares
        .iter()
        .map(|u| {
            let low = u & half_mask;
            if is_server {
                low
            } else {
                half_mask - low
            }
        })
        .collect();
    let carries = greater_than(session, &inputs, low_bits)?;
    Ok(shares
        .iter()
        .zip(carries)
        .map(|(u, c)| ring.msb(*u) ^ c)
        .collect())
}

/// Boolean shares of the sign and of the wrap bit `u_S + u_C >= p` of
/// field-shared values, returned as `(sign, wrap)`.
///
/// With `s = u_S + u_C` and `h = (p + 1) / 2` the value is negative iff
/// `s` lies in `[h, p)` or `[p + h, 2p)`, i.e.
/// `[s >= h] ^ [s >= p] ^ [s >= p + h]`. Each indicator `s >= T` is the
/// comparison `u_S + 1 > T - u_C`. Unsigned fields only need the wrap and
/// report every sign as zero.
#[instrument(level = "trace", target = "smpc::msb", skip_all, fields(n = shares.len()))]
pub fn sign_and_wrap_field(
    session: &mut Session,
    shares: &[u64],
    field: &FieldConfig,
) -> Result<(Vec<bool>, Vec<bool>)> {
    let p = field.p();
    let h = field.neg_threshold();
    let thresholds: Vec<u64> = if field.signed() {
        vec![h, p, p + h]
    } else {
        vec![p]
    };
    let top = thresholds.iter().copied().max().unwrap_or(p);
    let width = u64::BITS - top.leading_zeros();

    let is_server = session.is_server();
    let inputs: Vec<u64> = thresholds
        .iter()
        .flat_map(|t| {
            shares.iter().map(move |u| {
                if is_server {
                    u + 1
                } else {
                    t.saturating_sub(*u)
                }
            })
        })
        .collect();
    let indicators = greater_than(session, &inputs, width)?;

    let n = shares.len();
    if field.signed() {
        let (above_h, rest) = indicators.split_at(n);
        let (above_p, above_p_h) = rest.split_at(n);
        let sign = above_h
            .iter()
            .zip(above_p)
            .zip(above_p_h)
            .map(|((a, b), c)| a ^ b ^ c)
            .collect();
        Ok((sign, above_p.to_vec()))
    } else {
        Ok((vec![false; n], indicators))
    }
}
