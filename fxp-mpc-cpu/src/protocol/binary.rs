use crate::{
    execution::session::Session,
    shares::{FieldConfig, RingConfig},
};
use eyre::{bail, Result};
use itertools::izip;
use tracing::instrument;

/// Boolean-shared AND of two vectors of XOR shares, one OT in each direction.
///
/// Each party offers `(r, r ^ a)` and selects with its own `b`, which yields
/// shares of the two cross terms `a_S b_C` and `a_C b_S`.
#[instrument(level = "trace", target = "smpc::binary", skip_all, fields(n = a.len()))]
pub(crate) fn and_many(session: &mut Session, a: &[bool], b: &[bool]) -> Result<Vec<bool>> {
    if a.len() != b.len() {
        bail!("AND on vectors of different lengths: {} vs {}", a.len(), b.len());
    }
    let r = session.prf.gen_bits(a.len());
    let messages: Vec<[u128; 2]> = a
        .iter()
        .zip(r.iter())
        .map(|(a, r)| [*r as u128, (r ^ a) as u128])
        .collect();

    let is_server = session.is_server();
    let ot = session.ot_mut();
    let cross = if is_server {
        ot.send_1oo2(&messages, 1)?;
        ot.recv_1oo2(b, 1)?
    } else {
        let cross = ot.recv_1oo2(b, 1)?;
        ot.send_1oo2(&messages, 1)?;
        cross
    };

    Ok(izip!(a, b, r, cross)
        .map(|(a, b, r, c)| (a & b) ^ r ^ (c != 0))
        .collect())
}

/// Converts XOR-shared bits into additive shares over `Z_{2^l}`.
///
/// `b = b_S + b_C - 2 b_S b_C`; the product term comes from a correlated OT
/// where the server offers `1 - 2 b_S` and the client selects with `b_C`.
#[instrument(level = "trace", target = "smpc::binary", skip_all, fields(n = bits.len()))]
pub(crate) fn bit_inject_ring(
    session: &mut Session,
    bits: &[bool],
    ring: &RingConfig,
) -> Result<Vec<u64>> {
    if session.is_server() {
        let deltas: Vec<u64> = bits
            .iter()
            .map(|b| if *b { ring.neg(1) } else { 1 })
            .collect();
        let shares = session.ot_mut().send_cot_modulo_add(&deltas, ring.bits())?;
        Ok(bits
            .iter()
            .zip(shares)
            .map(|(b, s)| ring.add(*b as u64, s))
            .collect())
    } else {
        session.ot_mut().recv_cot_modulo_add(bits, ring.bits())
    }
}

/// Converts XOR-shared bits into additive shares modulo `p`.
///
/// The server keeps a random `rho` and offers `(b_S ^ j) - rho` for both
/// values `j` of the client's bit.
#[instrument(level = "trace", target = "smpc::binary", skip_all, fields(n = bits.len()))]
pub(crate) fn bit_inject_field(
    session: &mut Session,
    bits: &[bool],
    field: &FieldConfig,
) -> Result<Vec<u64>> {
    if session.is_server() {
        let rho = session.prf.gen_field(field, bits.len());
        let messages: Vec<[u128; 2]> = bits
            .iter()
            .zip(rho.iter())
            .map(|(b, rho)| {
                let m0 = field.sub(*b as u64, *rho);
                let m1 = field.sub((!b) as u64, *rho);
                [m0 as u128, m1 as u128]
            })
            .collect();
        session.ot_mut().send_1oo2(&messages, field.bits())?;
        Ok(rho)
    } else {
        let received = session.ot_mut().recv_1oo2(bits, field.bits())?;
        Ok(received.into_iter().map(|v| v as u64).collect())
    }
}
