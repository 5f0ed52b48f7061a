use crate::{
    execution::session::Session,
    protocol::{
        binary::bit_inject_field,
        division::{threshold_indicators, DivisionConstants},
        msb::sign_and_wrap_field,
        truncation::check_lengths,
    },
    shares::{mask, FieldConfig, RingConfig, ShareInt},
};
use eyre::Result;
use itertools::izip;
use tracing::instrument;

/// Shares of `floor(x / d)` for field-shared `x` and public `d` with
/// `6d < p`.
///
/// Same decomposition as the ring variant with `p = Q d + R`: here `t` counts
/// the wrap of the share sum plus, in a signed field, the sign of `x`. The
/// packed OT payload is `fieldBits + bitsForA` wide and the comparison
/// indicators are lifted into the field with 1-out-of-2 OTs.
#[instrument(
    level = "trace",
    target = "smpc::division",
    skip_all,
    fields(n = input.len(), divisor = divisor)
)]
pub fn field_div<T: ShareInt>(
    session: &mut Session,
    input: &[T],
    output: &mut [T],
    divisor: u64,
    field: &FieldConfig,
) -> Result<()> {
    check_lengths(input.len(), output.len())?;
    let mut constants = DivisionConstants::new(field.p() as u128, divisor)?;
    // t <= 1 without a sign, so the residual never reaches -d
    constants.three_way &= field.signed();
    let shares = field.load(input)?;
    let res = divide_words(session, &shares, divisor, field, &constants)?;
    for (o, r) in output.iter_mut().zip(res) {
        *o = T::from_word(r);
    }
    Ok(())
}

fn divide_words(
    session: &mut Session,
    shares: &[u64],
    divisor: u64,
    field: &FieldConfig,
    constants: &DivisionConstants,
) -> Result<Vec<u64>> {
    let n = shares.len();
    let a_ring = RingConfig::new(constants.bits_for_a as usize)?;
    let field_bits = field.bits();
    let payload_bits = field_bits + a_ring.bits();
    let (signs, wraps) = sign_and_wrap_field(session, shares, field)?;
    let is_server = session.is_server();

    let (corr_q, corr_r): (Vec<u64>, Vec<u64>) = if is_server {
        let rho = session.prf.gen_field(field, n);
        let sigma = session.prf.gen_ring(&a_ring, n);
        let messages: Vec<[u128; 4]> = izip!(&signs, &wraps, &rho, &sigma)
            .map(|(sign_share, wrap_share, rho, sigma)| {
                let mut msg = [0u128; 4];
                for (j, slot) in msg.iter_mut().enumerate() {
                    let negative = field.signed() && (sign_share ^ (j & 1 == 1));
                    let wrap = wrap_share ^ (j & 2 == 2);
                    let t = wrap as u64 + negative as u64;
                    let q_part = field.sub(field.neg(field.mul(t, constants.quotient)), *rho);
                    let r_part =
                        a_ring.sub(a_ring.neg(a_ring.mul(t, constants.remainder)), *sigma);
                    *slot = q_part as u128 | ((r_part as u128) << field_bits);
                }
                msg
            })
            .collect();
        session.ot_mut().send_1oo4(&messages, payload_bits)?;
        (rho, sigma)
    } else {
        let choices: Vec<u8> = signs
            .iter()
            .zip(&wraps)
            .map(|(sign, wrap)| (*sign as u8) | ((*wrap as u8) << 1))
            .collect();
        session
            .ot_mut()
            .recv_1oo4(&choices, payload_bits)?
            .into_iter()
            .map(|v| {
                (
                    field.reduce((v & mask(field_bits)) as u64),
                    a_ring.reduce((v >> field_bits) as u64),
                )
            })
            .unzip()
    };

    let a: Vec<u64> = shares
        .iter()
        .zip(&corr_r)
        .map(|(u, c)| a_ring.add(u % divisor, *c))
        .collect();
    let indicators = threshold_indicators(session, &a, divisor, &a_ring, constants.three_way)?;
    let injected = bit_inject_field(session, &indicators, field)?;

    let base = if is_server {
        field.from_signed(constants.base())
    } else {
        0
    };
    Ok((0..n)
        .map(|i| {
            let folded = injected
                .iter()
                .skip(i)
                .step_by(n)
                .fold(base, |acc, v| field.add(acc, *v));
            field.add(field.add(shares[i] / divisor, corr_q[i]), folded)
        })
        .collect())
}
