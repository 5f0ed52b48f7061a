use crate::{
    error::Error,
    execution::session::Session,
    protocol::{binary::bit_inject_ring, millionaire::greater_than, msb::msb_ring},
    shares::{mask, RingConfig, ShareInt},
};
use eyre::Result;
use itertools::izip;
use rand::Rng;
use tracing::instrument;

/// `k` in `signed(u_S) + signed(u_C) = x + k * 2^l`, from the MSBs of both
/// shares and of `x`.
#[inline]
pub(crate) fn signed_overflow(own_msb: bool, peer_msb: bool, x_msb: bool) -> i64 {
    match (own_msb, peer_msb, x_msb) {
        (false, false, true) => 1,
        (true, true, false) => -1,
        _ => 0,
    }
}

/// Receiver choice of the 1-out-of-4 correction OTs: the client's MSB share
/// in bit 0 and the MSB of its own share in bit 1.
#[inline]
pub(crate) fn correction_choice(msb_share: bool, own_msb: bool) -> u8 {
    (msb_share as u8) | ((own_msb as u8) << 1)
}

pub(crate) fn check_lengths(input: usize, output: usize) -> Result<(), Error> {
    if input != output {
        return Err(Error::LengthMismatch { input, output });
    }
    Ok(())
}

/// Shares of `floor(x / 2^shift)` for ring-shared signed `x`.
///
/// Each party shifts its own share arithmetically; the sum of the shifted
/// shares is then off by `-k * 2^(l - shift)` and by the carry out of the low
/// `shift` bits. The first correction is transferred with a 1-out-of-4 OT
/// keyed on the MSB shares, the second comes from a comparison of the low
/// bits. Without the carry step the result can be one below the floor.
#[instrument(
    level = "trace",
    target = "smpc::truncation",
    skip_all,
    fields(n = input.len(), shift = shift)
)]
pub fn truncate_two_power_ring<T: ShareInt>(
    session: &mut Session,
    input: &[T],
    output: &mut [T],
    shift: u32,
    ring: &RingConfig,
    do_carry_bit_calculation: bool,
) -> Result<()> {
    check_lengths(input.len(), output.len())?;
    if shift == 0 || shift >= ring.bits() {
        return Err(Error::InvalidShift {
            shift,
            bits: ring.bits(),
        }
        .into());
    }
    let shares = ring.load(input)?;
    let res = truncate_words(session, &shares, shift, ring, do_carry_bit_calculation)?;
    for (o, r) in output.iter_mut().zip(res) {
        *o = T::from_word(r);
    }
    Ok(())
}

fn truncate_words(
    session: &mut Session,
    shares: &[u64],
    shift: u32,
    ring: &RingConfig,
    do_carry_bit_calculation: bool,
) -> Result<Vec<u64>> {
    let n = shares.len();
    let low_mask = mask(shift) as u64;
    let msbs = msb_ring(session, shares, ring)?;
    let is_server = session.is_server();

    let corrections: Vec<u64> = if is_server {
        let rng = session.prf.get_my_prf();
        let rho: Vec<u64> = (0..n).map(|_| rng.gen::<u64>() & low_mask).collect();
        let messages: Vec<[u128; 4]> = izip!(shares, &msbs, &rho)
            .map(|(u, msb_share, rho)| {
                let own_msb = ring.msb(*u);
                let mut msg = [0u128; 4];
                for (j, slot) in msg.iter_mut().enumerate() {
                    let x_msb = msb_share ^ (j & 1 == 1);
                    let k = signed_overflow(own_msb, j & 2 == 2, x_msb);
                    *slot = ((k.wrapping_neg() as u64).wrapping_sub(*rho) & low_mask) as u128;
                }
                msg
            })
            .collect();
        session.ot_mut().send_1oo4(&messages, shift)?;
        rho
    } else {
        let choices: Vec<u8> = shares
            .iter()
            .zip(&msbs)
            .map(|(u, msb_share)| correction_choice(*msb_share, ring.msb(*u)))
            .collect();
        session
            .ot_mut()
            .recv_1oo4(&choices, shift)?
            .into_iter()
            .map(|v| v as u64)
            .collect()
    };

    let carries = if do_carry_bit_calculation {
        let inputs: Vec<u64> = shares
            .iter()
            .map(|u| {
                let low = u & low_mask;
                if is_server {
                    low
                } else {
                    low_mask - low
                }
            })
            .collect();
        let bits = greater_than(session, &inputs, shift)?;
        bit_inject_ring(session, &bits, ring)?
    } else {
        vec![0; n]
    };

    let scale = 1u64 << (ring.bits() - shift);
    Ok(izip!(shares, corrections, carries)
        .map(|(u, c, carry)| {
            let head = ring.shr_signed(*u, shift);
            ring.add(ring.add(head, ring.mul(c, scale)), carry)
        })
        .collect())
}
