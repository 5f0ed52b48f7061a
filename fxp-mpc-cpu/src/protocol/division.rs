use crate::{
    error::Error,
    execution::session::Session,
    protocol::{
        binary::bit_inject_ring,
        msb::msb_ring,
        truncation::{check_lengths, correction_choice},
    },
    shares::{ceil_log2, mask, RingConfig, ShareInt},
};
use eyre::Result;
use itertools::izip;
use tracing::instrument;

/// Public constants of a division by `d` in a domain of size `M`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DivisionConstants {
    /// `floor(M / d)`, reduced into the domain.
    pub quotient: u64,
    /// `M mod d`
    pub remainder: u64,
    /// Width of the ring holding `r_S + r_C - t * remainder`; `2^bits >= 6d`.
    pub bits_for_a: u32,
    /// Whether the residual can drop below `-d`, which needs a third
    /// comparison.
    pub three_way: bool,
}

impl DivisionConstants {
    /// Checks `0 < d` and `6d < M`.
    pub fn new(modulus: u128, divisor: u64) -> Result<Self, Error> {
        if divisor == 0 {
            return Err(Error::InvalidDivisor);
        }
        let d = divisor as u128;
        if 6 * d >= modulus {
            return Err(Error::DivisorTooLarge { divisor });
        }
        let remainder = (modulus % d) as u64;
        Ok(Self {
            quotient: ((modulus / d) % modulus) as u64,
            remainder,
            bits_for_a: ceil_log2(6 * d),
            three_way: 2 * remainder as u128 >= d,
        })
    }

    pub fn base(&self) -> i64 {
        if self.three_way {
            -2
        } else {
            -1
        }
    }
}

/// Wrap bit of `u_S + u_C` over `2^l`, given both share MSBs and the MSB of
/// the shared value.
#[inline]
pub(crate) fn share_wrap(own_msb: bool, peer_msb: bool, x_msb: bool) -> bool {
    match (own_msb, peer_msb) {
        (true, true) => true,
        (false, false) => false,
        _ => !x_msb,
    }
}

/// Boolean shares of `[s' >= c]` for the thresholds `c` in `{-d, 0, d}`
/// (or `{0, d}`), threshold-major. `a` holds shares of `s'` over `a_ring`,
/// where every `s' - c` stays within half the ring, so each indicator is the
/// complement of an MSB.
pub(crate) fn threshold_indicators(
    session: &mut Session,
    a: &[u64],
    divisor: u64,
    a_ring: &RingConfig,
    three_way: bool,
) -> Result<Vec<bool>> {
    let d = divisor as i64;
    let thresholds: &[i64] = if three_way { &[-d, 0, d] } else { &[0, d] };
    let is_server = session.is_server();
    let inputs: Vec<u64> = thresholds
        .iter()
        .flat_map(|c| {
            let c = a_ring.from_signed(*c);
            a.iter().map(move |a| if is_server { a_ring.sub(*a, c) } else { *a })
        })
        .collect();
    let below = msb_ring(session, &inputs, a_ring)?;
    Ok(below.into_iter().map(|b| b ^ is_server).collect())
}

/// Shares of `floor(x / d)` for ring-shared signed `x` and public `d`.
///
/// With `u_i = q_i d + r_i`, `2^l = Q d + R` and `t` the number of times the
/// share sum overshoots `x` by `2^l`,
/// `floor(x / d) = q_S + q_C - t Q + floor((r_S + r_C - t R) / d)`.
/// Shares of `-t Q` and `-t R` travel packed in one 1-out-of-4 OT; the last
/// term lies in `[-2, 1]` and is assembled from threshold comparisons.
#[instrument(
    level = "trace",
    target = "smpc::division",
    skip_all,
    fields(n = input.len(), divisor = divisor)
)]
pub fn avg_pool_two_power_ring<T: ShareInt>(
    session: &mut Session,
    input: &[T],
    output: &mut [T],
    divisor: u64,
    ring: &RingConfig,
) -> Result<()> {
    check_lengths(input.len(), output.len())?;
    let constants = DivisionConstants::new(ring.modulus(), divisor)?;
    let shares = ring.load(input)?;
    let res = divide_words(session, &shares, divisor, ring, &constants)?;
    for (o, r) in output.iter_mut().zip(res) {
        *o = T::from_word(r);
    }
    Ok(())
}

fn divide_words(
    session: &mut Session,
    shares: &[u64],
    divisor: u64,
    ring: &RingConfig,
    constants: &DivisionConstants,
) -> Result<Vec<u64>> {
    let n = shares.len();
    let a_ring = RingConfig::new(constants.bits_for_a as usize)?;
    let l = ring.bits();
    let payload_bits = l + a_ring.bits();
    let msbs = msb_ring(session, shares, ring)?;
    let is_server = session.is_server();

    let (corr_q, corr_r): (Vec<u64>, Vec<u64>) = if is_server {
        let rho = session.prf.gen_ring(ring, n);
        let sigma = session.prf.gen_ring(&a_ring, n);
        let messages: Vec<[u128; 4]> = izip!(shares, &msbs, &rho, &sigma)
            .map(|(u, msb_share, rho, sigma)| {
                let own_msb = ring.msb(*u);
                let mut msg = [0u128; 4];
                for (j, slot) in msg.iter_mut().enumerate() {
                    let x_msb = msb_share ^ (j & 1 == 1);
                    let wrap = share_wrap(own_msb, j & 2 == 2, x_msb);
                    let t = wrap as u64 + x_msb as u64;
                    let q_part = ring.sub(ring.neg(ring.mul(t, constants.quotient)), *rho);
                    let r_part =
                        a_ring.sub(a_ring.neg(a_ring.mul(t, constants.remainder)), *sigma);
                    *slot = q_part as u128 | ((r_part as u128) << l);
                }
                msg
            })
            .collect();
        session.ot_mut().send_1oo4(&messages, payload_bits)?;
        (rho, sigma)
    } else {
        let choices: Vec<u8> = shares
            .iter()
            .zip(&msbs)
            .map(|(u, msb_share)| correction_choice(*msb_share, ring.msb(*u)))
            .collect();
        session
            .ot_mut()
            .recv_1oo4(&choices, payload_bits)?
            .into_iter()
            .map(|v| ((v & mask(l)) as u64, a_ring.reduce((v >> l) as u64)))
            .unzip()
    };

    let a: Vec<u64> = shares
        .iter()
        .zip(&corr_r)
        .map(|(u, c)| a_ring.add(u % divisor, *c))
        .collect();
    let indicators = threshold_indicators(session, &a, divisor, &a_ring, constants.three_way)?;
    let injected = bit_inject_ring(session, &indicators, ring)?;

    let base = if is_server {
        ring.from_signed(constants.base())
    } else {
        0
    };
    Ok((0..n)
        .map(|i| {
            let folded = injected
                .iter()
                .skip(i)
                .step_by(n)
                .fold(base, |acc, v| ring.add(acc, *v));
            ring.add(ring.add(shares[i] / divisor, corr_q[i]), folded)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        shares::div_floor,
        test_utils::{reconstruct_ring, run_session_pair, share_ring},
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;
    use tracing_test::traced_test;

    fn divide_pair(values: &[i64], ring: &RingConfig, divisor: u64, seed: u64) -> Result<Vec<i64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let (s0, s1) = share_ring::<u64, _>(&mut rng, values, ring);
        let (o0, o1) = run_session_pair(
            seed,
            |session| {
                let mut out = vec![0u64; s0.len()];
                avg_pool_two_power_ring(session, &s0, &mut out, divisor, ring)?;
                Ok(out)
            },
            |session| {
                let mut out = vec![0u64; s1.len()];
                avg_pool_two_power_ring(session, &s1, &mut out, divisor, ring)?;
                Ok(out)
            },
        )?;
        Ok(reconstruct_ring(&o0, &o1, ring))
    }

    #[test]
    #[traced_test]
    fn test_avg_pool_scenario() -> Result<()> {
        let ring = RingConfig::new(16)?;
        assert_eq!(divide_pair(&[500], &ring, 9, 1)?, vec![55]);
        Ok(())
    }

    #[rstest]
    #[case(16, 1)]
    #[case(16, 3)]
    #[case(16, 9)]
    #[case(16, 10922)]
    #[case(32, 7)]
    #[case(37, 25)]
    #[case(64, 3)]
    #[case(64, 1_000_003)]
    fn test_avg_pool_floor(#[case] bits: usize, #[case] divisor: u64) -> Result<()> {
        let ring = RingConfig::new(bits)?;
        let mut rng = ChaCha8Rng::seed_from_u64(divisor);
        let mut values: Vec<i64> = (0..80)
            .map(|_| ring.to_signed(ring.reduce(rng.gen())))
            .collect();
        let max = ring.to_signed(ring.mask() >> 1);
        values.extend([0, 1, -1, max, -max - 1, divisor as i64 - 1, -(divisor as i64)]);
        let values: Vec<i64> = values
            .into_iter()
            .map(|v| ring.to_signed(ring.from_signed(v)))
            .collect();
        let out = divide_pair(&values, &ring, divisor, bits as u64)?;
        for (x, y) in values.iter().zip(out) {
            assert_eq!(
                y as i128,
                div_floor(*x as i128, divisor as i128),
                "x = {x}, d = {divisor}"
            );
        }
        Ok(())
    }

    #[test]
    fn test_constants() -> Result<(), Error> {
        let c = DivisionConstants::new(1 << 16, 9)?;
        assert_eq!(c.quotient, 7281);
        assert_eq!(c.remainder, 7);
        assert_eq!(c.bits_for_a, 6);
        assert!(c.three_way);
        let identity = DivisionConstants::new(1 << 16, 1)?;
        assert_eq!(identity.quotient, 0);
        assert!(!identity.three_way);
        assert_eq!(DivisionConstants::new(64, 0), Err(Error::InvalidDivisor));
        assert_eq!(
            DivisionConstants::new(60, 10),
            Err(Error::DivisorTooLarge { divisor: 10 })
        );
        Ok(())
    }

    /// Cleartext residual `r_S + r_C - t R` of the ring decomposition.
    fn residual(u0: u64, u1: u64, ring: &RingConfig, d: u64, rem: u64) -> i128 {
        let x = ring.add(u0, u1);
        let wrap = (u0 as u128 + u1 as u128) >= ring.modulus();
        let t = wrap as i128 + ring.msb(x) as i128;
        (u0 % d) as i128 + (u1 % d) as i128 - t * rem as i128
    }

    #[test]
    fn test_two_comparisons_suffice_exhaustive() -> Result<()> {
        for bits in 3..=7 {
            let ring = RingConfig::new(bits)?;
            for d in (1..).take_while(|d| 6 * d < ring.modulus() as u64) {
                let c = DivisionConstants::new(ring.modulus(), d)?;
                for u0 in 0..ring.modulus() as u64 {
                    for u1 in 0..ring.modulus() as u64 {
                        let s = residual(u0, u1, &ring, d, c.remainder);
                        if !c.three_way {
                            assert!(s >= -(d as i128), "l = {bits}, d = {d}, u = ({u0}, {u1})");
                        }
                        let x = ring.to_signed(ring.add(u0, u1)) as i128;
                        let q = (u0 / d + u1 / d) as i128;
                        let t = (x - (u0 as i128 + u1 as i128)) / -(ring.modulus() as i128);
                        let ring_quotient = (ring.modulus() / d as u128) as i128;
                        assert_eq!(
                            q - t * ring_quotient + div_floor(s, d as i128),
                            div_floor(x, d as i128)
                        );
                    }
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_two_comparisons_suffice_random() -> Result<()> {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for bits in [37usize, 64] {
            let ring = RingConfig::new(bits)?;
            let mut checked = 0;
            while checked < 200 {
                let d = rng.gen_range(1..=(ring.modulus() / 6 - 1).min(1 << 40) as u64);
                let c = DivisionConstants::new(ring.modulus(), d)?;
                if c.three_way {
                    continue;
                }
                checked += 1;
                for _ in 0..500 {
                    let u0 = ring.reduce(rng.gen());
                    let u1 = ring.reduce(rng.gen());
                    assert!(residual(u0, u1, &ring, d, c.remainder) >= -(d as i128));
                }
            }
        }
        Ok(())
    }
}
