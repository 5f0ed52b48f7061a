use eyre::Result;
use fxp_mpc_common::{Backend, SessionConfig, MAX_THREADS};
use fxp_mpc_cpu::{
    error::Error,
    execution::local::LocalRuntime,
    protocol::engine::DivisionEngine,
    shares::{div_floor, FieldConfig, RingConfig},
    test_utils::{reconstruct_field, reconstruct_ring, run_pair, share_field, share_ring},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rstest::rstest;

const RNG_SEED: u64 = 0xdeadbeef;

fn ring_config(bitlength: usize, num_threads: usize) -> SessionConfig {
    SessionConfig {
        bitlength,
        num_threads,
        seed: Some(RNG_SEED),
        ..Default::default()
    }
}

fn field_config(p: u64, signed: bool, num_threads: usize) -> SessionConfig {
    SessionConfig {
        backend: Backend::Field,
        field_modulus: Some(p),
        signed_field: signed,
        num_threads,
        seed: Some(RNG_SEED),
        ..Default::default()
    }
}

fn ring_of(config: &SessionConfig) -> Result<RingConfig> {
    match DivisionEngine::from_config(config)? {
        DivisionEngine::Ring(e) => Ok(e.ring),
        DivisionEngine::Field(_) => eyre::bail!("expected a ring engine"),
    }
}

fn field_of(config: &SessionConfig) -> Result<FieldConfig> {
    match DivisionEngine::from_config(config)? {
        DivisionEngine::Field(e) => Ok(e.field),
        DivisionEngine::Ring(_) => eyre::bail!("expected a field engine"),
    }
}

/// Truncates through both parties and reconstructs the signed results.
fn truncate_ring(config: &SessionConfig, values: &[i64], shift: u32) -> Result<Vec<i64>> {
    let ring = ring_of(config)?;
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let (s0, s1) = share_ring::<u64, _>(&mut rng, values, &ring);
    let (mut server, mut client) = LocalRuntime::new(config)?;
    let (o0, o1) = run_pair(
        || {
            let mut out = vec![0u64; s0.len()];
            server.truncate(&s0, &mut out, shift).map(|_| out)
        },
        || {
            let mut out = vec![0u64; s1.len()];
            client.truncate(&s1, &mut out, shift).map(|_| out)
        },
    )?;
    Ok(reconstruct_ring(&o0?, &o1?, &ring))
}

fn divide_ring(config: &SessionConfig, values: &[i64], divisor: u64) -> Result<Vec<i64>> {
    let ring = ring_of(config)?;
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let (mut s0, mut s1) = share_ring::<u64, _>(&mut rng, values, &ring);
    let (mut server, mut client) = LocalRuntime::new(config)?;
    let (r0, r1) = run_pair(
        || server.divide_in_place(&mut s0, divisor),
        || client.divide_in_place(&mut s1, divisor),
    )?;
    r0?;
    r1?;
    Ok(reconstruct_ring(&s0, &s1, &ring))
}

fn divide_field(config: &SessionConfig, values: &[i64], divisor: u64) -> Result<Vec<i64>> {
    let field = field_of(config)?;
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let (mut s0, mut s1) = share_field::<u32, _>(&mut rng, values, &field);
    let (mut server, mut client) = LocalRuntime::new(config)?;
    let (r0, r1) = run_pair(
        || server.divide_in_place(&mut s0, divisor),
        || client.divide_in_place(&mut s1, divisor),
    )?;
    r0?;
    r1?;
    Ok(reconstruct_field(&s0, &s1, &field))
}

#[test]
fn test_scenarios() -> Result<()> {
    assert_eq!(
        truncate_ring(&ring_config(37, 1), &[-1234567], 12)?,
        vec![-302]
    );
    assert_eq!(divide_ring(&ring_config(16, 1), &[500], 9)?, vec![55]);
    assert_eq!(
        divide_field(&field_config(251, false, 1), &[200], 7)?,
        vec![28]
    );
    Ok(())
}

#[rstest]
fn test_threaded_truncation_matches_cleartext(
    #[values(1, 2, 3, MAX_THREADS)] num_threads: usize,
    #[values(10, 17)] size: usize,
) -> Result<()> {
    let config = ring_config(37, num_threads);
    let mut rng = StdRng::seed_from_u64(size as u64);
    let values: Vec<i64> = (0..size)
        .map(|_| rng.gen_range(-(1 << 35)..(1 << 35)))
        .collect();
    let out = truncate_ring(&config, &values, 12)?;
    for (x, y) in values.iter().zip(out) {
        assert_eq!(y as i128, div_floor(*x as i128, 1 << 12));
    }
    Ok(())
}

#[rstest]
fn test_threaded_division_matches_cleartext(
    #[values(1, 2, 3, MAX_THREADS)] num_threads: usize,
    #[values(10, 17)] size: usize,
    #[values(1, 9, 1000)] divisor: u64,
) -> Result<()> {
    let config = ring_config(32, num_threads);
    let mut rng = StdRng::seed_from_u64(size as u64 + divisor);
    let values: Vec<i64> = (0..size)
        .map(|_| rng.gen_range(-(1 << 31)..(1 << 31)))
        .collect();
    let out = divide_ring(&config, &values, divisor)?;
    for (x, y) in values.iter().zip(&out) {
        assert_eq!(*y as i128, div_floor(*x as i128, divisor as i128));
    }
    if divisor == 1 {
        assert_eq!(out, values);
    }
    Ok(())
}

#[rstest]
#[case(251, false, 7)]
#[case(251, true, 7)]
#[case(65537, true, 100)]
#[case(2147483647, true, 12345)]
fn test_threaded_field_division(
    #[case] p: u64,
    #[case] signed: bool,
    #[case] divisor: u64,
) -> Result<()> {
    let config = field_config(p, signed, 3);
    let field = field_of(&config)?;
    let mut rng = StdRng::seed_from_u64(p);
    let values: Vec<i64> = (0..17)
        .map(|_| field.to_signed(rng.gen_range(0..p)))
        .collect();
    let out = divide_field(&config, &values, divisor)?;
    for (x, y) in values.iter().zip(out) {
        assert_eq!(y as i128, div_floor(*x as i128, divisor as i128), "x = {x}");
    }
    Ok(())
}

#[test]
fn test_field_engine_truncates() -> Result<()> {
    let config = field_config(65537, true, 2);
    let field = field_of(&config)?;
    let values = [-3000i64, -1, 0, 1, 3000];
    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let (s0, s1) = share_field::<u64, _>(&mut rng, &values, &field);
    let (mut server, mut client) = LocalRuntime::new(&config)?;
    let (o0, o1) = run_pair(
        || {
            let mut out = vec![0u64; s0.len()];
            server.truncate(&s0, &mut out, 4).map(|_| out)
        },
        || {
            let mut out = vec![0u64; s1.len()];
            client.truncate(&s1, &mut out, 4).map(|_| out)
        },
    )?;
    assert_eq!(
        reconstruct_field(&o0?, &o1?, &field),
        vec![-188, -1, 0, 0, 187]
    );
    Ok(())
}

#[test]
fn test_precondition_errors_surface_as_typed_errors() -> Result<()> {
    let config = ring_config(16, 2);
    let (mut server, _client) = LocalRuntime::new(&config)?;
    let mut out = [0u32; 4];
    let err = server.divide(&[0u32; 4], &mut out, 10923).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::DivisorTooLarge { divisor: 10923 })
    );
    let err = server.truncate(&[0u32; 3], &mut out, 4).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::LengthMismatch { input: 3, output: 4 })
    );

    let too_wide = ring_config(40, 1);
    let (mut server, _client) = LocalRuntime::new(&too_wide)?;
    let mut out = [0u32; 1];
    let err = server.truncate(&[0u32], &mut out, 4).unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::UnsupportedShareWidth {
            bits: 40,
            width: 32
        })
    );

    assert!(LocalRuntime::new(&ring_config(16, MAX_THREADS + 1)).is_err());
    Ok(())
}
