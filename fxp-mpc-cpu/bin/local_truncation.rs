use clap::Parser;
use eyre::{bail, Result};
use fxp_mpc_common::{config::Opt, tracing::initialize_tracing, Backend, SessionConfig};
use fxp_mpc_cpu::{
    execution::local::LocalRuntime,
    protocol::engine::DivisionEngine,
    shares::div_floor,
    test_utils::{run_pair, share_field, share_ring},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    session: Opt,

    /// Fractional bits removed by truncation. Ignored when a divisor is given.
    #[arg(long, default_value_t = 12)]
    shift: u32,

    /// Public divisor; runs secure division instead of truncation.
    #[arg(long)]
    divisor: Option<u64>,

    /// Number of shared values.
    #[arg(long, default_value_t = 1000)]
    count: usize,

    /// Magnitude bound of the random inputs, in bits.
    #[arg(long, default_value_t = 30)]
    input_bits: u32,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    initialize_tracing()?;

    let args = Args::parse();
    let mut config = SessionConfig::load_config("FXP")?;
    config.overwrite_defaults_with_cli_args(args.session);
    config.validate()?;

    let (mut server, mut client) = LocalRuntime::new(&config)?;
    let engine = server.engine;
    let divisor = args.divisor.unwrap_or(1u64 << args.shift.min(63));
    // keep inputs inside the representable range
    let max_bits = match engine {
        DivisionEngine::Ring(e) => e.ring.bits() - 1,
        DivisionEngine::Field(e) => e.field.bits() - 2,
    };
    let bound = 1i64 << args.input_bits.min(max_bits).min(62);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let values: Vec<i64> = (0..args.count)
        .map(|_| match config.backend {
            Backend::Ring => rng.gen_range(-bound..bound),
            Backend::Field if config.signed_field => rng.gen_range(-bound..bound),
            Backend::Field => rng.gen_range(0..bound),
        })
        .collect();
    let (mut s0, mut s1) = match engine {
        DivisionEngine::Ring(e) => share_ring::<u64, _>(&mut rng, &values, &e.ring),
        DivisionEngine::Field(e) => share_field::<u64, _>(&mut rng, &values, &e.field),
    };

    let start = Instant::now();
    let (r0, r1) = match args.divisor {
        Some(d) => run_pair(
            || server.divide_in_place(&mut s0, d),
            || client.divide_in_place(&mut s1, d),
        )?,
        None => run_pair(
            || server.truncate_in_place(&mut s0, args.shift),
            || client.truncate_in_place(&mut s1, args.shift),
        )?,
    };
    r0?;
    r1?;
    let elapsed = start.elapsed();

    let tolerance = match config.backend {
        Backend::Ring if args.divisor.is_none() && !config.carry_bit_calculation => 1,
        _ => 0,
    };
    let mismatches = values
        .iter()
        .zip(s0.iter().zip(&s1))
        .filter(|(x, (a, b))| {
            let expected = div_floor(**x as i128, divisor as i128);
            let got = engine.decode(engine.add(**a, **b)) as i128;
            got > expected || got < expected - tolerance
        })
        .count();

    info!(
        backend = %config.backend,
        count = args.count,
        divisor,
        workers = config.num_threads,
        elapsed_ms = elapsed.as_millis() as u64,
        mismatches,
        "local run finished"
    );
    if mismatches > 0 {
        bail!("{mismatches} of {} results differ from the cleartext", args.count);
    }
    Ok(())
}
