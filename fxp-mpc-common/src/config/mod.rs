use crate::error::Error;
use clap::Parser;
use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on worker threads per party; each worker owns a network stream
/// and an OT endpoint.
pub const MAX_THREADS: usize = 4;

#[derive(Debug, Parser)]
pub struct Opt {
    #[arg(long)]
    bitlength: Option<usize>,

    #[arg(long)]
    field_modulus: Option<u64>,

    #[arg(long)]
    backend: Option<Backend>,

    #[arg(long)]
    num_threads: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shares live in the ring 2^bitlength.
    #[default]
    Ring,
    /// Shares live in the prime field given by `field_modulus`.
    Field,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Ring => write!(f, "ring"),
            Backend::Field => write!(f, "field"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    #[serde(default = "default_bitlength")]
    pub bitlength: usize,

    #[serde(default)]
    pub field_modulus: Option<u64>,

    /// Whether field residues above (p-1)/2 denote negative values.
    #[serde(default = "default_true")]
    pub signed_field: bool,

    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_num_threads")]
    pub num_threads: usize,

    /// Computes the exact carry out of the truncated low bits. When disabled,
    /// ring truncation may be off by one in the last place.
    #[serde(default = "default_true")]
    pub carry_bit_calculation: bool,

    /// Fixed seed for local runs; fresh OS randomness when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_bitlength() -> usize {
    37
}

fn default_num_threads() -> usize {
    MAX_THREADS
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bitlength: default_bitlength(),
            field_modulus: None,
            signed_field: true,
            backend: Backend::default(),
            num_threads: default_num_threads(),
            carry_bit_calculation: true,
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn load_config(prefix: &str) -> Result<SessionConfig> {
        let settings = config::Config::builder();
        let settings = settings
            .add_source(
                config::Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: SessionConfig = settings.try_deserialize::<SessionConfig>()?;
        Ok(config)
    }

    pub fn overwrite_defaults_with_cli_args(&mut self, opts: Opt) {
        if let Some(bitlength) = opts.bitlength {
            self.bitlength = bitlength;
        }

        if let Some(field_modulus) = opts.field_modulus {
            self.field_modulus = Some(field_modulus);
        }

        if let Some(backend) = opts.backend {
            self.backend = backend;
        }

        if let Some(num_threads) = opts.num_threads {
            self.num_threads = num_threads;
        }

        if let Some(seed) = opts.seed {
            self.seed = Some(seed);
        }
    }

    /// Range checks that do not depend on the protocol crate. The arithmetic
    /// checks on the modulus itself happen when the session is built.
    pub fn validate(&self) -> Result<(), Error> {
        if self.num_threads == 0 || self.num_threads > MAX_THREADS {
            return Err(Error::InvalidValue {
                field: "num_threads",
                reason: format!("must be in [1, {MAX_THREADS}], got {}", self.num_threads),
            });
        }
        match self.backend {
            Backend::Ring => {
                if !(1..=64).contains(&self.bitlength) {
                    return Err(Error::InvalidValue {
                        field: "bitlength",
                        reason: format!("must be in [1, 64], got {}", self.bitlength),
                    });
                }
            }
            Backend::Field => {
                if self.field_modulus.is_none() {
                    return Err(Error::Missing("field_modulus"));
                }
            }
        }
        Ok(())
    }
}
