use crate::{
    error::Error,
    execution::session::Session,
    protocol::{
        division::avg_pool_two_power_ring, field_division::field_div,
        truncation::truncate_two_power_ring,
    },
    shares::{FieldConfig, RingConfig, ShareInt},
};
use eyre::Result;
use fxp_mpc_common::{Backend, SessionConfig};

/// Secure arithmetic right shift of shared fixed-point values.
pub trait SecureTruncate {
    fn truncate<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        shift: u32,
    ) -> Result<()>;
}

/// Secure floor division of shared values by a public divisor.
pub trait SecureDivide {
    fn divide<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        divisor: u64,
    ) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingTruncationEngine {
    pub ring: RingConfig,
    pub carry_bit_calculation: bool,
}

impl SecureTruncate for RingTruncationEngine {
    fn truncate<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        shift: u32,
    ) -> Result<()> {
        truncate_two_power_ring(
            session,
            input,
            output,
            shift,
            &self.ring,
            self.carry_bit_calculation,
        )
    }
}

impl SecureDivide for RingTruncationEngine {
    fn divide<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        divisor: u64,
    ) -> Result<()> {
        avg_pool_two_power_ring(session, input, output, divisor, &self.ring)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDivisionEngine {
    pub field: FieldConfig,
}

impl SecureTruncate for FieldDivisionEngine {
    /// Division by `2^shift`, which is exact in the field as well.
    fn truncate<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        shift: u32,
    ) -> Result<()> {
        if shift == 0 || shift >= self.field.bits() {
            return Err(Error::InvalidShift {
                shift,
                bits: self.field.bits(),
            }
            .into());
        }
        field_div(session, input, output, 1 << shift, &self.field)
    }
}

impl SecureDivide for FieldDivisionEngine {
    fn divide<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        divisor: u64,
    ) -> Result<()> {
        field_div(session, input, output, divisor, &self.field)
    }
}

/// Engine chosen once per session from its configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DivisionEngine {
    Ring(RingTruncationEngine),
    Field(FieldDivisionEngine),
}

impl DivisionEngine {
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        match config.backend {
            Backend::Ring => Ok(DivisionEngine::Ring(RingTruncationEngine {
                ring: RingConfig::new(config.bitlength)?,
                carry_bit_calculation: config.carry_bit_calculation,
            })),
            Backend::Field => {
                let p = config
                    .field_modulus
                    .ok_or(fxp_mpc_common::error::Error::Missing("field_modulus"))?;
                Ok(DivisionEngine::Field(FieldDivisionEngine {
                    field: FieldConfig::new(p, config.signed_field)?,
                }))
            }
        }
    }

    /// Two's complement or signed-field reading of a reconstructed value.
    pub fn decode(&self, value: u64) -> i64 {
        match self {
            DivisionEngine::Ring(e) => e.ring.to_signed(value),
            DivisionEngine::Field(e) => e.field.to_signed(value),
        }
    }

    pub fn encode(&self, value: i64) -> u64 {
        match self {
            DivisionEngine::Ring(e) => e.ring.from_signed(value),
            DivisionEngine::Field(e) => e.field.from_signed(value),
        }
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        match self {
            DivisionEngine::Ring(e) => e.ring.add(a, b),
            DivisionEngine::Field(e) => e.field.add(a, b),
        }
    }
}

impl SecureTruncate for DivisionEngine {
    fn truncate<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        shift: u32,
    ) -> Result<()> {
        match self {
            DivisionEngine::Ring(e) => e.truncate(session, input, output, shift),
            DivisionEngine::Field(e) => e.truncate(session, input, output, shift),
        }
    }
}

impl SecureDivide for DivisionEngine {
    fn divide<T: ShareInt>(
        &self,
        session: &mut Session,
        input: &[T],
        output: &mut [T],
        divisor: u64,
    ) -> Result<()> {
        match self {
            DivisionEngine::Ring(e) => e.divide(session, input, output, divisor),
            DivisionEngine::Field(e) => e.divide(session, input, output, divisor),
        }
    }
}
