use crate::{
    execution::{
        player::{Identity, Role},
        session::Session,
    },
    protocol::{
        dispatch::run_chunked,
        engine::{DivisionEngine, SecureDivide, SecureTruncate},
    },
    shares::ShareInt,
};
use eyre::Result;
use tracing::instrument;

/// One side of a two-party computation: its worker sessions and the engine
/// fixed by the session configuration.
pub struct Party {
    pub identity: Identity,
    pub role: Role,
    pub engine: DivisionEngine,
    workers: Vec<Session>,
}

impl Party {
    pub fn new(
        identity: Identity,
        role: Role,
        engine: DivisionEngine,
        workers: Vec<Session>,
    ) -> Self {
        Self {
            identity,
            role,
            engine,
            workers,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(role = %self.role, n = input.len(), shift = shift)
    )]
    pub fn truncate<T: ShareInt>(
        &mut self,
        input: &[T],
        output: &mut [T],
        shift: u32,
    ) -> Result<()> {
        let Party {
            engine, workers, ..
        } = self;
        let engine = &*engine;
        run_chunked(workers, input, output, |session, input, output| {
            engine.truncate(session, input, output, shift)
        })
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(role = %self.role, n = input.len(), divisor = divisor)
    )]
    pub fn divide<T: ShareInt>(
        &mut self,
        input: &[T],
        output: &mut [T],
        divisor: u64,
    ) -> Result<()> {
        let Party {
            engine, workers, ..
        } = self;
        let engine = &*engine;
        run_chunked(workers, input, output, |session, input, output| {
            engine.divide(session, input, output, divisor)
        })
    }

    pub fn truncate_in_place<T: ShareInt>(&mut self, values: &mut [T], shift: u32) -> Result<()> {
        let input = values.to_vec();
        self.truncate(&input, values, shift)
    }

    pub fn divide_in_place<T: ShareInt>(&mut self, values: &mut [T], divisor: u64) -> Result<()> {
        let input = values.to_vec();
        self.divide(&input, values, divisor)
    }
}
