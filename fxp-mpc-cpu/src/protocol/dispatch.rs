use crate::{error::Error, execution::session::Session, protocol::truncation::check_lengths};
use eyre::{eyre, Result};
use fxp_mpc_common::MAX_THREADS;
use std::{any::Any, thread};
use tracing::{debug, trace_span};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    match payload.downcast_ref::<&str>() {
        Some(s) => s,
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.as_str(),
            None => "Unknown panic message",
        },
    }
}

/// Runs `op` on contiguous chunks of `ceil(n / k)` elements, one OS thread per
/// worker session. Both parties must call this with the same length and the
/// same number of workers so that worker `i` on each side sees the same
/// chunk. Workers without a chunk stay idle. Every worker is joined before
/// the first error, if any, is returned. A worker panic becomes an error
/// only in unwinding builds.
pub fn run_chunked<T, F>(
    workers: &mut [Session],
    input: &[T],
    output: &mut [T],
    op: F,
) -> Result<()>
where
    T: Send + Sync,
    F: Fn(&mut Session, &[T], &mut [T]) -> Result<()> + Sync,
{
    check_lengths(input.len(), output.len())?;
    let k = workers.len();
    if k == 0 || k > MAX_THREADS {
        return Err(Error::InvalidThreadCount(k).into());
    }
    let n = input.len();
    if n == 0 {
        return Ok(());
    }
    let chunk_size = n.div_ceil(k);
    debug!(n, workers = k, chunk_size, "dispatching chunks");

    let op = &op;
    let results: Vec<Result<()>> = thread::scope(|s| {
        let handles: Vec<_> = workers
            .iter_mut()
            .zip(input.chunks(chunk_size).zip(output.chunks_mut(chunk_size)))
            .enumerate()
            .map(|(i, (session, (input, output)))| {
                let span = trace_span!("worker", i, role = %session.own_role());
                s.spawn(move || {
                    let _enter = span.enter();
                    op(session, input, output)
                })
            })
            .collect();
        handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| {
                handle.join().unwrap_or_else(|payload| {
                    Err(eyre!(
                        "worker {i} panicked: {}",
                        panic_message(payload.as_ref())
                    ))
                })
            })
            .collect()
    });
    results.into_iter().collect()
}
