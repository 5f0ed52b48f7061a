use crate::{protocol::prf::PrfRng, shares::mask};
use async_channel::{Receiver, Sender};
use eyre::{eyre, Result};
use rand::{Rng, SeedableRng};
use std::thread;

/// Trusted source of random OT correlations for one transfer direction.
///
/// For every instance it draws `n` random pads for the sender and a random
/// index `c` for the receiver, who learns only `pads[c]`. Pads and indices
/// come from two independent seeds. The sender is handed the pad seed and
/// expands its pads locally; the receiver's `(c, pads[c])` pairs are
/// materialized batch by batch on the dealer's thread, so the receiver holds
/// no seed and the sender never sees an index.
pub struct OtDealer {
    pad_seed: [u8; 32],
    choice_seed: [u8; 32],
}

#[derive(Clone, Copy, Debug)]
struct BatchRequest {
    batch: u64,
    count: usize,
    n: usize,
    bitwidth: u32,
}

fn stream(seed: &[u8; 32], batch: u64) -> PrfRng {
    let mut rng = PrfRng::from_seed(*seed);
    rng.set_stream(batch);
    rng
}

impl OtDealer {
    pub fn new(pad_seed: [u8; 32], choice_seed: [u8; 32]) -> Self {
        Self {
            pad_seed,
            choice_seed,
        }
    }

    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen(), rng.gen())
    }

    /// Hands out the two endpoints. The dealer moves onto its own thread,
    /// which exits once the receiver half is dropped.
    pub fn spawn(self) -> Result<(SenderPads, ReceiverPads)> {
        let (request_tx, request_rx) = async_channel::unbounded::<BatchRequest>();
        let (response_tx, response_rx) = async_channel::unbounded();
        let sender = SenderPads {
            seed: self.pad_seed,
        };
        thread::Builder::new()
            .name("ot-dealer".to_string())
            .spawn(move || {
                while let Ok(request) = request_rx.recv_blocking() {
                    if response_tx.send_blocking(self.receiver_pads(request)).is_err() {
                        break;
                    }
                }
            })?;
        Ok((
            sender,
            ReceiverPads {
                requests: request_tx,
                responses: response_rx,
            },
        ))
    }

    fn receiver_pads(&self, request: BatchRequest) -> Vec<(usize, u128)> {
        let mut pad_rng = stream(&self.pad_seed, request.batch);
        let mut choice_rng = stream(&self.choice_seed, request.batch);
        let m = mask(request.bitwidth);
        let mut pads = vec![0u128; request.n];
        (0..request.count)
            .map(|_| {
                pads.iter_mut().for_each(|p| *p = pad_rng.gen::<u128>() & m);
                let c = choice_rng.gen_range(0..request.n);
                (c, pads[c])
            })
            .collect()
    }
}

/// Sender half of a dealer: every pad, no index.
pub struct SenderPads {
    seed: [u8; 32],
}

impl SenderPads {
    /// `count * n` pads; instance `i` owns `pads[i * n..(i + 1) * n]`.
    pub fn pads(&self, batch: u64, count: usize, n: usize, bitwidth: u32) -> Vec<u128> {
        let mut rng = stream(&self.seed, batch);
        let m = mask(bitwidth);
        (0..count * n).map(|_| rng.gen::<u128>() & m).collect()
    }
}

/// Receiver half of a dealer: `(c, pads[c])` per instance.
pub struct ReceiverPads {
    requests: Sender<BatchRequest>,
    responses: Receiver<Vec<(usize, u128)>>,
}

impl ReceiverPads {
    pub fn pads(
        &self,
        batch: u64,
        count: usize,
        n: usize,
        bitwidth: u32,
    ) -> Result<Vec<(usize, u128)>> {
        let request = BatchRequest {
            batch,
            count,
            n,
            bitwidth,
        };
        self.requests
            .send_blocking(request)
            .map_err(|_| eyre!("OT dealer for batch {batch} is gone"))?;
        self.responses
            .recv_blocking()
            .map_err(|_| eyre!("OT dealer for batch {batch} is gone"))
    }
}
