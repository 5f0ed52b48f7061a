//! Oblivious transfer capability used by every protocol in this crate.
//!
//! Messages are `u128` words of which only the low `bitwidth` bits are
//! meaningful. Batched calls of a sender and the matching receiver must line
//! up one to one.

use eyre::Result;

pub mod dealer;
pub mod precomputed;

pub use dealer::{OtDealer, ReceiverPads, SenderPads};
pub use precomputed::PrecomputedOt;

pub trait ObliviousTransfer: Send {
    /// Sends `messages.len() / n` instances of 1-out-of-`n` OT; instance `i`
    /// owns `messages[i * n..(i + 1) * n]`.
    fn send_1oon(&mut self, n: usize, messages: &[u128], bitwidth: u32) -> Result<()>;

    fn recv_1oon(&mut self, n: usize, choices: &[u8], bitwidth: u32) -> Result<Vec<u128>>;

    /// Correlated OT. Returns the sender's shares; the receiver with choice
    /// bit `b` obtains shares such that both sum to `b * correlation` modulo
    /// `2^bitwidth`.
    fn send_cot_modulo_add(&mut self, correlations: &[u64], bitwidth: u32) -> Result<Vec<u64>>;

    fn recv_cot_modulo_add(&mut self, choices: &[bool], bitwidth: u32) -> Result<Vec<u64>>;

    fn send_1oo2(&mut self, messages: &[[u128; 2]], bitwidth: u32) -> Result<()> {
        let flat: Vec<u128> = messages.iter().flatten().copied().collect();
        self.send_1oon(2, &flat, bitwidth)
    }

    fn recv_1oo2(&mut self, choices: &[bool], bitwidth: u32) -> Result<Vec<u128>> {
        let choices: Vec<u8> = choices.iter().map(|&b| b as u8).collect();
        self.recv_1oon(2, &choices, bitwidth)
    }

    fn send_1oo4(&mut self, messages: &[[u128; 4]], bitwidth: u32) -> Result<()> {
        let flat: Vec<u128> = messages.iter().flatten().copied().collect();
        self.send_1oon(4, &flat, bitwidth)
    }

    fn recv_1oo4(&mut self, choices: &[u8], bitwidth: u32) -> Result<Vec<u128>> {
        self.recv_1oon(4, choices, bitwidth)
    }
}
