use super::{
    dealer::{ReceiverPads, SenderPads},
    ObliviousTransfer,
};
use crate::{
    network::{value::NetworkValue, Networking},
    shares::mask,
};
use eyre::{bail, Result};
use tracing::{instrument, trace};

/// OT from dealer-precomputed random correlations (Beaver's derandomization).
///
/// The receiver sends the offset `e = (choice - c) mod n` between its choice
/// and the random index it holds; the sender answers with every message
/// masked by the pad shifted by `e`. Each call consumes one batch of
/// correlations in the direction it uses.
pub struct PrecomputedOt {
    network: Box<dyn Networking>,
    outgoing: SenderPads,
    incoming: ReceiverPads,
    sent_batches: u64,
    received_batches: u64,
}

impl PrecomputedOt {
    /// `outgoing` serves the transfers this endpoint sends, `incoming` those
    /// it receives. The peer holds the opposite halves of the same two
    /// dealers.
    pub fn new(network: Box<dyn Networking>, outgoing: SenderPads, incoming: ReceiverPads) -> Self {
        Self {
            network,
            outgoing,
            incoming,
            sent_batches: 0,
            received_batches: 0,
        }
    }

    fn next_send_batch(&mut self) -> u64 {
        let batch = self.sent_batches;
        self.sent_batches += 1;
        batch
    }

    fn next_recv_batch(&mut self) -> u64 {
        let batch = self.received_batches;
        self.received_batches += 1;
        batch
    }
}

fn check_params(n: usize, bitwidth: u32) -> Result<()> {
    if !(2..=256).contains(&n) {
        bail!("1-out-of-{n} OT is not supported");
    }
    if !(1..=128).contains(&bitwidth) {
        bail!("Invalid OT message width {bitwidth}");
    }
    Ok(())
}

fn record(instances: usize) {
    metrics::counter!("smpc.ot.instances").increment(instances as u64);
    metrics::counter!("smpc.ot.rounds").increment(1);
}

impl ObliviousTransfer for PrecomputedOt {
    #[instrument(
        level = "trace",
        target = "smpc::ot",
        skip_all,
        fields(n = n, count = messages.len() / n.max(1))
    )]
    fn send_1oon(&mut self, n: usize, messages: &[u128], bitwidth: u32) -> Result<()> {
        check_params(n, bitwidth)?;
        if messages.len() % n != 0 {
            bail!(
                "{} messages do not split into 1-out-of-{n} instances",
                messages.len()
            );
        }
        let count = messages.len() / n;
        if count == 0 {
            return Ok(());
        }
        let batch = self.next_send_batch();
        let offsets = self.network.receive()?.into_bytes(count)?;
        let pads = self.outgoing.pads(batch, count, n, bitwidth);
        let m = mask(bitwidth);

        let mut masked = Vec::with_capacity(messages.len());
        for (i, (e, instance)) in offsets.iter().zip(messages.chunks_exact(n)).enumerate() {
            let e = *e as usize;
            if e >= n {
                bail!("OT offset {e} out of range for 1-out-of-{n}");
            }
            let instance_pads = &pads[i * n..(i + 1) * n];
            masked.extend(
                instance
                    .iter()
                    .enumerate()
                    .map(|(j, msg)| (msg & m) ^ instance_pads[(j + n - e) % n]),
            );
        }
        self.network.send(NetworkValue::from_words(masked, bitwidth))?;
        record(count);
        trace!(batch, count, "sent OT batch");
        Ok(())
    }

    #[instrument(
        level = "trace",
        target = "smpc::ot",
        skip_all,
        fields(n = n, count = choices.len())
    )]
    fn recv_1oon(&mut self, n: usize, choices: &[u8], bitwidth: u32) -> Result<Vec<u128>> {
        check_params(n, bitwidth)?;
        let count = choices.len();
        if count == 0 {
            return Ok(vec![]);
        }
        if let Some(choice) = choices.iter().find(|c| **c as usize >= n) {
            bail!("OT choice {choice} out of range for 1-out-of-{n}");
        }
        let batch = self.next_recv_batch();
        let pads = self.incoming.pads(batch, count, n, bitwidth)?;

        let offsets = choices
            .iter()
            .zip(pads.iter())
            .map(|(choice, (c, _))| ((*choice as usize + n - c) % n) as u8)
            .collect();
        self.network.send(NetworkValue::VecU8(offsets))?;

        let masked = self.network.receive()?.into_words(bitwidth, count * n)?;
        let res = choices
            .iter()
            .zip(pads)
            .enumerate()
            .map(|(i, (choice, (_, pad)))| masked[i * n + *choice as usize] ^ pad)
            .collect();
        trace!(batch, count, "received OT batch");
        Ok(res)
    }

    #[instrument(
        level = "trace",
        target = "smpc::ot",
        skip_all,
        fields(count = correlations.len())
    )]
    fn send_cot_modulo_add(&mut self, correlations: &[u64], bitwidth: u32) -> Result<Vec<u64>> {
        if !(1..=64).contains(&bitwidth) {
            bail!("Invalid correlated OT width {bitwidth}");
        }
        let count = correlations.len();
        if count == 0 {
            return Ok(vec![]);
        }
        let batch = self.next_send_batch();
        let offsets = self.network.receive()?.into_bytes(count)?;
        let pads = self.outgoing.pads(batch, count, 2, bitwidth);
        let m = mask(bitwidth) as u64;

        let mut own = Vec::with_capacity(count);
        let mut masked = Vec::with_capacity(count);
        for (i, (e, delta)) in offsets.iter().zip(correlations).enumerate() {
            let e = match *e {
                0 => 0,
                1 => 1,
                other => bail!("Correlated OT offset {other} is not a bit"),
            };
            let x0 = pads[2 * i + e] as u64;
            let x1 = pads[2 * i + (1 - e)] as u64;
            own.push(x0.wrapping_neg() & m);
            masked.push(x1.wrapping_sub(x0).wrapping_sub(*delta) & m);
        }
        self.network.send(NetworkValue::VecRing64(masked))?;
        record(count);
        Ok(own)
    }

    #[instrument(level = "trace", target = "smpc::ot", skip_all, fields(count = choices.len()))]
    fn recv_cot_modulo_add(&mut self, choices: &[bool], bitwidth: u32) -> Result<Vec<u64>> {
        if !(1..=64).contains(&bitwidth) {
            bail!("Invalid correlated OT width {bitwidth}");
        }
        let count = choices.len();
        if count == 0 {
            return Ok(vec![]);
        }
        let batch = self.next_recv_batch();
        let pads = self.incoming.pads(batch, count, 2, bitwidth)?;
        let offsets = choices
            .iter()
            .zip(pads.iter())
            .map(|(b, (c, _))| (*b as u8) ^ (*c as u8))
            .collect();
        self.network.send(NetworkValue::VecU8(offsets))?;

        let masked = self.network.receive()?.into_words(bitwidth, count)?;
        let m = mask(bitwidth) as u64;
        Ok(choices
            .iter()
            .zip(pads)
            .zip(masked)
            .map(|((b, (_, pad)), y)| {
                let pad = pad as u64;
                if *b {
                    pad.wrapping_sub(y as u64) & m
                } else {
                    pad
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        execution::player::Identity, network::local::LocalNetworkingStore, ot::OtDealer,
    };
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::thread;
    use tracing_test::traced_test;

    fn ot_pair() -> Result<(PrecomputedOt, PrecomputedOt)> {
        let identities: Vec<Identity> = vec!["alice".into(), "bob".into()];
        let store = LocalNetworkingStore::from_host_ids(&identities, 1);
        let (alice_sends, bob_receives) = OtDealer::new([1; 32], [2; 32]).spawn()?;
        let (bob_sends, alice_receives) = OtDealer::new([3; 32], [4; 32]).spawn()?;
        let alice = PrecomputedOt::new(
            Box::new(store.get_local_network("alice".into(), "bob".into(), 0)),
            alice_sends,
            alice_receives,
        );
        let bob = PrecomputedOt::new(
            Box::new(store.get_local_network("bob".into(), "alice".into(), 0)),
            bob_sends,
            bob_receives,
        );
        Ok((alice, bob))
    }

    #[test]
    #[traced_test]
    fn test_1oon_delivers_chosen_message() -> Result<()> {
        let (mut alice, mut bob) = ot_pair()?;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let n = 16;
        let bitwidth = 100;
        let messages: Vec<u128> = (0..20 * n).map(|_| rng.gen::<u128>() & mask(bitwidth)).collect();
        let choices: Vec<u8> = (0..20).map(|_| rng.gen_range(0..n as u8)).collect();

        let sent = messages.clone();
        let sender = thread::spawn(move || -> Result<()> {
            alice.send_1oon(n, &sent, bitwidth)?;
            // a second batch in the other direction
            let back = alice.recv_1oo2(&[true, false], 8)?;
            assert_eq!(back, vec![11, 20]);
            Ok(())
        });
        let received = bob.recv_1oon(n, &choices, bitwidth)?;
        bob.send_1oo2(&[[10, 11], [20, 21]], 8)?;
        sender
            .join()
            .map_err(|_| eyre::eyre!("sender panicked"))??;

        for (i, (choice, out)) in choices.iter().zip(received).enumerate() {
            assert_eq!(out, messages[i * n + *choice as usize]);
        }
        Ok(())
    }

    #[test]
    fn test_cot_shares_sum_to_correlation() -> Result<()> {
        let (mut alice, mut bob) = ot_pair()?;
        let bitwidth = 37;
        let m = mask(bitwidth) as u64;
        let deltas: Vec<u64> = vec![0, 1, m, 12345, 1 << 36];
        let choices = vec![true, true, true, false, true];

        let sent = deltas.clone();
        let sender = thread::spawn(move || alice.send_cot_modulo_add(&sent, bitwidth));
        let received = bob.recv_cot_modulo_add(&choices, bitwidth)?;
        let own = sender
            .join()
            .map_err(|_| eyre::eyre!("sender panicked"))??;

        for i in 0..deltas.len() {
            let expected = if choices[i] { deltas[i] } else { 0 };
            assert_eq!(own[i].wrapping_add(received[i]) & m, expected);
        }
        Ok(())
    }

    #[test]
    fn test_rejected_choice_keeps_batches_aligned() -> Result<()> {
        let (mut alice, mut bob) = ot_pair()?;
        assert!(bob.recv_1oo4(&[4], 8).is_err());
        assert!(bob.recv_1oon(1, &[0], 8).is_err());

        // the next transfer still pairs with the sender's first batch
        let sender = thread::spawn(move || alice.send_1oo4(&[[10, 11, 12, 13]], 8));
        let received = bob.recv_1oo4(&[2], 8)?;
        sender
            .join()
            .map_err(|_| eyre::eyre!("sender panicked"))??;
        assert_eq!(received, vec![12]);
        Ok(())
    }
}
