use crate::{
    execution::player::Identity,
    network::{value::NetworkValue, Networking},
};
use dashmap::DashMap;
use eyre::eyre;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Value {
    value: Vec<u8>,
}

/// Channels keyed by `(from, to, stream)`.
type P2PChannels = Arc<
    DashMap<
        (Identity, Identity, usize),
        (
            Arc<async_channel::Sender<Value>>,
            Arc<async_channel::Receiver<Value>>,
        ),
    >,
>;

#[derive(Debug, Clone)]
pub struct LocalNetworkingStore {
    p2p_channels: P2PChannels,
}

impl LocalNetworkingStore {
    pub fn from_host_ids(identities: &[Identity], num_streams: usize) -> Self {
        let p2p = DashMap::new();
        for v1 in identities.iter() {
            for v2 in identities.iter() {
                if v1 != v2 {
                    for stream in 0..num_streams {
                        let (tx, rx) = async_channel::unbounded::<Value>();
                        p2p.insert(
                            (v1.clone(), v2.clone(), stream),
                            (Arc::new(tx), Arc::new(rx)),
                        );
                    }
                }
            }
        }
        LocalNetworkingStore {
            p2p_channels: Arc::new(p2p),
        }
    }

    pub fn get_local_network(
        &self,
        owner: Identity,
        peer: Identity,
        stream: usize,
    ) -> LocalNetworking {
        LocalNetworking {
            p2p_channels: Arc::clone(&self.p2p_channels),
            owner,
            peer,
            stream,
        }
    }
}

/// One endpoint of an in-process sub-channel. The async channels are driven
/// with their blocking API from the worker threads.
#[derive(Debug)]
pub struct LocalNetworking {
    p2p_channels: P2PChannels,
    pub owner: Identity,
    pub peer: Identity,
    pub stream: usize,
}

impl Networking for LocalNetworking {
    fn send(&mut self, value: NetworkValue) -> eyre::Result<()> {
        let (tx, _) = self
            .p2p_channels
            .get(&(self.owner.clone(), self.peer.clone(), self.stream))
            .ok_or_else(|| {
                eyre!(
                    "p2p channel retrieve error when sending: owner: {:?}, receiver: {:?}, \
                     stream {}",
                    self.owner,
                    self.peer,
                    self.stream
                )
            })?
            .value()
            .clone();

        let ready_to_send_value = Value {
            value: value.to_network(),
        };
        metrics::counter!("smpc.network.bytes_sent")
            .increment(ready_to_send_value.value.len() as u64);
        tx.send_blocking(ready_to_send_value)
            .map_err(|e| eyre!("send on stream {} failed: {e}", self.stream))
    }

    fn receive(&mut self) -> eyre::Result<NetworkValue> {
        let (_, rx) = self
            .p2p_channels
            .get(&(self.peer.clone(), self.owner.clone(), self.stream))
            .ok_or_else(|| {
                eyre!(
                    "p2p channel retrieve error when receiving: owner: {:?}, sender: {:?}, \
                     stream {}",
                    self.owner,
                    self.peer,
                    self.stream
                )
            })?
            .value()
            .clone();

        let received_value = rx.recv_blocking()?;
        NetworkValue::from_network_slice(&received_value.value)
    }
}
