use crate::{
    execution::{
        party::Party,
        player::{Identity, Role},
        session::{Session, SessionId},
    },
    network::local::LocalNetworkingStore,
    ot::{OtDealer, PrecomputedOt},
    protocol::{engine::DivisionEngine, prf::Prf},
};
use eyre::Result;
use fxp_mpc_common::SessionConfig;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tracing::info;

pub fn generate_local_identities() -> Vec<Identity> {
    vec![Identity::from("alice"), Identity::from("bob")]
}

/// Both parties of a computation wired together inside one process.
#[derive(Debug, Clone)]
pub struct LocalRuntime;

impl LocalRuntime {
    /// Builds a connected server/client pair from `config`. Worker `i` of the
    /// server runs as server when `i` is even and as client when odd; the
    /// client's workers take the complementary roles.
    pub fn new(config: &SessionConfig) -> Result<(Party, Party)> {
        let engine = DivisionEngine::from_config(config)?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let (server_workers, client_workers) = Self::worker_sessions(config.num_threads, seed)?;
        let identities = generate_local_identities();
        info!(
            backend = %config.backend,
            workers = config.num_threads,
            "local runtime ready"
        );
        Ok((
            Party::new(identities[0].clone(), Role::ALICE, engine, server_workers),
            Party::new(identities[1].clone(), Role::BOB, engine, client_workers),
        ))
    }

    /// Paired worker sessions on one sub-channel each.
    pub fn worker_sessions(num_workers: usize, seed: u64) -> Result<(Vec<Session>, Vec<Session>)> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let identities = generate_local_identities();
        let (alice, bob) = (&identities[0], &identities[1]);
        let store = LocalNetworkingStore::from_host_ids(&identities, num_workers);

        let mut server = Vec::with_capacity(num_workers);
        let mut client = Vec::with_capacity(num_workers);
        for i in 0..num_workers {
            let (alice_sends, bob_receives) = OtDealer::from_rng(&mut rng).spawn()?;
            let (bob_sends, alice_receives) = OtDealer::from_rng(&mut rng).spawn()?;
            let alice_role = if i % 2 == 0 { Role::ALICE } else { Role::BOB };
            let session_id = SessionId::from(i as u128);

            let alice_ot = PrecomputedOt::new(
                Box::new(store.get_local_network(alice.clone(), bob.clone(), i)),
                alice_sends,
                alice_receives,
            );
            let bob_ot = PrecomputedOt::new(
                Box::new(store.get_local_network(bob.clone(), alice.clone(), i)),
                bob_sends,
                bob_receives,
            );
            server.push(Session::new(
                session_id,
                alice_role,
                Box::new(alice_ot),
                Prf::new(rng.gen()),
            ));
            client.push(Session::new(
                session_id,
                alice_role.other(),
                Box::new(bob_ot),
                Prf::new(rng.gen()),
            ));
        }
        Ok((server, client))
    }

    /// A single server/client session pair.
    pub fn session_pair(seed: u64) -> Result<(Session, Session)> {
        let (mut server, mut client) = Self::worker_sessions(1, seed)?;
        match (server.pop(), client.pop()) {
            (Some(s), Some(c)) => Ok((s, c)),
            _ => eyre::bail!("no worker sessions were created"),
        }
    }
}
