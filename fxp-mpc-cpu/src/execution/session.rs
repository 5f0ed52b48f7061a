use crate::{execution::player::Role, ot::ObliviousTransfer, protocol::prf::Prf};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u128);

impl From<u128> for SessionId {
    fn from(id: u128) -> Self {
        SessionId(id)
    }
}

/// Per-worker protocol context. The role is fixed at construction; the OT
/// endpoint owns the worker's sub-channel.
pub struct Session {
    pub session_id: SessionId,
    pub own_role: Role,
    pub ot: Box<dyn ObliviousTransfer>,
    pub prf: Prf,
}

impl Session {
    pub fn new(
        session_id: SessionId,
        own_role: Role,
        ot: Box<dyn ObliviousTransfer>,
        prf: Prf,
    ) -> Self {
        Self {
            session_id,
            own_role,
            ot,
            prf,
        }
    }

    pub fn own_role(&self) -> Role {
        self.own_role
    }

    pub fn is_server(&self) -> bool {
        self.own_role.is_server()
    }

    pub fn ot_mut(&mut self) -> &mut dyn ObliviousTransfer {
        self.ot.as_mut()
    }
}
