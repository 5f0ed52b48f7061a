use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime identity of party.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Identity(s.to_string())
    }
}

/// Position of a party in a two-party protocol. The server drives the sender
/// side of every asymmetric step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    pub const ALICE: Role = Role::Server;
    pub const BOB: Role = Role::Client;

    /// `1` for the server, `2` for the client.
    pub fn index(&self) -> usize {
        match self {
            Role::Server => 1,
            Role::Client => 2,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, Error> {
        match index {
            1 => Ok(Role::Server),
            2 => Ok(Role::Client),
            _ => Err(Error::Conversion(format!("no role with index {index}"))),
        }
    }

    pub fn other(&self) -> Role {
        match self {
            Role::Server => Role::Client,
            Role::Client => Role::Server,
        }
    }

    pub fn is_server(&self) -> bool {
        *self == Role::Server
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}
