use crate::network::value::NetworkValue;
use eyre::Result;

/// Requirements for networking. A value is a point-to-point message towards
/// the single peer of a two-party session; calls block until done.
pub trait Networking: Send {
    fn send(&mut self, value: NetworkValue) -> Result<()>;

    fn receive(&mut self) -> Result<NetworkValue>;
}

impl<N: Networking + ?Sized> Networking for Box<N> {
    fn send(&mut self, value: NetworkValue) -> Result<()> {
        (**self).send(value)
    }

    fn receive(&mut self) -> Result<NetworkValue> {
        (**self).receive()
    }
}

pub mod local;
pub mod value;
