pub mod error;
pub mod execution;
pub mod network;
pub mod ot;
pub mod protocol;
pub mod shares;
pub mod test_utils;
