pub mod local;
pub mod party;
pub mod player;
pub mod session;
