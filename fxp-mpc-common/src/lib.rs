pub mod config;
pub mod error;
pub mod tracing;

pub use config::{Backend, SessionConfig, MAX_THREADS};
