use thiserror::Error;

/// An Error enum capturing the configuration errors produced by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is absent
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
    /// A setting is out of its accepted range
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
