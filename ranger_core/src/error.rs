use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RangerError {
    #[error("line source error: {0}")]
    Source(String),
    #[error("sensor power error: {0}")]
    Power(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing line source")]
    MissingSource,
    #[error("missing sensor switch")]
    MissingSwitch,
    #[error("missing reading sink")]
    MissingSink,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
