use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("failed to spawn event reader: {0}")]
    Spawn(String),
    #[error("event stream error: {0}")]
    Stream(String),
    #[error("event stream disconnected")]
    Disconnected,
    #[error("sensor switch write failed: {0}")]
    Switch(String),
}
