//! Registry error types
//!
//! Every error returned by a registry operation means the request was a
//! no-op, or that it stopped partway with the previous valid state intact.

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Index does not refer to a configured camera
    InvalidIndex(usize),
    /// Camera name is empty after trimming
    EmptyName,
    /// Camera URL is empty after trimming
    EmptyUrl,
    /// Receiver factory could not create a receiver for the named camera
    ReceiverUnavailable(String),
    /// Sink factory could not create a sink for the named camera
    SinkUnavailable(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::InvalidIndex(index) => write!(f, "Invalid camera index: {}", index),
            RegistryError::EmptyName => write!(f, "Camera name is empty"),
            RegistryError::EmptyUrl => write!(f, "Camera URL is empty"),
            RegistryError::ReceiverUnavailable(name) => {
                write!(f, "Unable to create receiver for camera: {}", name)
            }
            RegistryError::SinkUnavailable(name) => {
                write!(f, "Unable to create sink for camera: {}", name)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
