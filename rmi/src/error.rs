use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failures of the RMI layer (spec.md §7's transport kinds).
///
/// A single `RemoteError` variant covers connection failure, marshalling
/// failure, and a transport-level error reported by the peer — the stub
/// does not distinguish between them, per spec.md §4.B.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RmiError {
    #[error("remote call failed: {0}")]
    RemoteError(String),
    #[error("skeleton has no bound address and was not started")]
    NotStarted,
    #[error("cannot resolve an unspecified wildcard address for a stub")]
    UnknownHost,
    #[error("interface does not declare RemoteError in its failure set: {0}")]
    NotRemoteInterface(String),
    #[error("skeleton is already running")]
    AlreadyStarted,
}

impl RmiError {
    pub fn from_io(e: std::io::Error) -> Self {
        RmiError::RemoteError(e.to_string())
    }
}
