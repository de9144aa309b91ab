//! Server-facing error taxonomy.

use polyrpc_net::TransportError;
use polyrpc_system::RegistryError;
use polyrpc_types::CallStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ServerError {
    #[must_use]
    pub fn as_call_status(&self) -> CallStatus {
        match self {
            Self::Transport(error) => error.as_call_status(),
            Self::Registry(RegistryError::DuplicateService { .. } | RegistryError::DuplicateMethod { .. }) => {
                CallStatus::UndefinedError
            }
        }
    }
}
