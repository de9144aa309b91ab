//! Registry-level errors: duplicates on registration are a fatal
//! configuration error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service {service:?} is already registered")]
    DuplicateService { service: String },
    #[error("method {service:?}/{method:?} is already registered")]
    DuplicateMethod { service: String, method: String },
}
