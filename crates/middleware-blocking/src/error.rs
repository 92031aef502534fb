use compat_middleware::BackendError;
use compat_middleware::registry::RegistryError;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the blocking backend.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// The topic or service registry rejected the endpoint.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The service callback answered `None`.
    #[error("service '{0}' declined the request")]
    Declined(String),

    /// No answer arrived before the deadline.
    #[error("service '{0}' did not answer within {1:?}")]
    Timeout(String, Duration),

    /// The service is not advertised, or the connection to it was lost.
    #[error("service '{0}' is unavailable")]
    Unavailable(String),
}

impl BackendError for Error {}
