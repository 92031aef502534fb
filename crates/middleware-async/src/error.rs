use compat_middleware::BackendError;
use compat_middleware::registry::RegistryError;

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the async backend.
#[derive(Debug, Error)]
pub enum Error {
    /// A blocking call was made from inside an async context.
    #[error("blocking call to '{0}' from inside an async context")]
    AsyncContext(String),

    /// The topic or service registry rejected the endpoint.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The runtime could not be built.
    #[error("failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The service callback answered `None`.
    #[error("service '{0}' declined the request")]
    Declined(String),

    /// No answer arrived before the deadline.
    #[error("service '{0}' did not answer within {1:?}")]
    Timeout(String, Duration),

    /// The service is not advertised, or went away mid-request.
    #[error("service '{0}' is unavailable")]
    Unavailable(String),
}

impl BackendError for Error {}
