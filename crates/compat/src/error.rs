use crate::backend::ActiveError;

use compat_middleware::names::NameError;

use thiserror::Error;

/// Errors that can occur when setting up a node or its channels.
///
/// These are construction failures. Once a channel exists, runtime
/// failures are reported through return values (`CallStatus`, `bool`).
#[derive(Debug, Error)]
pub enum Error {
    /// `Node::init` was called while a node is live.
    #[error("a node is already initialized in this process")]
    AlreadyInitialized,

    /// The backend rejected the operation.
    #[error(transparent)]
    Backend(#[from] ActiveError),

    /// A node, namespace, topic or service name is malformed.
    #[error(transparent)]
    Name(#[from] NameError),
}
