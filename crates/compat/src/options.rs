use crate::backend::ActiveOptions;

use std::time::Duration;

/// Options for a node.
#[derive(Clone, Debug)]
pub struct NodeOptions {
    /// Wait bound for each attempt of `Client::call`.
    pub call_timeout: Duration,

    /// Whether SIGINT and SIGTERM flip the node's interrupt flag.
    pub install_signal_handler: bool,

    /// Options passed through to the active backend.
    pub backend: ActiveOptions,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            install_signal_handler: true,
            backend: Default::default(),
        }
    }
}
