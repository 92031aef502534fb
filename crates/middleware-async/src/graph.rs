use compat_middleware::registry::Registry;

use std::sync::LazyLock;

use tokio::sync::watch;

/// Process-wide discovery graph shared by every node.
pub static GRAPH: LazyLock<Graph> = LazyLock::new(Graph::new);

/// The endpoint registry plus a generation counter that is bumped on
/// every change, so waiters can sleep until the graph moves.
#[derive(Debug)]
pub struct Graph {
    registry: Registry,
    generation: watch::Sender<u64>,
}

impl Graph {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            generation: watch::Sender::new(0),
        }
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn notify(&self) {
        self.generation
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    pub fn changes(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}
