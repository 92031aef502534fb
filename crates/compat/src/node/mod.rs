mod remap;

use crate::backend::ActiveBackend;
use crate::error::Error;
use crate::options::NodeOptions;

use remap::{Arguments, Remappings};

use compat_middleware::{Backend, Time, names};

use std::fmt::{self, Debug};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, LazyLock, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use signal_hook::SigId;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use tracing::{debug, info, warn};

/// The node of this process. The slot stays occupied until the node's
/// teardown has finished, not just until its last handle is gone.
static LIVE: LazyLock<Mutex<Slot>> = LazyLock::new(|| Mutex::new(Slot::default()));

/// Signalled when an occupied slot is released.
static RELEASED: Condvar = Condvar::new();

#[derive(Default)]
struct Slot {
    node: Weak<Inner>,
    occupied: bool,
}

/// Frees the slot. Declared as the last field of [`Inner`] so it runs after
/// the backend and the signal registrations are torn down.
struct SlotRelease;

impl Drop for SlotRelease {
    fn drop(&mut self) {
        LIVE.lock().occupied = false;
        RELEASED.notify_all();
    }
}

/// Lifecycle of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    /// No node is live.
    Uninitialized,
    /// Initialized, not dispatching.
    Initialized,
    /// A dispatch loop is running.
    Spinning,
    /// Shutdown was requested and the dispatch loop has not wound down yet.
    ShuttingDown,
    /// Shut down; no loop is running.
    Terminated,
}

struct Inner {
    name: String,
    namespace: String,
    fully_qualified_name: String,
    remappings: Remappings,
    call_timeout: Duration,
    backend: ActiveBackend,
    signals: Vec<SigId>,
    _release: SlotRelease,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.backend.shutdown();
        for id in self.signals.drain(..) {
            signal_hook::low_level::unregister(id);
        }
        info!(node = %self.fully_qualified_name, "node released");
    }
}

/// The execution context that drives every callback of this process.
///
/// At most one node is live at a time. Cloning a `Node` shares the same
/// context; every channel keeps a clone, so the context stays up until the
/// last channel and the last handle are dropped.
#[derive(Clone)]
pub struct Node {
    inner: Arc<Inner>,
}

impl Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.inner.fully_qualified_name)
            .field("call_timeout", &self.inner.call_timeout)
            .field("backend", &self.inner.backend)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Initializes the process node with default options.
    ///
    /// `args` are scanned for `key:=value` remapping pairs; everything else
    /// is ignored.
    ///
    /// # Errors
    /// Returns an error if a node is already live, if the name or namespace
    /// is malformed, or if the backend cannot start.
    pub fn init<I, A>(args: I, name: &str) -> Result<Self, Error>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        Self::init_with_options(args, name, NodeOptions::default())
    }

    /// Initializes the process node.
    ///
    /// # Errors
    /// Returns an error if a node is already live, if the name or namespace
    /// is malformed, or if the backend cannot start.
    pub fn init_with_options<I, A>(args: I, name: &str, options: NodeOptions) -> Result<Self, Error>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let mut live = LIVE.lock();
        while live.occupied && live.node.strong_count() == 0 {
            debug!("waiting for the previous node to finish its teardown");
            RELEASED.wait(&mut live);
        }
        if live.occupied {
            return Err(Error::AlreadyInitialized);
        }

        let arguments = Arguments::parse(args);
        let name = arguments.node_name.as_deref().unwrap_or(name);
        names::validate_node_name(name)?;
        let namespace = names::normalize_namespace(arguments.namespace.as_deref().unwrap_or("/"))?;
        let fully_qualified_name = names::node_fqn(&namespace, name);
        let remappings = Remappings::resolve(&arguments.remaps, &namespace, name);

        let interrupted = Arc::new(AtomicBool::new(false));
        let backend = ActiveBackend::new(
            &fully_qualified_name,
            options.backend,
            Arc::clone(&interrupted),
        )?;

        let signals = if options.install_signal_handler {
            register_signals(&interrupted)
        } else {
            Vec::new()
        };

        let inner = Arc::new(Inner {
            name: name.to_string(),
            namespace,
            fully_qualified_name,
            remappings,
            call_timeout: options.call_timeout,
            backend,
            signals,
            _release: SlotRelease,
        });
        live.node = Arc::downgrade(&inner);
        live.occupied = true;

        info!(node = %inner.fully_qualified_name, "node initialized");
        Ok(Self { inner })
    }

    /// Returns the live node.
    ///
    /// # Panics
    /// Panics if no node is live. Calling this before [`Node::init`] is a
    /// programming error.
    #[must_use]
    #[track_caller]
    pub fn get() -> Self {
        match Self::try_get() {
            Some(node) => node,
            None => panic!("Node::get called before Node::init"),
        }
    }

    /// Returns the live node, if any.
    #[must_use]
    pub fn try_get() -> Option<Self> {
        LIVE.lock().node.upgrade().map(|inner| Self { inner })
    }

    /// Lifecycle state of the process, `Uninitialized` if no node is live.
    #[must_use]
    pub fn process_state() -> NodeState {
        Self::try_get().map_or(NodeState::Uninitialized, |node| node.state())
    }

    /// Whether the node may still operate.
    ///
    /// False after [`Node::shutdown`] or once an interrupt was observed.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.inner.backend.ok()
    }

    /// Runs the dispatch loop until shutdown or interruption.
    ///
    /// With the blocking backend this blocks the calling thread. With the
    /// async backend the loop moves to a background thread and this
    /// returns at once. Callbacks never run concurrently either way.
    pub fn spin(&self) {
        debug!(node = %self.inner.fully_qualified_name, "spin");
        self.inner.backend.spin();
    }

    /// Dispatches the events already queued, then returns.
    pub fn spin_once(&self) {
        self.inner.backend.spin_once();
    }

    /// Asks the dispatch loop to stop.
    ///
    /// Idempotent and safe to call from inside a callback. In-flight client
    /// calls are not interrupted.
    pub fn shutdown(&self) {
        self.inner.backend.shutdown();
    }

    /// Current time from the backend clock.
    #[must_use]
    pub fn current_time(&self) -> Time {
        self.inner.backend.now().into()
    }

    /// Lifecycle state of this node.
    #[must_use]
    pub fn state(&self) -> NodeState {
        let spinning = self.inner.backend.is_spinning();
        match (self.inner.backend.ok(), spinning) {
            (true, true) => NodeState::Spinning,
            (true, false) => NodeState::Initialized,
            (false, true) => NodeState::ShuttingDown,
            (false, false) => NodeState::Terminated,
        }
    }

    /// The node name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The node namespace, `/` by default.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    /// Namespace and name joined.
    #[must_use]
    pub fn fully_qualified_name(&self) -> &str {
        &self.inner.fully_qualified_name
    }

    /// Resolves a topic or service name against this node and applies the
    /// remappings given at init.
    ///
    /// # Errors
    /// Returns an error if the name is malformed.
    pub fn resolve_name(&self, name: &str) -> Result<String, Error> {
        let resolved = names::resolve(&self.inner.namespace, &self.inner.name, name)?;
        Ok(self.inner.remappings.apply(resolved))
    }

    /// The bound for each attempt of a client call.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        self.inner.call_timeout
    }

    pub(crate) fn backend(&self) -> &ActiveBackend {
        &self.inner.backend
    }
}

fn register_signals(interrupted: &Arc<AtomicBool>) -> Vec<SigId> {
    let mut ids = Vec::new();
    for signal in [SIGINT, SIGTERM] {
        match flag::register(signal, Arc::clone(interrupted)) {
            Ok(id) => ids.push(id),
            Err(error) => warn!(signal, %error, "failed to register signal handler"),
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::thread;
    use std::time::Instant;

    use serial_test::serial;

    fn quiet() -> NodeOptions {
        let _ = tracing_subscriber::fmt::try_init();
        NodeOptions {
            install_signal_handler: false,
            ..NodeOptions::default()
        }
    }

    #[test]
    #[serial]
    fn test_init_then_get() {
        let node = Node::init(Vec::<String>::new(), "n1").unwrap();
        let again = Node::get();

        assert_eq!(again.name(), "n1");
        assert_eq!(again.namespace(), "/");
        assert_eq!(again.fully_qualified_name(), "/n1");
        assert!(Arc::ptr_eq(&node.inner, &again.inner));
    }

    #[test]
    #[serial]
    fn test_double_init_rejected() {
        let _node = Node::init_with_options(["x"], "n1", quiet()).unwrap();
        let second = Node::init_with_options(["x"], "n2", quiet());

        assert!(matches!(second, Err(Error::AlreadyInitialized)));
    }

    #[test]
    #[serial]
    fn test_slot_freed_on_drop() {
        let node = Node::init_with_options(Vec::<&str>::new(), "n1", quiet()).unwrap();
        drop(node);

        assert!(Node::try_get().is_none());
        assert_eq!(Node::process_state(), NodeState::Uninitialized);
        assert!(Node::init_with_options(Vec::<&str>::new(), "n1", quiet()).is_ok());
    }

    #[test]
    #[serial]
    fn test_init_waits_for_previous_teardown() {
        let options = quiet();
        // Last handle gone, teardown still running.
        LIVE.lock().occupied = true;
        let releaser = thread::spawn(|| {
            thread::sleep(Duration::from_millis(50));
            drop(SlotRelease);
        });

        let started = Instant::now();
        let node = Node::init_with_options(Vec::<&str>::new(), "n1", options).unwrap();

        assert!(started.elapsed() >= Duration::from_millis(45));
        assert!(node.ok());
        releaser.join().unwrap();
    }

    #[test]
    #[serial]
    fn test_reinit_after_release_on_other_thread() {
        let node = Node::init_with_options(Vec::<&str>::new(), "n1", quiet()).unwrap();
        thread::spawn(move || drop(node)).join().unwrap();

        let node = Node::init_with_options(Vec::<&str>::new(), "n2", quiet()).unwrap();
        assert_eq!(node.fully_qualified_name(), "/n2");
    }

    #[test]
    #[serial]
    fn test_invalid_names_rejected() {
        for name in ["", "1abc", "with space", "a/b"] {
            let result = Node::init_with_options(Vec::<&str>::new(), name, quiet());
            assert!(matches!(result, Err(Error::Name(_))), "accepted {name:?}");
        }
        assert!(Node::try_get().is_none());
    }

    #[test]
    #[serial]
    fn test_arguments_override_name_and_namespace() {
        let node =
            Node::init_with_options(["prog", "__name:=talker", "__ns:=robot"], "n1", quiet())
                .unwrap();

        assert_eq!(node.name(), "talker");
        assert_eq!(node.namespace(), "/robot");
        assert_eq!(node.fully_qualified_name(), "/robot/talker");
    }

    #[test]
    #[serial]
    fn test_resolve_name_applies_remaps() {
        let node = Node::init_with_options(["chatter:=/remapped"], "n1", quiet()).unwrap();

        assert_eq!(node.resolve_name("chatter").unwrap(), "/remapped");
        assert_eq!(node.resolve_name("other").unwrap(), "/other");
        assert_eq!(node.resolve_name("~private").unwrap(), "/n1/private");
        assert!(node.resolve_name("bad name").is_err());
    }

    #[test]
    #[serial]
    fn test_shutdown_without_spin() {
        let node = Node::init_with_options(Vec::<&str>::new(), "n1", quiet()).unwrap();
        assert_eq!(node.state(), NodeState::Initialized);
        assert!(node.ok());

        node.shutdown();
        node.shutdown();

        assert!(!node.ok());
        assert_eq!(node.state(), NodeState::Terminated);
    }

    #[test]
    #[serial]
    fn test_current_time_advances() {
        let node = Node::init_with_options(Vec::<&str>::new(), "n1", quiet()).unwrap();
        let first = node.current_time();
        std::thread::sleep(Duration::from_millis(5));
        let second = node.current_time();

        assert!(first.seconds() > 0);
        assert!(second > first);
    }

    #[test]
    #[serial]
    #[should_panic(expected = "Node::get called before Node::init")]
    fn test_get_before_init_panics() {
        let _ = Node::get();
    }
}
