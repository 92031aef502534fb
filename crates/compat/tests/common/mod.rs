//! Common setup for integration tests
#![allow(dead_code)]

use compat::{Node, NodeOptions, NodeState, ServiceType};

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Per-attempt bound used by every test node.
pub const CALL_TIMEOUT: Duration = Duration::from_millis(300);

/// Request/response pair of the arithmetic test service.
pub struct AddTwoInts;

impl ServiceType for AddTwoInts {
    type Request = (i64, i64);
    type Response = i64;
}

/// Initializes the process node without touching signal dispositions.
pub fn init_node(name: &str) -> Node {
    let _ = tracing_subscriber::fmt::try_init();
    let options = NodeOptions {
        call_timeout: CALL_TIMEOUT,
        install_signal_handler: false,
        ..NodeOptions::default()
    };
    Node::init_with_options(Vec::<String>::new(), name, options).unwrap()
}

/// Runs `spin` on another thread. With the async backend the thread
/// returns at once and the node keeps dispatching in the background.
pub fn spin_in_background(node: &Node) -> JoinHandle<()> {
    let node = node.clone();
    thread::spawn(move || node.spin())
}

/// Polls `condition` for up to two seconds.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Shuts the node down and waits for its dispatch loop to finish.
pub fn stop(node: &Node, spinner: JoinHandle<()>) {
    node.shutdown();
    spinner.join().unwrap();
    assert!(wait_until(|| node.state() == NodeState::Terminated));
}
