use compat_middleware::{Event, EventSink};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Hands events to the node's executor.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: UnboundedSender<Event>,
}

impl EventSink for EventSender {
    fn submit(&self, event: Event) -> bool {
        self.sender.send(event).is_ok()
    }
}

enum Step {
    Event(Event),
    Idle,
    Stop,
}

/// Drains a node's events into callbacks, either on a background thread
/// (`start`) or inline on the caller (`run_pending`).
///
/// The receiver lives in a shared slot. Whoever drains takes it out and
/// puts it back when done, so at most one drain runs at a time.
#[derive(Debug)]
pub struct Executor {
    node_name: String,
    handle: Handle,
    wake_interval: Duration,
    slot: Arc<Mutex<Option<UnboundedReceiver<Event>>>>,
    token: CancellationToken,
    interrupted: Arc<AtomicBool>,
    spinning: Arc<AtomicBool>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Executor {
    pub fn new(
        node_name: &str,
        handle: Handle,
        wake_interval: Duration,
        interrupted: Arc<AtomicBool>,
    ) -> (Self, EventSender) {
        let (sender, receiver) = unbounded_channel();
        let executor = Self {
            node_name: node_name.to_string(),
            handle,
            wake_interval,
            slot: Arc::new(Mutex::new(Some(receiver))),
            token: CancellationToken::new(),
            interrupted,
            spinning: Arc::new(AtomicBool::new(false)),
            thread: Mutex::new(None),
        };
        (executor, EventSender { sender })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    pub fn ok(&self) -> bool {
        !self.token.is_cancelled() && !self.interrupted.load(Ordering::Acquire)
    }

    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    /// Cancels the background loop. Returns `false` if already cancelled.
    pub fn cancel(&self) -> bool {
        let first = !self.token.is_cancelled();
        self.token.cancel();
        first
    }

    /// Starts draining on a dedicated thread and returns immediately.
    pub fn start(&self) {
        if !self.ok() {
            debug!(node = %self.node_name, "not starting executor after shutdown");
            return;
        }
        let Some(mut receiver) = self.slot.lock().take() else {
            warn!(node = %self.node_name, "spin called while already spinning");
            return;
        };

        self.spinning.store(true, Ordering::Release);

        let handle = self.handle.clone();
        let wake_interval = self.wake_interval;
        let slot = Arc::clone(&self.slot);
        let token = self.token.clone();
        let interrupted = Arc::clone(&self.interrupted);
        let spinning = Arc::clone(&self.spinning);
        let node_name = self.node_name.clone();

        let spawned = thread::Builder::new()
            .name(format!("executor{}", self.node_name.replace('/', "-")))
            .spawn(move || {
                debug!(node = %node_name, "executor started");
                loop {
                    if token.is_cancelled() || interrupted.load(Ordering::Acquire) {
                        break;
                    }

                    // Callbacks run outside block_on so they may block on
                    // service calls themselves.
                    let step = handle.block_on(async {
                        tokio::select! {
                            biased;
                            () = token.cancelled() => Step::Stop,
                            event = receiver.recv() => event.map_or(Step::Stop, Step::Event),
                            () = tokio::time::sleep(wake_interval) => Step::Idle,
                        }
                    });

                    match step {
                        Step::Event(event) => event.dispatch(),
                        Step::Idle => {}
                        Step::Stop => break,
                    }
                }

                *slot.lock() = Some(receiver);
                spinning.store(false, Ordering::Release);
                debug!(node = %node_name, "executor stopped");
            });

        match spawned {
            Ok(thread) => *self.thread.lock() = Some(thread),
            Err(error) => self.abort_start(&error),
        }
    }

    fn abort_start(&self, error: &io::Error) {
        // The closure, and the receiver with it, is gone.
        self.spinning.store(false, Ordering::Release);
        self.token.cancel();
        warn!(node = %self.node_name, %error, "failed to spawn executor thread");
    }

    /// Dispatches the events queued right now on the calling thread.
    pub fn run_pending(&self) {
        let Some(mut receiver) = self.slot.lock().take() else {
            warn!(node = %self.node_name, "spin_once ignored while the executor is draining");
            return;
        };

        let pending = receiver.len();
        for _ in 0..pending {
            if !self.ok() {
                break;
            }
            match receiver.try_recv() {
                Ok(event) => event.dispatch(),
                Err(_) => break,
            }
        }

        *self.slot.lock() = Some(receiver);
    }

    /// Cancels the loop and waits for the thread, unless called from it.
    pub fn stop(&self) {
        self.token.cancel();
        let thread = self.thread.lock().take();
        if let Some(thread) = thread {
            if thread.thread().id() == thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                warn!(node = %self.node_name, "executor thread panicked");
            }
        }
    }
}
