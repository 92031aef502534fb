use compat_middleware::{Event, EventSink};

use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender};

/// The per-node queue that subscriptions and services push callback work
/// onto.
///
/// Cloned senders are handed to every endpoint the node creates; the node
/// keeps the only receiver and drains it from whichever thread spins.
#[derive(Clone, Debug)]
pub struct CallbackQueue {
    sender: Sender<Event>,
}

impl EventSink for CallbackQueue {
    fn submit(&self, event: Event) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Outcome of waiting on the queue for one event.
pub enum Wait {
    /// An event arrived.
    Event(Event),
    /// The wake interval elapsed first.
    Idle,
    /// Every sender is gone.
    Closed,
}

/// The draining side of a [`CallbackQueue`].
#[derive(Debug)]
pub struct CallbackReceiver {
    receiver: Receiver<Event>,
}

impl CallbackReceiver {
    /// Waits up to `interval` for the next event.
    pub fn wait(&self, interval: Duration) -> Wait {
        match self.receiver.recv_timeout(interval) {
            Ok(event) => Wait::Event(event),
            Err(RecvTimeoutError::Timeout) => Wait::Idle,
            Err(RecvTimeoutError::Disconnected) => Wait::Closed,
        }
    }

    /// Takes the next event without waiting.
    pub fn try_next(&self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    /// Number of events currently queued.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

/// Creates a connected queue pair.
pub fn callback_queue() -> (CallbackQueue, CallbackReceiver) {
    let (sender, receiver) = flume::unbounded();
    (CallbackQueue { sender }, CallbackReceiver { receiver })
}
