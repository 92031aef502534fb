//! Synchronous handle-model backend.
//!
//! Every node owns a callback queue. Subscriptions and services push work
//! onto it, and nothing runs until the application thread calls
//! [`Backend::spin`] (which blocks) or [`Backend::spin_once`]. Service calls
//! block the calling thread on a persistent connection.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod callback_queue;
mod error;
mod time;

/// Topic advertisements.
pub mod publisher;

/// Persistent service connections.
pub mod service_client;

/// Service advertisements.
pub mod service_server;

/// Topic subscriptions.
pub mod subscriber;

pub use error::Error;
pub use publisher::BlockingPublisher;
pub use service_client::BlockingServiceClient;
pub use service_server::BlockingServiceServer;
pub use subscriber::BlockingSubscriber;
pub use time::WallStamp;

use callback_queue::{CallbackQueue, CallbackReceiver, Wait, callback_queue};

use compat_middleware::registry::Registry;
use compat_middleware::{
    Backend, BackendOptions, Callback, Message, ServiceCallback, ServiceType,
};

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Process-wide graph of topics and services, shared by every node.
static MASTER: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Options for the blocking backend.
#[derive(Clone, Debug)]
pub struct BlockingOptions {
    /// How long `spin` waits on an empty queue before re-checking whether
    /// it should stop.
    pub wake_interval: Duration,
}

impl Default for BlockingOptions {
    fn default() -> Self {
        Self {
            wake_interval: Duration::from_millis(100),
        }
    }
}

impl BackendOptions for BlockingOptions {}

/// Node context for the synchronous API generation.
pub struct BlockingBackend {
    node_name: String,
    options: BlockingOptions,
    queue: CallbackQueue,
    receiver: CallbackReceiver,
    interrupted: Arc<AtomicBool>,
    shutdown: AtomicBool,
    spinning: AtomicBool,
}

impl Debug for BlockingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingBackend")
            .field("node_name", &self.node_name)
            .field("options", &self.options)
            .field("pending", &self.receiver.pending())
            .field("shutdown", &self.shutdown)
            .field("spinning", &self.spinning)
            .finish_non_exhaustive()
    }
}

impl Backend for BlockingBackend {
    type Error = Error;
    type Options = BlockingOptions;
    type Stamp = WallStamp;
    type Publisher<T: Message> = BlockingPublisher<T>;
    type Subscription<T: Message> = BlockingSubscriber<T>;
    type Service<S: ServiceType> = BlockingServiceServer<S>;
    type Client<S: ServiceType> = BlockingServiceClient<S>;

    fn new(
        node_name: &str,
        options: BlockingOptions,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, Error> {
        let (queue, receiver) = callback_queue();
        debug!(node = node_name, ?options, "blocking context created");

        Ok(Self {
            node_name: node_name.to_string(),
            options,
            queue,
            receiver,
            interrupted,
            shutdown: AtomicBool::new(false),
            spinning: AtomicBool::new(false),
        })
    }

    fn advertise<T: Message>(
        &self,
        topic: &str,
        queue_size: usize,
    ) -> Result<BlockingPublisher<T>, Error> {
        BlockingPublisher::new(topic, queue_size)
    }

    fn subscribe<T: Message>(
        &self,
        topic: &str,
        queue_size: usize,
        callback: Callback<T>,
    ) -> Result<BlockingSubscriber<T>, Error> {
        BlockingSubscriber::new(topic, queue_size, callback, self.queue.clone())
    }

    fn advertise_service<S: ServiceType>(
        &self,
        name: &str,
        callback: ServiceCallback<S>,
    ) -> Result<BlockingServiceServer<S>, Error> {
        BlockingServiceServer::new(name, callback, self.queue.clone())
    }

    fn service_client<S: ServiceType>(&self, name: &str) -> Result<BlockingServiceClient<S>, Error> {
        BlockingServiceClient::new(name)
    }

    fn spin(&self) {
        if self.spinning.swap(true, Ordering::AcqRel) {
            warn!(node = %self.node_name, "spin ignored while another loop is dispatching");
            return;
        }
        debug!(node = %self.node_name, "spinning");

        while self.ok() {
            match self.receiver.wait(self.options.wake_interval) {
                Wait::Event(event) => event.dispatch(),
                Wait::Idle => {}
                Wait::Closed => break,
            }
        }

        self.spinning.store(false, Ordering::Release);
        debug!(node = %self.node_name, "spin returned");
    }

    fn spin_once(&self) {
        if self.spinning.swap(true, Ordering::AcqRel) {
            warn!(node = %self.node_name, "spin_once ignored while another loop is dispatching");
            return;
        }

        // Only what is queued now; events queued by these callbacks wait
        // for the next call.
        let pending = self.receiver.pending();
        for _ in 0..pending {
            if !self.ok() {
                break;
            }
            match self.receiver.try_next() {
                Some(event) => event.dispatch(),
                None => break,
            }
        }

        self.spinning.store(false, Ordering::Release);
    }

    fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            info!(node = %self.node_name, "shutdown requested");
        }
    }

    fn ok(&self) -> bool {
        !self.shutdown.load(Ordering::Acquire) && !self.interrupted.load(Ordering::Acquire)
    }

    fn now(&self) -> WallStamp {
        WallStamp::now()
    }
}
