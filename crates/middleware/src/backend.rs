use crate::client::ClientHandle;
use crate::message::{Callback, Message, ServiceCallback, ServiceType};
use crate::publisher::PublisherHandle;
use crate::time::Time;

use std::error::Error;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Marker trait for backend errors.
pub trait BackendError: Error + Send + Sync + 'static {}

/// Marker trait for backend options.
pub trait BackendOptions: Clone + Debug + Default + Send + Sync + 'static {}

/// One generation of the middleware API, adapted to a uniform surface.
///
/// A backend value is the execution context of a single node: it owns the
/// queue that inbound deliveries and service requests land in, and the
/// dispatch loop that drains that queue into callbacks one at a time.
///
/// Channel handles returned by a backend unregister themselves on drop.
pub trait Backend
where
    Self: Debug + Send + Sync + Sized + 'static,
{
    /// The error type for the backend.
    type Error: BackendError;

    /// The options for the backend.
    type Options: BackendOptions;

    /// The native timestamp representation of this API generation.
    type Stamp: Copy + Debug + From<Time> + Into<Time>;

    /// Publisher handle type.
    type Publisher<T: Message>: PublisherHandle<T>;

    /// Subscription handle type. Dropping it stops deliveries.
    type Subscription<T: Message>: Debug + Send + Sync;

    /// Service server handle type. Dropping it withdraws the service.
    type Service<S: ServiceType>: Debug + Send + Sync;

    /// Service client handle type.
    type Client<S: ServiceType>: ClientHandle<S, Error = Self::Error>;

    /// Creates the execution context for the node with the given fully
    /// qualified name.
    ///
    /// `interrupted` is flipped externally (signal handlers) and must be
    /// observed by the dispatch loop.
    ///
    /// # Errors
    /// Returns an error if the underlying context cannot be created.
    fn new(
        node_name: &str,
        options: Self::Options,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, Self::Error>;

    /// Advertises a topic.
    ///
    /// # Errors
    /// Returns an error if the topic is bound to another message type.
    fn advertise<T: Message>(
        &self,
        topic: &str,
        queue_size: usize,
    ) -> Result<Self::Publisher<T>, Self::Error>;

    /// Subscribes to a topic.
    ///
    /// # Errors
    /// Returns an error if the topic is bound to another message type.
    fn subscribe<T: Message>(
        &self,
        topic: &str,
        queue_size: usize,
        callback: Callback<T>,
    ) -> Result<Self::Subscription<T>, Self::Error>;

    /// Advertises a service.
    ///
    /// # Errors
    /// Returns an error if the name is already advertised.
    fn advertise_service<S: ServiceType>(
        &self,
        name: &str,
        callback: ServiceCallback<S>,
    ) -> Result<Self::Service<S>, Self::Error>;

    /// Acquires a client handle for a service name.
    ///
    /// # Errors
    /// Returns an error if the name is bound to another service type.
    fn service_client<S: ServiceType>(&self, name: &str) -> Result<Self::Client<S>, Self::Error>;

    /// Runs the dispatch loop until shutdown or interruption.
    ///
    /// Whether this blocks the calling thread is backend-defined.
    fn spin(&self);

    /// Dispatches every event queued at the time of the call, then returns.
    fn spin_once(&self);

    /// Whether a dispatch loop is currently running.
    fn is_spinning(&self) -> bool;

    /// Requests the dispatch loop to stop. Idempotent.
    fn shutdown(&self);

    /// Whether the context may still operate.
    fn ok(&self) -> bool;

    /// Current time from the backend clock.
    fn now(&self) -> Self::Stamp;
}
