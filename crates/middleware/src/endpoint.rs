use crate::dispatch::{Dispatch, EventSink};
use crate::message::{Callback, Message, Request, Response, ServiceCallback, ServiceType};
use crate::queue::BoundedQueue;

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{trace, warn};
use uuid::Uuid;

/// The receiving end of one subscription.
///
/// Inbound messages are buffered here and one delivery event is queued on
/// the owning node's sink per buffered message. The callback only ever runs
/// on the thread that dispatches those events.
pub struct SubscriptionEndpoint<T, K>
where
    T: Message,
    K: EventSink,
{
    id: Uuid,
    topic: String,
    buffer: BoundedQueue<T>,
    callback: Mutex<Callback<T>>,
    sink: K,
    active: AtomicBool,
}

impl<T, K> Debug for SubscriptionEndpoint<T, K>
where
    T: Message,
    K: EventSink,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionEndpoint")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("buffer", &self.buffer)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<T, K> SubscriptionEndpoint<T, K>
where
    T: Message,
    K: EventSink,
{
    /// Creates an active endpoint.
    #[must_use]
    pub fn new(topic: &str, queue_size: usize, callback: Callback<T>, sink: K) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            buffer: BoundedQueue::new(queue_size),
            callback: Mutex::new(callback),
            sink,
            active: AtomicBool::new(true),
        })
    }

    /// Unique id of this subscription.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The resolved topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of messages waiting for dispatch.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Whether deliveries are still accepted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Buffers a message and schedules its dispatch.
    ///
    /// When the buffer is full the oldest message is evicted. The eviction
    /// leaves the number of buffered messages unchanged, so no new event is
    /// scheduled for it.
    pub fn deliver(self: &Arc<Self>, message: T) -> bool {
        if !self.is_active() {
            return false;
        }

        if self.buffer.push(message).is_some() {
            warn!(
                topic = %self.topic,
                capacity = self.buffer.capacity(),
                "subscription queue full, dropped oldest message"
            );
            return true;
        }

        self.sink.submit(Box::new(Delivery {
            endpoint: Arc::clone(self),
        }))
    }

    /// Stops deliveries and discards anything still buffered.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
        self.buffer.clear();
    }
}

struct Delivery<T, K>
where
    T: Message,
    K: EventSink,
{
    endpoint: Arc<SubscriptionEndpoint<T, K>>,
}

impl<T, K> Dispatch for Delivery<T, K>
where
    T: Message,
    K: EventSink,
{
    fn dispatch(self: Box<Self>) {
        if !self.endpoint.is_active() {
            return;
        }
        let Some(message) = self.endpoint.buffer.pop() else {
            return;
        };
        trace!(topic = %self.endpoint.topic, "dispatching message");
        let mut callback = self.endpoint.callback.lock();
        (*callback)(message);
    }
}

type Reply<S> = Box<dyn FnOnce(Option<Response<S>>) + Send + 'static>;

/// The serving end of one service.
pub struct ServiceEndpoint<S, K>
where
    S: ServiceType,
    K: EventSink,
{
    id: Uuid,
    name: String,
    callback: Mutex<ServiceCallback<S>>,
    sink: K,
    active: AtomicBool,
}

impl<S, K> Debug for ServiceEndpoint<S, K>
where
    S: ServiceType,
    K: EventSink,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEndpoint")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<S, K> ServiceEndpoint<S, K>
where
    S: ServiceType,
    K: EventSink,
{
    /// Creates an active endpoint.
    #[must_use]
    pub fn new(name: &str, callback: ServiceCallback<S>, sink: K) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            callback: Mutex::new(callback),
            sink,
            active: AtomicBool::new(true),
        })
    }

    /// Unique id of this service.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The resolved service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether requests are still accepted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Schedules one request for the serving node's dispatch loop.
    ///
    /// `reply` is invoked exactly once with the callback's answer, or
    /// `None` if the service was withdrawn before the request ran. If the
    /// serving loop is gone `reply` is dropped uncalled and `false` is
    /// returned.
    pub fn submit<R>(self: &Arc<Self>, request: Request<S>, reply: R) -> bool
    where
        R: FnOnce(Option<Response<S>>) + Send + 'static,
    {
        if !self.is_active() {
            reply(None);
            return false;
        }

        self.sink.submit(Box::new(ServiceRequest {
            endpoint: Arc::clone(self),
            request,
            reply: Box::new(reply),
        }))
    }

    /// Stops accepting requests. Requests already queued are declined.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

struct ServiceRequest<S, K>
where
    S: ServiceType,
    K: EventSink,
{
    endpoint: Arc<ServiceEndpoint<S, K>>,
    request: Request<S>,
    reply: Reply<S>,
}

impl<S, K> Dispatch for ServiceRequest<S, K>
where
    S: ServiceType,
    K: EventSink,
{
    fn dispatch(self: Box<Self>) {
        let Self {
            endpoint,
            request,
            reply,
        } = *self;

        if !endpoint.is_active() {
            reply(None);
            return;
        }

        trace!(service = %endpoint.name, "dispatching request");
        let response = {
            let mut callback = endpoint.callback.lock();
            (*callback)(&request)
        };
        reply(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Event;

    #[derive(Clone, Default)]
    struct VecSink {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl EventSink for VecSink {
        fn submit(&self, event: Event) -> bool {
            self.events.lock().push(event);
            true
        }
    }

    impl VecSink {
        fn drain(&self) -> usize {
            let events: Vec<Event> = self.events.lock().drain(..).collect();
            let count = events.len();
            for event in events {
                event.dispatch();
            }
            count
        }
    }

    struct Double;

    impl ServiceType for Double {
        type Request = i32;
        type Response = i32;
    }

    fn recorder() -> (Arc<Mutex<Vec<i32>>>, Callback<i32>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |msg| sink.lock().push(msg)))
    }

    #[test]
    fn test_delivery_runs_callback_on_dispatch() {
        let sink = VecSink::default();
        let (seen, callback) = recorder();
        let endpoint = SubscriptionEndpoint::new("/t", 10, callback, sink.clone());

        assert!(endpoint.deliver(1));
        assert!(endpoint.deliver(2));
        assert!(seen.lock().is_empty());

        assert_eq!(sink.drain(), 2);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let sink = VecSink::default();
        let (seen, callback) = recorder();
        let endpoint = SubscriptionEndpoint::new("/t", 2, callback, sink.clone());

        for i in 1..=5 {
            endpoint.deliver(i);
        }

        assert_eq!(endpoint.pending(), 2);
        assert_eq!(sink.drain(), 2);
        assert_eq!(*seen.lock(), vec![4, 5]);
    }

    #[test]
    fn test_deactivated_subscription_drops_pending() {
        let sink = VecSink::default();
        let (seen, callback) = recorder();
        let endpoint = SubscriptionEndpoint::new("/t", 10, callback, sink.clone());

        endpoint.deliver(1);
        endpoint.deactivate();
        assert!(!endpoint.deliver(2));

        sink.drain();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_service_request_replies_once() {
        let sink = VecSink::default();
        let endpoint =
            ServiceEndpoint::<Double, _>::new("/double", Box::new(|x: &i32| Some(x * 2)), sink.clone());

        let answer = Arc::new(Mutex::new(None));
        let slot = answer.clone();
        assert!(endpoint.submit(21, move |response| *slot.lock() = Some(response)));

        sink.drain();
        assert_eq!(*answer.lock(), Some(Some(42)));
    }

    #[test]
    fn test_withdrawn_service_declines_queued_request() {
        let sink = VecSink::default();
        let endpoint =
            ServiceEndpoint::<Double, _>::new("/double", Box::new(|x: &i32| Some(x * 2)), sink.clone());

        let answer = Arc::new(Mutex::new(None));
        let slot = answer.clone();
        endpoint.submit(1, move |response| *slot.lock() = Some(response));
        endpoint.deactivate();

        sink.drain();
        assert_eq!(*answer.lock(), Some(None));
    }
}
