use crate::error::Error;
use crate::executor::EventSender;
use crate::graph::GRAPH;
use crate::publisher::Link;

use compat_middleware::endpoint::SubscriptionEndpoint;
use compat_middleware::registry::Topic;
use compat_middleware::{Callback, Message};

use std::any::type_name;
use std::sync::Arc;

use tracing::debug;

/// A topic subscription on the async backend.
#[derive(Debug)]
pub struct AsyncSubscription<T: Message> {
    topic: Arc<Topic<Link<T>>>,
    endpoint: Arc<Link<T>>,
}

impl<T: Message> AsyncSubscription<T> {
    pub(crate) fn new(
        topic: &str,
        depth: usize,
        callback: Callback<T>,
        events: EventSender,
    ) -> Result<Self, Error> {
        let endpoint = SubscriptionEndpoint::new(topic, depth, callback, events);
        let topic = GRAPH
            .registry()
            .attach(topic, type_name::<T>(), Arc::clone(&endpoint))?;
        GRAPH.notify();
        debug!(topic = topic.name(), id = %endpoint.id(), depth, "subscription created");
        Ok(Self { topic, endpoint })
    }
}

impl<T: Message> Drop for AsyncSubscription<T> {
    fn drop(&mut self) {
        debug!(
            topic = self.topic.name(),
            id = %self.endpoint.id(),
            discarded = self.endpoint.pending(),
            "subscription dropped"
        );
        self.endpoint.deactivate();
        GRAPH.registry().detach(&self.topic, &self.endpoint);
        GRAPH.notify();
    }
}
