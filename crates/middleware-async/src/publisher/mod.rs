use crate::error::Error;
use crate::executor::EventSender;
use crate::graph::GRAPH;

use compat_middleware::endpoint::SubscriptionEndpoint;
use compat_middleware::registry::Topic;
use compat_middleware::{Message, PublisherHandle};

use std::any::type_name;
use std::sync::Arc;

use tracing::{debug, trace};

pub(crate) type Link<T> = SubscriptionEndpoint<T, EventSender>;

/// A topic publisher on the async backend.
#[derive(Debug)]
pub struct AsyncPublisher<T: Message> {
    topic: Arc<Topic<Link<T>>>,
}

impl<T: Message> AsyncPublisher<T> {
    pub(crate) fn new(topic: &str, depth: usize) -> Result<Self, Error> {
        let topic = GRAPH
            .registry()
            .add_publisher::<Link<T>>(topic, type_name::<T>())?;
        GRAPH.notify();
        debug!(topic = topic.name(), depth, "publisher created");
        Ok(Self { topic })
    }
}

impl<T: Message> PublisherHandle<T> for AsyncPublisher<T> {
    fn topic(&self) -> &str {
        self.topic.name()
    }

    fn publish(&self, message: &T) {
        let links = self.topic.links();
        trace!(topic = self.topic.name(), subscribers = links.len(), "publish");
        for link in links {
            link.deliver(message.clone());
        }
    }

    fn num_subscribers(&self) -> usize {
        self.topic.subscriber_count()
    }
}

impl<T: Message> Drop for AsyncPublisher<T> {
    fn drop(&mut self) {
        GRAPH.registry().remove_publisher(&self.topic);
        GRAPH.notify();
    }
}
