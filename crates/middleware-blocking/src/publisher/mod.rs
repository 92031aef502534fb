use crate::MASTER;
use crate::callback_queue::CallbackQueue;
use crate::error::Error;

use compat_middleware::endpoint::SubscriptionEndpoint;
use compat_middleware::registry::Topic;
use compat_middleware::{Message, PublisherHandle};

use std::any::type_name;
use std::sync::Arc;

use tracing::{debug, trace};

pub(crate) type Link<T> = SubscriptionEndpoint<T, CallbackQueue>;

/// A topic advertisement on the blocking backend.
///
/// Publishing hands a copy of the message to every subscription attached
/// at that moment. The message lands in each subscription's buffer and is
/// dispatched when the subscribing node spins.
#[derive(Debug)]
pub struct BlockingPublisher<T: Message> {
    topic: Arc<Topic<Link<T>>>,
}

impl<T: Message> BlockingPublisher<T> {
    pub(crate) fn new(topic: &str, queue_size: usize) -> Result<Self, Error> {
        let topic = MASTER.add_publisher::<Link<T>>(topic, type_name::<T>())?;
        debug!(topic = topic.name(), queue_size, "advertised");
        Ok(Self { topic })
    }
}

impl<T: Message> PublisherHandle<T> for BlockingPublisher<T> {
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

impl<T: Message> Drop for BlockingPublisher<T> {
    fn drop(&mut self) {
        MASTER.remove_publisher(&self.topic);
        debug!(topic = self.topic.name(), "unadvertised");
    }
}
