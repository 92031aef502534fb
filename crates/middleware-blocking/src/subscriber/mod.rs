use crate::MASTER;
use crate::callback_queue::CallbackQueue;
use crate::error::Error;
use crate::publisher::Link;

use compat_middleware::endpoint::SubscriptionEndpoint;
use compat_middleware::registry::Topic;
use compat_middleware::{Callback, Message};

use std::any::type_name;
use std::sync::Arc;

use tracing::debug;

/// A topic subscription on the blocking backend.
///
/// Dropping it detaches from the topic and discards undelivered messages.
#[derive(Debug)]
pub struct BlockingSubscriber<T: Message> {
    topic: Arc<Topic<Link<T>>>,
    endpoint: Arc<Link<T>>,
}

impl<T: Message> BlockingSubscriber<T> {
    pub(crate) fn new(
        topic: &str,
        queue_size: usize,
        callback: Callback<T>,
        queue: CallbackQueue,
    ) -> Result<Self, Error> {
        let endpoint = SubscriptionEndpoint::new(topic, queue_size, callback, queue);
        let topic = MASTER.attach(topic, type_name::<T>(), Arc::clone(&endpoint))?;
        debug!(topic = topic.name(), id = %endpoint.id(), queue_size, "subscribed");
        Ok(Self { topic, endpoint })
    }
}

impl<T: Message> Drop for BlockingSubscriber<T> {
    fn drop(&mut self) {
        let discarded = self.endpoint.pending();
        self.endpoint.deactivate();
        MASTER.detach(&self.topic, &self.endpoint);
        debug!(topic = self.topic.name(), id = %self.endpoint.id(), discarded, "unsubscribed");
    }
}
