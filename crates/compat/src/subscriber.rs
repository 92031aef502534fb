use crate::backend::SubscriptionOf;
use crate::error::Error;
use crate::node::Node;

use compat_middleware::{Backend, Message};

use std::fmt::{self, Debug};

/// A one-way inbound channel bound to a topic.
///
/// The callback runs once per message, on the node's dispatch loop, in the
/// order each publisher sent them. At most `queue_size` messages wait
/// between dispatches; on overflow the oldest is dropped. A `queue_size` of
/// zero means unbounded.
pub struct Subscriber<T: Message> {
    handle: SubscriptionOf<T>,
    topic: String,
    node: Node,
}

impl<T: Message> Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("topic", &self.topic)
            .field("handle", &self.handle)
            .field("node", &self.node.fully_qualified_name())
            .finish()
    }
}

impl<T: Message> Subscriber<T> {
    /// Subscribes to `topic` on `node`.
    ///
    /// To bind a method, capture the receiver in the closure.
    ///
    /// # Errors
    /// Returns an error if the name is malformed or the topic already
    /// carries another message type.
    pub fn new<F>(node: &Node, topic: &str, queue_size: usize, callback: F) -> Result<Self, Error>
    where
        F: FnMut(T) + Send + 'static,
    {
        let topic = node.resolve_name(topic)?;
        let handle = node
            .backend()
            .subscribe::<T>(&topic, queue_size, Box::new(callback))?;
        Ok(Self {
            handle,
            topic,
            node: node.clone(),
        })
    }

    /// The resolved topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
