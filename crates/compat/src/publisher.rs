use crate::backend::PublisherOf;
use crate::error::Error;
use crate::node::Node;

use compat_middleware::{Backend, Message, PublisherHandle};

use std::fmt::{self, Debug};

/// A one-way outbound channel bound to a topic.
pub struct Publisher<T: Message> {
    handle: PublisherOf<T>,
    node: Node,
}

impl<T: Message> Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("handle", &self.handle)
            .field("node", &self.node.fully_qualified_name())
            .finish()
    }
}

impl<T: Message> Publisher<T> {
    /// Advertises `topic` on `node`.
    ///
    /// # Errors
    /// Returns an error if the name is malformed or the topic already
    /// carries another message type.
    pub fn new(node: &Node, topic: &str, queue_size: usize) -> Result<Self, Error> {
        let topic = node.resolve_name(topic)?;
        let handle = node.backend().advertise::<T>(&topic, queue_size)?;
        Ok(Self {
            handle,
            node: node.clone(),
        })
    }

    /// Broadcasts `message` to the current subscribers. Fire and forget.
    pub fn publish(&self, message: &T) {
        self.handle.publish(message);
    }

    /// Number of subscriptions currently attached to the topic.
    #[must_use]
    pub fn num_subscribers(&self) -> usize {
        self.handle.num_subscribers()
    }

    /// The resolved topic name.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.handle.topic()
    }
}
