use crate::message::Message;

use std::fmt::Debug;

/// A handle that broadcasts messages to the current subscribers of a topic.
pub trait PublisherHandle<T>
where
    Self: Debug + Send + Sync + 'static,
    T: Message,
{
    /// The resolved topic name.
    fn topic(&self) -> &str;

    /// Best-effort broadcast; no acknowledgment and no retry.
    fn publish(&self, message: &T);

    /// Number of live subscriptions on the topic.
    fn num_subscribers(&self) -> usize;
}
