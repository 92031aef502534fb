/// One unit of callback work: a message delivery or a service request.
///
/// Events are consumed by value so a request payload can be moved into the
/// handler and its reply channel consumed exactly once.
pub trait Dispatch: Send + 'static {
    /// Runs the callback on the calling (dispatch) thread.
    fn dispatch(self: Box<Self>);
}

/// A boxed unit of callback work.
pub type Event = Box<dyn Dispatch>;

/// Where endpoints hand their events for the dispatch loop to pick up.
pub trait EventSink: Clone + Send + Sync + 'static {
    /// Queues an event. Returns `false` if the loop is gone.
    fn submit(&self, event: Event) -> bool;
}
