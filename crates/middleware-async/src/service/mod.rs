use crate::error::Error;
use crate::executor::EventSender;
use crate::graph::GRAPH;

use compat_middleware::endpoint::ServiceEndpoint;
use compat_middleware::{ServiceCallback, ServiceType};

use std::any::type_name;
use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::debug;

pub(crate) type Link<S> = ServiceEndpoint<S, EventSender>;

/// A service server on the async backend.
pub struct AsyncService<S: ServiceType> {
    endpoint: Arc<Link<S>>,
}

impl<S: ServiceType> Debug for AsyncService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncService")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl<S: ServiceType> AsyncService<S> {
    pub(crate) fn new(
        name: &str,
        callback: ServiceCallback<S>,
        events: EventSender,
    ) -> Result<Self, Error> {
        let endpoint = ServiceEndpoint::new(name, callback, events);
        GRAPH
            .registry()
            .advertise_service(name, type_name::<S>(), Arc::clone(&endpoint))?;
        GRAPH.notify();
        debug!(service = name, id = %endpoint.id(), "service created");
        Ok(Self { endpoint })
    }
}

impl<S: ServiceType> Drop for AsyncService<S> {
    fn drop(&mut self) {
        self.endpoint.deactivate();
        GRAPH
            .registry()
            .withdraw_service(self.endpoint.name(), &self.endpoint);
        GRAPH.notify();
    }
}
