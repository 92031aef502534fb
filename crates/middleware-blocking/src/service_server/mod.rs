use crate::MASTER;
use crate::callback_queue::CallbackQueue;
use crate::error::Error;

use compat_middleware::endpoint::ServiceEndpoint;
use compat_middleware::{ServiceCallback, ServiceType};

use std::any::type_name;
use std::fmt::{self, Debug};
use std::sync::Arc;

use tracing::debug;

pub(crate) type Link<S> = ServiceEndpoint<S, CallbackQueue>;

/// A service advertisement on the blocking backend.
///
/// Dropping it withdraws the name; requests still queued are declined.
pub struct BlockingServiceServer<S: ServiceType> {
    endpoint: Arc<Link<S>>,
}

impl<S: ServiceType> Debug for BlockingServiceServer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingServiceServer")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl<S: ServiceType> BlockingServiceServer<S> {
    pub(crate) fn new(
        name: &str,
        callback: ServiceCallback<S>,
        queue: CallbackQueue,
    ) -> Result<Self, Error> {
        let endpoint = ServiceEndpoint::new(name, callback, queue);
        MASTER.advertise_service(name, type_name::<S>(), Arc::clone(&endpoint))?;
        debug!(service = name, id = %endpoint.id(), "service server created");
        Ok(Self { endpoint })
    }
}

impl<S: ServiceType> Drop for BlockingServiceServer<S> {
    fn drop(&mut self) {
        self.endpoint.deactivate();
        MASTER.withdraw_service(self.endpoint.name(), &self.endpoint);
        debug!(service = self.endpoint.name(), id = %self.endpoint.id(), "service server dropped");
    }
}
