use crate::backend::ServiceOf;
use crate::error::Error;
use crate::node::Node;

use compat_middleware::{Backend, Request, Response, ServiceType};

use std::fmt::{self, Debug};

/// An inbound request/reply handler bound to a service name.
///
/// The callback runs once per request on the node's dispatch loop, never
/// concurrently with itself. Returning `None` declines the request and the
/// caller sees a failed attempt. A callback that never returns stalls the
/// whole loop.
pub struct Service<S: ServiceType> {
    handle: ServiceOf<S>,
    name: String,
    node: Node,
}

impl<S: ServiceType> Debug for Service<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("node", &self.node.fully_qualified_name())
            .finish()
    }
}

impl<S: ServiceType> Service<S> {
    /// Advertises `name` on `node`.
    ///
    /// # Errors
    /// Returns an error if the name is malformed or already advertised.
    pub fn new<F>(node: &Node, name: &str, callback: F) -> Result<Self, Error>
    where
        F: FnMut(&Request<S>) -> Option<Response<S>> + Send + 'static,
    {
        let name = node.resolve_name(name)?;
        let handle = node
            .backend()
            .advertise_service::<S>(&name, Box::new(callback))?;
        Ok(Self {
            handle,
            name,
            node: node.clone(),
        })
    }

    /// The resolved service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
