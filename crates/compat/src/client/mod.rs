use crate::backend::ClientOf;
use crate::error::Error;
use crate::node::Node;

use compat_middleware::{Backend, ClientHandle, Request, Response, ServiceType};

use std::fmt::{self, Debug};
use std::time::Duration;

use tracing::{debug, warn};

/// Outcome of [`Client::call`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallStatus {
    /// The first attempt got a response.
    Successful,
    /// The first attempt failed; the attempt on a fresh connection got a
    /// response.
    SuccessfulWithRetry,
    /// Both attempts failed. The response was left untouched.
    Failure,
}

impl CallStatus {
    /// Whether a response was written.
    #[must_use]
    pub const fn is_success(self) -> bool {
        !matches!(self, Self::Failure)
    }
}

/// An outbound request/reply initiator bound to a service name.
pub struct Client<S: ServiceType> {
    handle: ClientOf<S>,
    name: String,
    node: Node,
}

impl<S: ServiceType> Debug for Client<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .field("node", &self.node.fully_qualified_name())
            .finish()
    }
}

impl<S: ServiceType> Client<S> {
    /// Creates a client for `name` on `node`.
    ///
    /// The service does not have to be up yet.
    ///
    /// # Errors
    /// Returns an error if the name is malformed or is served with another
    /// service type.
    pub fn new(node: &Node, name: &str) -> Result<Self, Error> {
        let name = node.resolve_name(name)?;
        let handle = node.backend().service_client::<S>(&name)?;
        Ok(Self {
            handle,
            name,
            node: node.clone(),
        })
    }

    /// Sends `request` and writes the reply into `response`.
    ///
    /// Each attempt waits up to the node's call timeout. If the first
    /// attempt fails the connection is re-acquired and exactly one more
    /// attempt is made. On [`CallStatus::Failure`] `response` is unchanged.
    pub fn call(&mut self, request: &Request<S>, response: &mut Response<S>) -> CallStatus {
        let node = &self.node;
        let name = &self.name;
        call_with_retry(
            &mut self.handle,
            || node.backend().service_client::<S>(name),
            request,
            response,
            node.call_timeout(),
        )
    }

    /// Waits up to `timeout` for the service to be advertised.
    #[must_use]
    pub fn wait(&self, timeout: Duration) -> bool {
        self.handle.wait_for_service(timeout)
    }

    /// The resolved service name.
    #[must_use]
    pub fn service_name(&self) -> &str {
        &self.name
    }
}

fn call_with_retry<S, H, R>(
    handle: &mut H,
    reacquire: R,
    request: &Request<S>,
    response: &mut Response<S>,
    timeout: Duration,
) -> CallStatus
where
    S: ServiceType,
    H: ClientHandle<S>,
    R: FnOnce() -> Result<H, H::Error>,
{
    match handle.call(request, timeout) {
        Ok(reply) => {
            *response = reply;
            return CallStatus::Successful;
        }
        Err(error) => {
            warn!(service = handle.service_name(), %error, "call failed, reconnecting");
        }
    }

    match reacquire() {
        Ok(fresh) => *handle = fresh,
        Err(error) => {
            warn!(service = handle.service_name(), %error, "reconnect failed");
            return CallStatus::Failure;
        }
    }

    match handle.call(request, timeout) {
        Ok(reply) => {
            *response = reply;
            debug!(service = handle.service_name(), "call succeeded on retry");
            CallStatus::SuccessfulWithRetry
        }
        Err(error) => {
            warn!(service = handle.service_name(), %error, "retry failed");
            CallStatus::Failure
        }
    }
}
