use crate::error::Error;
use crate::graph::GRAPH;
use crate::service::Link;

use compat_middleware::{ClientHandle, Request, Response, ServiceType};

use std::any::type_name;
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{Instant, timeout_at};
use tracing::trace;

/// A service client on the async backend.
///
/// Requests are resolved against the graph when they are sent, so a client
/// keeps working across server restarts.
pub struct AsyncClient<S: ServiceType> {
    name: String,
    handle: Handle,
    _marker: PhantomData<fn() -> S>,
}

impl<S: ServiceType> Debug for AsyncClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncClient")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S: ServiceType> AsyncClient<S> {
    pub(crate) fn new(name: &str, handle: Handle) -> Result<Self, Error> {
        // Type-check the name if something is already serving it.
        GRAPH
            .registry()
            .lookup_service::<Link<S>>(name, type_name::<S>())?;
        Ok(Self {
            name: name.to_string(),
            handle,
            _marker: PhantomData,
        })
    }

    /// Resolves once the service is advertised, or after `timeout`.
    pub async fn service_ready(&self, timeout: Duration) -> bool {
        let mut changes = GRAPH.changes();
        let ready = async {
            while !GRAPH.registry().has_service(&self.name) {
                if changes.changed().await.is_err() {
                    break;
                }
            }
        };
        tokio::time::timeout(timeout, ready).await.is_ok()
            && GRAPH.registry().has_service(&self.name)
    }

    /// Sends a request and resolves with the response.
    ///
    /// The server is looked up at send time. Awaiting is unbounded; wrap it
    /// in a timeout to bound the wait.
    ///
    /// # Errors
    /// Returns an error if nothing serves the name, the name is bound to
    /// another service type, the server declines, or the server goes away
    /// before answering.
    pub async fn send_request(&self, request: Request<S>) -> Result<Response<S>, Error> {
        let server = GRAPH
            .registry()
            .lookup_service::<Link<S>>(&self.name, type_name::<S>())?
            .ok_or_else(|| Error::Unavailable(self.name.clone()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        let queued = server.submit(request, move |response| {
            let _ = reply_tx.send(response);
        });
        if !queued {
            return Err(Error::Unavailable(self.name.clone()));
        }
        trace!(service = %self.name, "request sent");

        match reply_rx.await {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(Error::Declined(self.name.clone())),
            Err(_) => Err(Error::Unavailable(self.name.clone())),
        }
    }
}

impl<S: ServiceType> ClientHandle<S> for AsyncClient<S> {
    type Error = Error;

    fn service_name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &Request<S>, timeout: Duration) -> Result<Response<S>, Error> {
        if Handle::try_current().is_ok() {
            return Err(Error::AsyncContext(self.name.clone()));
        }

        self.handle.block_on(async {
            let deadline = Instant::now() + timeout;
            if !self.service_ready(timeout).await {
                return Err(Error::Unavailable(self.name.clone()));
            }
            timeout_at(deadline, self.send_request(request.clone()))
                .await
                .map_err(|_| Error::Timeout(self.name.clone(), timeout))?
        })
    }

    fn wait_for_service(&self, timeout: Duration) -> bool {
        if Handle::try_current().is_ok() {
            return GRAPH.registry().has_service(&self.name);
        }
        self.handle.block_on(self.service_ready(timeout))
    }
}
