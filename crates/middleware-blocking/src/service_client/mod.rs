use crate::MASTER;
use crate::error::Error;
use crate::service_server::Link;

use compat_middleware::{ClientHandle, Request, Response, ServiceType};

use std::any::type_name;
use std::fmt::{self, Debug};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use flume::RecvTimeoutError;
use parking_lot::Mutex;
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A persistent client connection on the blocking backend.
///
/// The connection is made on first use and pinned to the server that was
/// advertised at that moment. A call made before anything serves the name
/// waits for it within the call's bound. Once the pinned server goes away
/// every call fails with [`Error::Unavailable`] until a new handle is
/// acquired, even if the name has been advertised again.
pub struct BlockingServiceClient<S: ServiceType> {
    name: String,
    connection: Mutex<Option<Weak<Link<S>>>>,
}

impl<S: ServiceType> Debug for BlockingServiceClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingServiceClient")
            .field("name", &self.name)
            .field("connected", &self.connection.lock().is_some())
            .finish()
    }
}

impl<S: ServiceType> BlockingServiceClient<S> {
    pub(crate) fn new(name: &str) -> Result<Self, Error> {
        // Type-check the name up front even if the service is not up yet.
        let server = MASTER.lookup_service::<Link<S>>(name, type_name::<S>())?;
        Ok(Self {
            name: name.to_string(),
            connection: Mutex::new(server.as_ref().map(Arc::downgrade)),
        })
    }

    /// Returns the pinned server, or waits until `deadline` for one to be
    /// advertised and pins it.
    fn connect(&self, deadline: Instant) -> Result<Arc<Link<S>>, Error> {
        if let Some(server) = self.connection.lock().as_ref() {
            return server
                .upgrade()
                .filter(|server| server.is_active())
                .ok_or_else(|| Error::Unavailable(self.name.clone()));
        }

        loop {
            let found = MASTER.lookup_service::<Link<S>>(&self.name, type_name::<S>())?;
            if let Some(server) = found {
                debug!(service = %self.name, "connected");
                *self.connection.lock() = Some(Arc::downgrade(&server));
                return Ok(server);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Unavailable(self.name.clone()));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl<S: ServiceType> ClientHandle<S> for BlockingServiceClient<S> {
    type Error = Error;

    fn service_name(&self) -> &str {
        &self.name
    }

    fn call(&self, request: &Request<S>, timeout: Duration) -> Result<Response<S>, Error> {
        let deadline = Instant::now() + timeout;
        let server = self.connect(deadline)?;

        let (reply_tx, reply_rx) = flume::bounded(1);
        let queued = server.submit(request.clone(), move |response| {
            let _ = reply_tx.send(response);
        });
        if !queued {
            return Err(Error::Unavailable(self.name.clone()));
        }
        trace!(service = %self.name, "request queued");

        match reply_rx.recv_deadline(deadline) {
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(Error::Declined(self.name.clone())),
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout(self.name.clone(), timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Unavailable(self.name.clone())),
        }
    }

    fn wait_for_service(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if MASTER.has_service(&self.name) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}
