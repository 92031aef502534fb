use crate::backend::BackendError;
use crate::message::{Request, Response, ServiceType};

use std::fmt::Debug;
use std::time::Duration;

/// A handle that can send one request to a service and wait for its reply.
///
/// The synchronous API generation implements this as a blocking call on a
/// persistent connection; the asynchronous one as a future awaited with a
/// deadline. Either way a single `call` is one attempt: no retries happen
/// at this level.
pub trait ClientHandle<S>
where
    Self: Debug + Send + Sync + Sized + 'static,
    S: ServiceType,
{
    /// The error type for the client.
    type Error: BackendError;

    /// The service name this handle was acquired for.
    fn service_name(&self) -> &str;

    /// Sends `request` and waits up to `timeout` for the response.
    ///
    /// # Errors
    /// Returns an error if the service is unreachable, declines the request,
    /// or does not answer within `timeout`.
    fn call(&self, request: &Request<S>, timeout: Duration) -> Result<Response<S>, Self::Error>;

    /// Waits up to `timeout` for the service to become available.
    fn wait_for_service(&self, timeout: Duration) -> bool;
}
