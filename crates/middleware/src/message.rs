use std::fmt::Debug;

/// Any value that can travel over a topic or as a service payload.
///
/// Payload layouts are generated elsewhere; here they are opaque values.
pub trait Message: Clone + Debug + Send + Sync + 'static {}

impl<T> Message for T where T: Clone + Debug + Send + Sync + 'static {}

/// A request/reply pair bound to a service name.
pub trait ServiceType: Send + Sync + 'static {
    /// The request payload.
    type Request: Message;

    /// The response payload.
    type Response: Message;
}

/// Request payload of a service type.
pub type Request<S> = <S as ServiceType>::Request;

/// Response payload of a service type.
pub type Response<S> = <S as ServiceType>::Response;

/// Callback invoked once per delivered message.
pub type Callback<T> = Box<dyn FnMut(T) + Send + 'static>;

/// Callback invoked once per service request.
///
/// Returning `None` declines the request; the caller sees a failed attempt.
pub type ServiceCallback<S> = Box<dyn FnMut(&Request<S>) -> Option<Response<S>> + Send + 'static>;
