//! Build-time backend selection.
//!
//! `async` wins when both features are enabled, so `--all-features` builds
//! still link exactly one backend into the facade.

use compat_middleware::Backend;

/// The backend compiled into this build.
#[cfg(feature = "async")]
pub type ActiveBackend = compat_middleware_async::AsyncBackend;

/// The backend compiled into this build.
#[cfg(all(feature = "blocking", not(feature = "async")))]
pub type ActiveBackend = compat_middleware_blocking::BlockingBackend;

#[cfg(not(any(feature = "blocking", feature = "async")))]
compile_error!("enable exactly one of the `blocking` or `async` features");

/// Options of the active backend.
pub type ActiveOptions = <ActiveBackend as Backend>::Options;

/// Error type of the active backend.
#[cfg(feature = "async")]
pub type ActiveError = compat_middleware_async::Error;

/// Error type of the active backend.
#[cfg(all(feature = "blocking", not(feature = "async")))]
pub type ActiveError = compat_middleware_blocking::Error;

pub(crate) type PublisherOf<T> = <ActiveBackend as Backend>::Publisher<T>;
pub(crate) type SubscriptionOf<T> = <ActiveBackend as Backend>::Subscription<T>;
pub(crate) type ServiceOf<S> = <ActiveBackend as Backend>::Service<S>;
pub(crate) type ClientOf<S> = <ActiveBackend as Backend>::Client<S>;
