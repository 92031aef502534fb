//! Abstract interface over the middleware transport API generations.
//!
//! A backend adapts one generation of the middleware API (a synchronous
//! handle model or an asynchronous future model) to the [`Backend`] trait.
//! Exactly one backend is compiled into a given binary; the facade on top of
//! this crate never names a concrete backend type directly.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Backends own the execution context that drives callbacks.
pub mod backend;

/// Clients send requests to services.
pub mod client;

/// Units of callback work queued for the dispatch loop.
pub mod dispatch;

/// Endpoints shared by both backends: subscription and service links.
pub mod endpoint;

/// Message and service value types.
pub mod message;

/// Naming rules for nodes, topics and services.
pub mod names;

/// Publishers broadcast messages to a topic.
pub mod publisher;

/// Bounded per-subscription buffers.
pub mod queue;

/// Process-wide endpoint registries.
pub mod registry;

/// Backend-independent timestamps.
pub mod time;

pub use backend::{Backend, BackendError, BackendOptions};
pub use client::ClientHandle;
pub use dispatch::{Dispatch, Event, EventSink};
pub use message::{Callback, Message, Request, Response, ServiceCallback, ServiceType};
pub use publisher::PublisherHandle;
pub use time::Time;
