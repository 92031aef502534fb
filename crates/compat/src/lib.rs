//! One publish/subscribe and request/reply surface over two generations of
//! the middleware transport API.
//!
//! The synchronous handle model (`blocking` feature, the default) and the
//! asynchronous future model (`async` feature) differ in how connections
//! are set up, how callbacks are registered and what blocks. This crate
//! hides those differences: application code initializes a [`Node`], hangs
//! [`Publisher`]s, [`Subscriber`]s, [`Service`]s and [`Client`]s off it,
//! then spins the node to dispatch callbacks.
//!
//! ```no_run
//! use compat::{Node, Publisher, Subscriber};
//!
//! let node = Node::init(std::env::args(), "talker").unwrap();
//! let publisher = Publisher::<String>::new(&node, "chatter", 10).unwrap();
//! let _subscriber = Subscriber::new(&node, "chatter", 10, |msg: String| {
//!     println!("heard {msg}");
//! })
//! .unwrap();
//!
//! publisher.publish(&"hello".to_string());
//! node.spin_once();
//! ```
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod backend;
mod client;
mod error;
mod node;
mod options;
mod publisher;
mod rate;
mod service;
mod subscriber;

pub use backend::{ActiveBackend, ActiveError, ActiveOptions};
pub use client::{CallStatus, Client};
pub use error::Error;
pub use node::{Node, NodeState};
pub use options::NodeOptions;
pub use publisher::Publisher;
pub use rate::Rate;
pub use service::Service;
pub use subscriber::Subscriber;

pub use compat_middleware::{Message, ServiceType, Time};
