//! Asynchronous future-model backend.
//!
//! Each node owns a tokio runtime. Spinning hands the node's event queue to
//! a dedicated executor thread and returns at once; callbacks then run on
//! that thread, one at a time. Service requests are futures resolved by
//! the serving node's executor.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod executor;
mod graph;
mod time;

/// Service clients.
pub mod client;

/// Topic publishers.
pub mod publisher;

/// Service servers.
pub mod service;

/// Topic subscriptions.
pub mod subscription;

pub use client::AsyncClient;
pub use error::Error;
pub use publisher::AsyncPublisher;
pub use service::AsyncService;
pub use subscription::AsyncSubscription;
pub use time::ClockStamp;

use executor::{EventSender, Executor};

use compat_middleware::{
    Backend, BackendOptions, Callback, Message, ServiceCallback, ServiceType,
};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

/// Options for the async backend.
#[derive(Clone, Debug)]
pub struct AsyncOptions {
    /// Worker threads of the node's runtime.
    pub worker_threads: usize,

    /// How often an idle executor re-checks for interruption.
    pub wake_interval: Duration,
}

impl Default for AsyncOptions {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            wake_interval: Duration::from_millis(100),
        }
    }
}

impl BackendOptions for AsyncOptions {}

/// Node context for the asynchronous API generation.
#[derive(Debug)]
pub struct AsyncBackend {
    node_name: String,
    executor: Executor,
    events: EventSender,
    runtime: Option<Runtime>,
}

impl Backend for AsyncBackend {
    type Error = Error;
    type Options = AsyncOptions;
    type Stamp = ClockStamp;
    type Publisher<T: Message> = AsyncPublisher<T>;
    type Subscription<T: Message> = AsyncSubscription<T>;
    type Service<S: ServiceType> = AsyncService<S>;
    type Client<S: ServiceType> = AsyncClient<S>;

    fn new(
        node_name: &str,
        options: AsyncOptions,
        interrupted: Arc<AtomicBool>,
    ) -> Result<Self, Error> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name(format!("runtime{}", node_name.replace('/', "-")))
            .enable_all()
            .build()?;

        let (executor, events) = Executor::new(
            node_name,
            runtime.handle().clone(),
            options.wake_interval,
            interrupted,
        );
        debug!(node = node_name, ?options, "async context created");

        Ok(Self {
            node_name: node_name.to_string(),
            executor,
            events,
            runtime: Some(runtime),
        })
    }

    fn advertise<T: Message>(&self, topic: &str, queue_size: usize) -> Result<AsyncPublisher<T>, Error> {
        AsyncPublisher::new(topic, queue_size)
    }

    fn subscribe<T: Message>(
        &self,
        topic: &str,
        queue_size: usize,
        callback: Callback<T>,
    ) -> Result<AsyncSubscription<T>, Error> {
        AsyncSubscription::new(topic, queue_size, callback, self.events.clone())
    }

    fn advertise_service<S: ServiceType>(
        &self,
        name: &str,
        callback: ServiceCallback<S>,
    ) -> Result<AsyncService<S>, Error> {
        AsyncService::new(name, callback, self.events.clone())
    }

    fn service_client<S: ServiceType>(&self, name: &str) -> Result<AsyncClient<S>, Error> {
        AsyncClient::new(name, self.executor.handle())
    }

    fn spin(&self) {
        self.executor.start();
    }

    fn spin_once(&self) {
        self.executor.run_pending();
    }

    fn is_spinning(&self) -> bool {
        self.executor.is_spinning()
    }

    fn shutdown(&self) {
        if self.executor.cancel() {
            info!(node = %self.node_name, "shutdown requested");
        }
    }

    fn ok(&self) -> bool {
        self.executor.ok()
    }

    fn now(&self) -> ClockStamp {
        ClockStamp::now()
    }
}

impl Drop for AsyncBackend {
    fn drop(&mut self) {
        self.executor.stop();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
        debug!(node = %self.node_name, "async context dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use compat_middleware::{ClientHandle, PublisherHandle};

    use std::sync::atomic::Ordering;
    use std::thread;
    use std::time::Instant;

    use parking_lot::Mutex;
    use serial_test::serial;

    struct Echo;

    impl ServiceType for Echo {
        type Request = String;
        type Response = String;
    }

    fn options() -> AsyncOptions {
        AsyncOptions {
            worker_threads: 1,
            wake_interval: Duration::from_millis(10),
        }
    }

    fn backend(name: &str) -> AsyncBackend {
        let _ = tracing_subscriber::fmt::try_init();
        AsyncBackend::new(name, options(), Arc::new(AtomicBool::new(false))).unwrap()
    }

    fn wait_until(condition: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    #[serial]
    fn test_spin_once_dispatches_in_order() {
        let node = backend("/n1");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let publisher = node.advertise::<u8>("/async/t", 10).unwrap();
        let _subscription = {
            let seen = Arc::clone(&seen);
            node.subscribe("/async/t", 10, Box::new(move |msg: u8| seen.lock().push(msg)))
                .unwrap()
        };

        for i in 1..=3 {
            publisher.publish(&i);
        }
        node.spin_once();

        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    #[serial]
    fn test_spin_returns_immediately() {
        let node = backend("/n1");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let publisher = node.advertise::<u8>("/async/bg", 10).unwrap();
        let _subscription = {
            let seen = Arc::clone(&seen);
            node.subscribe("/async/bg", 10, Box::new(move |msg: u8| seen.lock().push(msg)))
                .unwrap()
        };

        node.spin();
        assert!(node.is_spinning());

        publisher.publish(&7);
        assert!(wait_until(|| seen.lock().len() == 1));

        node.shutdown();
        assert!(wait_until(|| !node.is_spinning()));
        assert!(!node.ok());
    }

    #[test]
    #[serial]
    fn test_second_spin_is_ignored() {
        let node = backend("/n1");
        node.spin();
        node.spin();
        assert!(node.is_spinning());

        node.shutdown();
        assert!(wait_until(|| !node.is_spinning()));
    }

    #[test]
    #[serial]
    fn test_interrupt_stops_executor() {
        let _ = tracing_subscriber::fmt::try_init();
        let interrupted = Arc::new(AtomicBool::new(false));
        let node = AsyncBackend::new("/n1", options(), Arc::clone(&interrupted)).unwrap();

        node.spin();
        interrupted.store(true, Ordering::Release);

        assert!(wait_until(|| !node.is_spinning()));
        assert!(!node.ok());
    }

    #[test]
    #[serial]
    fn test_request_response() {
        let server = backend("/server");
        let _service = server
            .advertise_service::<Echo>(
                "/async/echo",
                Box::new(|request: &String| Some(request.to_uppercase())),
            )
            .unwrap();
        server.spin();

        let client = server.service_client::<Echo>("/async/echo").unwrap();
        let response = client
            .call(&"hello".to_string(), Duration::from_secs(1))
            .unwrap();
        assert_eq!(response, "HELLO");

        server.shutdown();
    }

    #[test]
    #[serial]
    fn test_call_without_service_is_unavailable() {
        let node = backend("/n1");
        let client = node.service_client::<Echo>("/async/missing").unwrap();

        assert!(!client.wait_for_service(Duration::from_millis(20)));
        let result = client.call(&String::new(), Duration::from_millis(20));
        assert!(matches!(result, Err(Error::Unavailable(_))));
    }

    #[test]
    #[serial]
    fn test_call_times_out_when_not_spinning() {
        let server = backend("/server");
        let _service = server
            .advertise_service::<Echo>("/async/stalled", Box::new(|r: &String| Some(r.clone())))
            .unwrap();

        let client = server.service_client::<Echo>("/async/stalled").unwrap();
        let result = client.call(&String::new(), Duration::from_millis(50));
        assert!(matches!(result, Err(Error::Timeout(..))));
    }

    #[test]
    #[serial]
    fn test_wait_for_service_wakes_on_advertise() {
        let server = backend("/server");
        let client = server.service_client::<Echo>("/async/late").unwrap();

        let waiter = thread::spawn(move || client.wait_for_service(Duration::from_secs(2)));
        thread::sleep(Duration::from_millis(20));
        let _service = server
            .advertise_service::<Echo>("/async/late", Box::new(|r: &String| Some(r.clone())))
            .unwrap();

        assert!(waiter.join().unwrap());
    }

    #[test]
    #[serial]
    fn test_callback_may_call_a_service() {
        let node = backend("/n1");

        let helper = backend("/helper");
        let _helper_service = helper
            .advertise_service::<Echo>("/async/outer", Box::new(|r: &String| Some(format!("{r}!"))))
            .unwrap();
        helper.spin();

        let answers = Arc::new(Mutex::new(Vec::new()));
        let publisher = node.advertise::<String>("/async/trigger", 1).unwrap();
        let _subscription = {
            let answers = Arc::clone(&answers);
            let client = node.service_client::<Echo>("/async/outer").unwrap();
            node.subscribe(
                "/async/trigger",
                1,
                Box::new(move |msg: String| {
                    if let Ok(answer) = client.call(&msg, Duration::from_secs(1)) {
                        answers.lock().push(answer);
                    }
                }),
            )
            .unwrap()
        };

        node.spin();
        publisher.publish(&"ping".to_string());
        assert!(wait_until(|| answers.lock().len() == 1));
        assert_eq!(answers.lock()[0], "ping!");

        node.shutdown();
        helper.shutdown();
    }
}
