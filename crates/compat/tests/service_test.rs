//! Request/reply behavior and the client retry state machine.

mod common;
use common::{AddTwoInts, CALL_TIMEOUT, init_node, spin_in_background, stop};

use compat::{CallStatus, Client, Service};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serial_test::serial;

#[test]
#[serial]
fn test_call_successful() {
    let node = init_node("n1");
    let service =
        Service::<AddTwoInts>::new(&node, "add", |(a, b): &(i64, i64)| Some(a + b)).unwrap();
    assert_eq!(service.name(), "/add");
    let spinner = spin_in_background(&node);

    let mut client = Client::<AddTwoInts>::new(&node, "add").unwrap();
    assert_eq!(client.service_name(), "/add");
    assert!(client.wait(Duration::from_secs(1)));

    for (a, b) in [(1, 2), (40, 2), (-5, 5)] {
        let mut sum = 0;
        assert_eq!(client.call(&(a, b), &mut sum), CallStatus::Successful);
        assert_eq!(sum, a + b);
    }

    stop(&node, spinner);
}

#[test]
#[serial]
fn test_call_successful_with_retry() {
    let node = init_node("n1");
    let first = Arc::new(AtomicBool::new(true));
    let _service = {
        let first = Arc::clone(&first);
        Service::<AddTwoInts>::new(&node, "slow_add", move |(a, b): &(i64, i64)| {
            if first.swap(false, Ordering::SeqCst) {
                thread::sleep(CALL_TIMEOUT + Duration::from_millis(150));
            }
            Some(a + b)
        })
        .unwrap()
    };
    let spinner = spin_in_background(&node);

    let mut client = Client::<AddTwoInts>::new(&node, "slow_add").unwrap();
    let mut sum = 0;
    assert_eq!(client.call(&(2, 3), &mut sum), CallStatus::SuccessfulWithRetry);
    assert_eq!(sum, 5);

    stop(&node, spinner);
}

#[test]
#[serial]
fn test_call_failure_leaves_response() {
    let node = init_node("n1");
    let mut client = Client::<AddTwoInts>::new(&node, "nobody").unwrap();

    let started = Instant::now();
    let mut sum = 42;
    assert_eq!(client.call(&(1, 1), &mut sum), CallStatus::Failure);
    assert_eq!(sum, 42);
    let elapsed = started.elapsed();
    assert!(elapsed >= CALL_TIMEOUT * 2 - Duration::from_millis(20));
    assert!(elapsed < CALL_TIMEOUT * 2 + Duration::from_secs(1));
}

#[test]
#[serial]
fn test_service_advertised_during_retry_window() {
    let node = init_node("n1");
    let spinner = spin_in_background(&node);

    let mut client = Client::<AddTwoInts>::new(&node, "late").unwrap();
    let caller = thread::spawn(move || {
        let mut sum = 0;
        let status = client.call(&(4, 5), &mut sum);
        (status, sum)
    });

    thread::sleep(CALL_TIMEOUT + Duration::from_millis(100));
    let _service =
        Service::<AddTwoInts>::new(&node, "late", |(a, b): &(i64, i64)| Some(a + b)).unwrap();

    let (status, sum) = caller.join().unwrap();
    assert_eq!(status, CallStatus::SuccessfulWithRetry);
    assert_eq!(sum, 9);

    stop(&node, spinner);
}

#[test]
#[serial]
fn test_declined_request_is_failure() {
    let node = init_node("n1");
    let calls = Arc::new(AtomicUsize::new(0));
    let _service = {
        let calls = Arc::clone(&calls);
        Service::<AddTwoInts>::new(&node, "picky", move |_: &(i64, i64)| {
            calls.fetch_add(1, Ordering::SeqCst);
            None
        })
        .unwrap()
    };
    let spinner = spin_in_background(&node);

    let mut client = Client::<AddTwoInts>::new(&node, "picky").unwrap();
    let mut sum = 7;
    assert_eq!(client.call(&(1, 1), &mut sum), CallStatus::Failure);
    assert_eq!(sum, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    stop(&node, spinner);
}

#[test]
#[serial]
fn test_wait_without_service() {
    let node = init_node("n1");
    let client = Client::<AddTwoInts>::new(&node, "absent").unwrap();

    assert!(!client.wait(Duration::from_millis(50)));
}

#[test]
#[serial]
fn test_client_recovers_after_server_restart() {
    let node = init_node("n1");
    let spinner = spin_in_background(&node);

    let service = Service::<AddTwoInts>::new(&node, "restart", |_: &(i64, i64)| Some(1)).unwrap();
    let mut client = Client::<AddTwoInts>::new(&node, "restart").unwrap();
    let mut value = 0;
    assert_eq!(client.call(&(0, 0), &mut value), CallStatus::Successful);
    assert_eq!(value, 1);

    drop(service);
    let _service = Service::<AddTwoInts>::new(&node, "restart", |_: &(i64, i64)| Some(2)).unwrap();

    let status = client.call(&(0, 0), &mut value);
    assert!(status.is_success());
    assert_eq!(value, 2);

    stop(&node, spinner);
}

#[test]
#[serial]
fn test_duplicate_service_rejected() {
    let node = init_node("n1");
    let _service = Service::<AddTwoInts>::new(&node, "dup", |_: &(i64, i64)| Some(0)).unwrap();

    let second = Service::<AddTwoInts>::new(&node, "dup", |_: &(i64, i64)| Some(0));
    assert!(matches!(second, Err(compat::Error::Backend(_))));
}

#[test]
#[serial]
fn test_shutdown_does_not_cut_call_short() {
    let node = init_node("n1");
    let _service =
        Service::<AddTwoInts>::new(&node, "unserved", |(a, b): &(i64, i64)| Some(a * b)).unwrap();

    let mut client = Client::<AddTwoInts>::new(&node, "unserved").unwrap();
    let caller = thread::spawn(move || {
        let started = Instant::now();
        let mut product = 0;
        let status = client.call(&(6, 7), &mut product);
        (status, started.elapsed())
    });

    thread::sleep(Duration::from_millis(20));
    node.shutdown();

    let (status, elapsed) = caller.join().unwrap();
    assert_eq!(status, CallStatus::Failure);
    assert!(elapsed >= CALL_TIMEOUT * 2 - Duration::from_millis(20));
}
