use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_moore::{Immediate, MachineRunner, Period, RunError, TriggerExt};

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Internal error: {0}")]
    Internal(String),
}

#[tokio::test]
async fn test_fork_reaches_quit_state() {
    let success = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&success);
    let runner = MachineRunner::from_fns(
        0,
        100,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        move |state: &i32| {
            if *state == 100 {
                flag.store(true, Ordering::SeqCst);
            }
        },
    );

    let period: Period = "1ns".parse().unwrap();
    let (_handle, task) = runner.fork(period.ticker());

    task.await.unwrap();
    assert!(success.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_fork_propagates_transition_error() {
    let runner = MachineRunner::from_fns(
        0,
        -1,
        |state: &i32, input: i32| {
            if *state == 100 {
                return Err(TestError::Internal("I had a failure".to_string()));
            }
            Ok(state + input)
        },
        || 1,
        |_: &i32| {},
    );

    let (_handle, task) = runner.fork(Immediate);

    match task.await {
        Err(RunError::Transition(TestError::Internal(msg))) => assert_eq!(msg, "I had a failure"),
        other => panic!("expected transition error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fork_returns_before_first_step() {
    let (tick_tx, tick_rx) = mpsc::channel(1);
    let transitions = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&transitions);
    let runner = MachineRunner::from_fns(
        0u8,
        2,
        move |state: &u8, _: ()| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TestError>(state + 1)
        },
        || (),
        |_: &u8| {},
    );

    let (_handle, task) = runner.fork(tick_rx);
    assert_eq!(transitions.load(Ordering::SeqCst), 0);
    assert!(!task.is_finished());

    for _ in 0..3 {
        tick_tx.send(()).await.unwrap();
    }
    task.await.unwrap();
    assert_eq!(transitions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cancel_stops_waiting_machine() {
    let (tick_tx, tick_rx) = mpsc::channel(1);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let runner = MachineRunner::from_fns(
        0,
        10,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        move |state: &i32| {
            let _ = out_tx.send(*state);
        },
    );

    let (handle, task) = runner.fork(tick_rx);
    tick_tx.send(()).await.unwrap();
    assert_eq!(out_rx.recv().await, Some(1));
    tick_tx.send(()).await.unwrap();
    assert_eq!(out_rx.recv().await, Some(2));

    // Parked on the third tick.
    handle.cancel();

    let err = task.await.unwrap_err();
    assert!(err.is_cancelled());
    // The runner, and the sink with it, is gone once the task resolves.
    assert_eq!(out_rx.recv().await, None);
}

#[tokio::test]
async fn test_blocking_input_does_not_stall_caller() {
    let runner = MachineRunner::from_fns(
        0,
        1,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || {
            std::thread::sleep(Duration::from_millis(300));
            1
        },
        |_: &i32| {},
    );

    let (_handle, task) = runner.fork(Immediate);

    let start = std::time::Instant::now();
    tokio::time::sleep(Duration::from_millis(1)).await;
    let waited = start.elapsed();
    assert!(waited < Duration::from_millis(100), "caller waited {waited:?}");

    task.await.unwrap();
}

#[test]
fn test_fork_without_caller_runtime() {
    let runner = MachineRunner::from_fns(
        0,
        20,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        |_: &i32| {},
    );

    let (_handle, task) = runner.fork(Period::new(Duration::from_millis(1)).unwrap().ticker());
    let result = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(task);

    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_resolves_exhausted_trigger() {
    let runner = MachineRunner::from_fns(
        0,
        10,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        |_: &i32| {},
    );

    let (handle, mut task) = runner.fork(Immediate.take(2));

    let pending = tokio::time::timeout(Duration::from_secs(60), &mut task).await;
    assert!(pending.is_err());

    handle.cancel();
    assert!(task.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_dropping_handle_does_not_cancel() {
    let runner = MachineRunner::from_fns(
        0,
        50,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        |_: &i32| {},
    );

    let (handle, task) = runner.fork(Immediate);
    drop(handle);

    task.await.unwrap();
}

#[tokio::test]
async fn test_detached_machine_keeps_running() {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let runner = MachineRunner::from_fns(
        0,
        5,
        |state: &i32, input: i32| Ok::<_, TestError>(state + input),
        || 1,
        move |state: &i32| {
            let _ = out_tx.send(*state);
        },
    );

    let (_handle, task) = runner.fork(Immediate);
    drop(task);

    let mut seen = Vec::new();
    while let Some(state) = out_rx.recv().await {
        seen.push(state);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_panicking_transition_is_a_join_error() {
    let runner = MachineRunner::from_fns(
        0,
        10,
        |state: &i32, _: ()| -> Result<i32, TestError> {
            if *state == 3 {
                panic!("transition blew up");
            }
            Ok(state + 1)
        },
        || (),
        |_: &i32| {},
    );

    let (_handle, task) = runner.fork(Immediate);

    match task.await {
        Err(RunError::Join(e)) => assert!(e.is_panic()),
        other => panic!("expected join error, got {other:?}"),
    }
}
