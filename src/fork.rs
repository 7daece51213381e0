//! Running a machine in the background.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use tokio::sync::{oneshot, watch};
use tokio_moore_core::{Machine, RunError, Trigger};
use tracing::Instrument;

use crate::runner::MachineRunner;

impl<M> MachineRunner<M>
where
    M: Machine + Send + 'static,
    M::State: Send + 'static,
    M::Error: Send + 'static,
{
    /// Moves the runner onto a dedicated thread and returns immediately.
    ///
    /// Each forked machine gets its own OS thread driving a single-threaded
    /// runtime, so input and output functions may block without stalling the
    /// caller or any other machine.
    ///
    /// The returned [`MachineTask`] resolves exactly once, with `Ok(())` when
    /// the machine quits or with the error that ended it. Dropping the task
    /// detaches the machine, which keeps running. The [`MachineHandle`] can
    /// cancel it.
    ///
    /// The thread owns the runner; nothing else can observe its state while
    /// it runs except through the output function.
    ///
    /// Timers created on another runtime, such as a raw
    /// [`tokio::time::Interval`], stay bound to that runtime and only tick
    /// while it is driven. A [`Ticker`](tokio_moore_core::Ticker) creates its
    /// timer on the machine's own runtime.
    pub fn fork<T>(self, trigger: T) -> (MachineHandle, MachineTask<M::Error>)
    where
        T: Trigger + 'static,
    {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (result_tx, result_rx) = oneshot::channel();
        let span = tracing::debug_span!("forked_machine");
        let runner = self;

        let spawned = thread::Builder::new()
            .name("moore-machine".to_owned())
            .spawn(move || {
                let result = run_dedicated(runner, trigger, cancel_rx, span);
                let _ = result_tx.send(result);
            });

        let (result, thread) = match spawned {
            Ok(thread) => (result_rx, Some(thread)),
            Err(e) => {
                tracing::debug!("failed to spawn machine thread: {}", e);
                let (tx, rx) = oneshot::channel();
                let _ = tx.send(Err(RunError::Runtime(e)));
                (rx, None)
            }
        };

        (
            MachineHandle {
                cancel_tx: Arc::new(cancel_tx),
            },
            MachineTask { result, thread },
        )
    }
}

/// Body of a machine thread: a private runtime running the loop as its only
/// task, so a panicking machine surfaces as a join error.
fn run_dedicated<M, T>(
    mut runner: MachineRunner<M>,
    trigger: T,
    cancel: watch::Receiver<bool>,
    span: tracing::Span,
) -> Result<(), RunError<M::Error>>
where
    M: Machine + Send + 'static,
    M::State: Send + 'static,
    M::Error: Send + 'static,
    T: Trigger + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let task = runtime.spawn(
        async move { runner.drive(trigger, Some(cancel)).await }.instrument(span),
    );
    runtime.block_on(task)?
}

/// Control side of a forked machine.
///
/// Dropping every handle does not stop the machine.
#[derive(Debug, Clone)]
pub struct MachineHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl MachineHandle {
    /// Asks the machine to stop before its next step.
    ///
    /// The machine's task then resolves with [`RunError::Cancelled`], even
    /// when its trigger is exhausted. Has no effect on a machine that has
    /// already finished.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// The eventual result of a forked machine.
///
/// Can be awaited from any executor.
#[must_use = "dropping a MachineTask detaches the machine and discards its result"]
#[derive(Debug)]
pub struct MachineTask<E> {
    result: oneshot::Receiver<Result<(), RunError<E>>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl<E> MachineTask<E> {
    /// Whether the machine's thread has stopped running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(thread::JoinHandle::is_finished)
    }
}

impl<E> Future for MachineTask<E> {
    type Output = Result<(), RunError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.result).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(_)) => Poll::Ready(Err(RunError::ThreadExited)),
            Poll::Pending => Poll::Pending,
        }
    }
}
