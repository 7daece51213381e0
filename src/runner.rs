//! The step loop.

use std::fmt;

use tokio::sync::watch;
use tokio_moore_core::{FnMachine, Machine, RunError, Trigger};

/// Drives a [`Machine`] from its initial state until it reaches its quit
/// state or a transition fails.
///
/// On every tick of the trigger the runner
///
/// 1. stops with `Ok(())` if the current state equals the quit state,
/// 2. otherwise reads one input, runs one transition, and emits the output of
///    the new state.
///
/// A failed transition ends the run with [`RunError::Transition`]. The state
/// the machine was in when the transition failed is kept and no output is
/// emitted for it.
///
/// The state type is shared by the initial state, the quit state and the
/// machine, so the two sentinels cannot disagree with it:
///
/// ```compile_fail
/// use tokio_moore::MachineRunner;
///
/// let runner = MachineRunner::from_fns(
///     0,
///     "done",
///     |state: &i32, input: i32| Ok::<_, std::convert::Infallible>(state + input),
///     || 1,
///     |_: &i32| {},
/// );
/// ```
///
/// ```compile_fail
/// use tokio_moore::MachineRunner;
///
/// // The output sink expects a different state type than the transition.
/// let runner = MachineRunner::from_fns(
///     0,
///     100,
///     |state: &i32, input: i32| Ok::<_, std::convert::Infallible>(state + input),
///     || 1,
///     |_: &String| {},
/// );
/// ```
pub struct MachineRunner<M: Machine> {
    machine: M,
    current: M::State,
    quit: M::State,
}

impl<M: Machine> MachineRunner<M> {
    /// Creates a runner that starts in `initial` and stops once it reaches
    /// `quit`.
    pub fn new(initial: M::State, quit: M::State, machine: M) -> Self {
        Self {
            machine,
            current: initial,
            quit,
        }
    }

    /// The state the machine is in.
    #[must_use]
    pub fn current_state(&self) -> &M::State {
        &self.current
    }

    /// The state that ends a run.
    #[must_use]
    pub fn quit_state(&self) -> &M::State {
        &self.quit
    }

    /// Whether the machine has reached its quit state.
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.current == self.quit
    }

    /// The machine supplying the transition, input and output.
    #[must_use]
    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// Returns the machine and the state it ended in.
    pub fn into_parts(self) -> (M, M::State) {
        (self.machine, self.current)
    }

    /// Performs exactly one transition, ignoring the quit state.
    ///
    /// Reads one input, runs the transition and, if it succeeds, moves into
    /// the new state and emits its output. On error the current state is
    /// left untouched.
    pub fn step(&mut self) -> Result<(), M::Error> {
        let input = self.machine.input();
        self.current = self.machine.transition(&self.current, input)?;
        self.machine.output(&self.current);
        Ok(())
    }

    /// Runs the machine on the current task until it quits or fails.
    ///
    /// If the trigger is exhausted before that, the returned future never
    /// resolves. Drop it to stop the machine.
    pub async fn run<T: Trigger>(&mut self, trigger: T) -> Result<(), RunError<M::Error>> {
        self.drive(trigger, None).await
    }

    /// Runs the machine on the calling thread until it quits or fails.
    ///
    /// A single-threaded runtime is built for the duration of the run, so
    /// it cannot be nested inside another runtime.
    ///
    /// # Panics
    ///
    /// Panics if called from within a Tokio runtime; use [`Self::run`] or
    /// [`Self::fork`] there instead.
    ///
    /// ```rust
    /// use tokio_moore::{Immediate, MachineRunner};
    ///
    /// let mut runner = MachineRunner::from_fns(
    ///     0,
    ///     3,
    ///     |state: &u32, input: u32| Ok::<_, std::convert::Infallible>(state + input),
    ///     || 1,
    ///     |_: &u32| {},
    /// );
    /// runner.run_blocking(Immediate).unwrap();
    /// assert!(runner.is_quit());
    /// ```
    pub fn run_blocking<T: Trigger>(&mut self, trigger: T) -> Result<(), RunError<M::Error>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        runtime.block_on(self.run(trigger))
    }

    pub(crate) async fn drive<T: Trigger>(
        &mut self,
        mut trigger: T,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<(), RunError<M::Error>> {
        tracing::debug!("machine started");
        let mut steps: u64 = 0;

        loop {
            let ticked = tokio::select! {
                biased;
                () = cancelled(&mut cancel) => {
                    tracing::debug!(steps, "machine cancelled");
                    return Err(RunError::Cancelled);
                }
                tick = trigger.tick() => tick.is_some(),
            };

            if !ticked {
                // Nothing will step the machine again; only cancellation ends it.
                tracing::debug!(steps, "trigger exhausted before quit state");
                cancelled(&mut cancel).await;
                tracing::debug!(steps, "machine cancelled");
                return Err(RunError::Cancelled);
            }

            if self.is_quit() {
                tracing::debug!(steps, "machine reached quit state");
                return Ok(());
            }

            if let Err(error) = self.step() {
                tracing::debug!(steps, "transition failed");
                return Err(RunError::Transition(error));
            }
            steps += 1;
            tracing::trace!(steps, "machine stepped");
        }
    }
}

impl<S, In, E, T, I, O> MachineRunner<FnMachine<S, In, E, T, I, O>>
where
    S: PartialEq,
    T: FnMut(&S, In) -> Result<S, E>,
    I: FnMut() -> In,
    O: FnMut(&S),
{
    /// Builds a runner from a transition function, an input source and an
    /// output sink.
    pub fn from_fns(initial: S, quit: S, transition: T, input: I, output: O) -> Self {
        Self::new(initial, quit, FnMachine::new(transition, input, output))
    }
}

impl<M> fmt::Debug for MachineRunner<M>
where
    M: Machine + fmt::Debug,
    M::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineRunner")
            .field("machine", &self.machine)
            .field("current", &self.current)
            .field("quit", &self.quit)
            .finish()
    }
}

/// Resolves once cancellation is requested. Pending forever when there is no
/// signal, or when its sender is gone without cancelling.
async fn cancelled(signal: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = signal {
        let requested = rx.wait_for(|cancel| *cancel).await.is_ok();
        if requested {
            return;
        }
    }
    std::future::pending::<()>().await
}
