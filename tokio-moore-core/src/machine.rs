//! The machine abstraction driven by the runner.

use std::fmt;
use std::marker::PhantomData;

/// A Moore machine: its output depends only on the state it is in.
///
/// A machine supplies three behaviours. The runner reads one input from
/// [`Machine::input`], feeds it together with the current state to
/// [`Machine::transition`], and hands every state it moves into to
/// [`Machine::output`].
///
/// The associated types bind the three behaviours together. The state taken
/// and returned by the transition is the state given to the output sink and
/// compared against the quit state, and the transition only accepts the input
/// type the input source produces. Miswiring them is a compile error:
///
/// ```compile_fail
/// use tokio_moore_core::FnMachine;
///
/// // The input source produces `&str`, the transition wants `i32`.
/// let machine = FnMachine::new(
///     |state: &i32, input: i32| Ok::<_, std::convert::Infallible>(state + input),
///     || "one",
///     |_: &i32| {},
/// );
/// ```
///
/// # Example
///
/// ```rust
/// use tokio_moore_core::Machine;
///
/// struct Blinker {
///     lit: Vec<bool>,
/// }
///
/// impl Machine for Blinker {
///     type State = bool;
///     type Input = ();
///     type Error = std::convert::Infallible;
///
///     fn input(&mut self) {}
///
///     fn transition(&mut self, state: &bool, _: ()) -> Result<bool, Self::Error> {
///         Ok(!state)
///     }
///
///     fn output(&mut self, state: &bool) {
///         self.lit.push(*state);
///     }
/// }
/// ```
pub trait Machine {
    /// The state space. Compared by value against the quit state.
    type State: PartialEq;
    /// The value read from the input source once per step.
    type Input;
    /// The error a transition may fail with. It ends the run.
    type Error;

    /// Reads the next input. Called exactly once per step.
    fn input(&mut self) -> Self::Input;

    /// Computes the state following `state` given `input`.
    fn transition(
        &mut self,
        state: &Self::State,
        input: Self::Input,
    ) -> Result<Self::State, Self::Error>;

    /// Emits the output of a freshly entered state.
    fn output(&mut self, state: &Self::State);
}

/// A [`Machine`] assembled from three closures.
///
/// Usually built through `MachineRunner::from_fns` rather than directly.
pub struct FnMachine<S, In, E, T, I, O> {
    transition: T,
    input: I,
    output: O,
    _types: PhantomData<fn(&S, In) -> Result<S, E>>,
}

impl<S, In, E, T, I, O> FnMachine<S, In, E, T, I, O>
where
    T: FnMut(&S, In) -> Result<S, E>,
    I: FnMut() -> In,
    O: FnMut(&S),
{
    /// Wraps a transition function, an input source and an output sink.
    pub fn new(transition: T, input: I, output: O) -> Self {
        Self {
            transition,
            input,
            output,
            _types: PhantomData,
        }
    }
}

impl<S, In, E, T, I, O> Machine for FnMachine<S, In, E, T, I, O>
where
    S: PartialEq,
    T: FnMut(&S, In) -> Result<S, E>,
    I: FnMut() -> In,
    O: FnMut(&S),
{
    type State = S;
    type Input = In;
    type Error = E;

    fn input(&mut self) -> In {
        (self.input)()
    }

    fn transition(&mut self, state: &S, input: In) -> Result<S, E> {
        (self.transition)(state, input)
    }

    fn output(&mut self, state: &S) {
        (self.output)(state)
    }
}

impl<S, In, E, T, I, O> fmt::Debug for FnMachine<S, In, E, T, I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMachine").finish_non_exhaustive()
    }
}
