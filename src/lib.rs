//! # tokio-moore
//!
//! A reusable driver for Moore machines on Tokio. You supply the state space,
//! the transition logic, an input source and an output sink; the runner steps
//! the machine once per tick of a [`Trigger`] until it reaches its quit state
//! or a transition fails.
//!
//! Every tick the runner checks for the quit state, then reads one input,
//! computes the next state and emits the output of that state. A machine can
//! run on the calling thread ([`MachineRunner::run_blocking`]), on the
//! current task ([`MachineRunner::run`]), or be forked onto its own thread
//! ([`MachineRunner::fork`]).
//!
//! ## Example
//!
//! ```rust
//! use tokio_moore::{MachineRunner, Period};
//!
//! #[derive(Debug, PartialEq)]
//! struct Overflow;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runner = MachineRunner::from_fns(
//!     0u32,
//!     5,
//!     |count: &u32, step: u32| count.checked_add(step).ok_or(Overflow),
//!     || 1,
//!     |count: &u32| println!("count = {count}"),
//! );
//!
//! let period: Period = "1ms".parse().unwrap();
//! let (_handle, task) = runner.fork(period.ticker());
//! task.await.unwrap();
//! # }
//! ```
//!
//! ## Stopping a machine
//!
//! A machine stops when it reaches its quit state or when its transition
//! fails. A trigger that stops ticking does not stop it: the run stays
//! pending. Forked machines can additionally be cancelled through their
//! [`MachineHandle`].

mod fork;
mod runner;

#[doc(inline)]
pub use crate::fork::{MachineHandle, MachineTask};
#[doc(inline)]
pub use crate::runner::MachineRunner;
#[doc(inline)]
pub use tokio_moore_core::*;
