//! Core types for tokio-moore.
//!
//! This crate holds everything the runner is generic over: the [`Machine`]
//! abstraction, the [`Trigger`]s that pace it, and the error types shared by
//! every way of running a machine.

mod error;
mod machine;
mod trigger;

pub use crate::error::{ConfigError, RunError};
pub use crate::machine::{FnMachine, Machine};
pub use crate::trigger::{Immediate, Limit, Period, Ticker, Trigger, TriggerExt};
