/// Error type returned when a machine run ends without reaching its quit
/// state.
///
/// This enum distinguishes the logical failure reported by your transition
/// function from failures of the machinery around it (cancellation, panics of
/// a forked task, or a runtime that could not be built).
///
/// # Type Parameters
///
/// * `E`: The error type of the machine's transition function.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E> {
    /// The transition function returned an error. The value is passed
    /// through untouched.
    #[error("transition failed: {0}")]
    Transition(E),
    /// The machine was cancelled through its handle before quitting.
    #[error("machine cancelled before reaching its quit state")]
    Cancelled,
    /// The forked machine panicked.
    #[error("machine task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// The runtime or thread backing a run could not be created.
    #[error("failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),
    /// The forked machine's thread ended without reporting a result.
    #[error("machine thread exited without reporting a result")]
    ThreadExited,
}

impl<E> RunError<E> {
    /// Returns the transition error, if this run failed because of one.
    pub fn transition_error(&self) -> Option<&E> {
        match self {
            Self::Transition(error) => Some(error),
            _ => None,
        }
    }

    /// Consumes the error and returns the transition error, if any.
    pub fn into_transition_error(self) -> Option<E> {
        match self {
            Self::Transition(error) => Some(error),
            _ => None,
        }
    }

    /// Whether the run was stopped through a machine handle.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Error returned when a trigger configuration is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The period is not a duration `humantime` understands.
    #[error("invalid tick period {input:?}: {source}")]
    InvalidPeriod {
        input: String,
        #[source]
        source: humantime::DurationError,
    },
    /// Tokio intervals cannot tick with a zero period.
    #[error("tick period must be greater than zero")]
    ZeroPeriod,
}
