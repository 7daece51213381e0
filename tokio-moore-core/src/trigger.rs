//! Triggers pace a running machine: one step per tick.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::ConfigError;

/// A periodic or event-driven source of ticks.
///
/// The runner waits on [`Trigger::tick`] before every step and does nothing
/// between ticks. `None` means the trigger is exhausted and will never tick
/// again; a machine driven by an exhausted trigger stays pending forever
/// unless it is cancelled through its handle.
pub trait Trigger: Send {
    /// Waits for the next tick.
    fn tick(&mut self) -> impl Future<Output = Option<()>> + Send;
}

impl<T: Trigger> Trigger for &mut T {
    async fn tick(&mut self) -> Option<()> {
        (**self).tick().await
    }
}

/// One step per interval tick.
///
/// Tokio intervals default to [`MissedTickBehavior::Burst`]: after a slow
/// step the missed ticks fire back to back and the machine steps faster than
/// the period. Call `set_missed_tick_behavior(MissedTickBehavior::Delay)`
/// before handing the interval over, or use a [`Ticker`], which does so.
impl Trigger for Interval {
    async fn tick(&mut self) -> Option<()> {
        Interval::tick(self).await;
        Some(())
    }
}

/// Manual ticks: every `()` received is one tick. Dropping every sender
/// exhausts the trigger.
impl Trigger for mpsc::Receiver<()> {
    async fn tick(&mut self) -> Option<()> {
        self.recv().await
    }
}

impl Trigger for mpsc::UnboundedReceiver<()> {
    async fn tick(&mut self) -> Option<()> {
        self.recv().await
    }
}

/// Ticks as fast as the scheduler allows, yielding to it between ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate;

impl Trigger for Immediate {
    async fn tick(&mut self) -> Option<()> {
        tokio::task::yield_now().await;
        Some(())
    }
}

/// A trigger that is exhausted after a fixed number of ticks.
///
/// Created with [`TriggerExt::take`].
#[derive(Debug)]
pub struct Limit<T> {
    inner: T,
    remaining: u64,
}

impl<T: Trigger> Trigger for Limit<T> {
    async fn tick(&mut self) -> Option<()> {
        if self.remaining == 0 {
            return None;
        }
        self.inner.tick().await?;
        self.remaining -= 1;
        Some(())
    }
}

/// Adapters available on every [`Trigger`].
pub trait TriggerExt: Trigger + Sized {
    /// Stops the trigger after `ticks` ticks.
    fn take(self, ticks: u64) -> Limit<Self> {
        Limit {
            inner: self,
            remaining: ticks,
        }
    }
}

impl<T: Trigger> TriggerExt for T {}

/// A non-zero tick period.
///
/// Parses human readable durations such as `"250ms"`, `"1s"` or `"1ns"`.
///
/// ```rust
/// use std::time::Duration;
/// use tokio_moore_core::Period;
///
/// let period: Period = "250ms".parse().unwrap();
/// assert_eq!(period.as_duration(), Duration::from_millis(250));
/// assert!("0s".parse::<Period>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(Duration);

impl Period {
    /// Rejects a zero period.
    pub fn new(period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroPeriod);
        }
        Ok(Self(period))
    }

    /// The period as a plain [`Duration`].
    #[must_use]
    pub fn as_duration(self) -> Duration {
        self.0
    }

    /// A fixed-interval trigger ticking once per period.
    #[must_use]
    pub fn ticker(self) -> Ticker {
        Ticker {
            period: self,
            interval: None,
        }
    }
}

impl TryFrom<Duration> for Period {
    type Error = ConfigError;

    fn try_from(period: Duration) -> Result<Self, Self::Error> {
        Self::new(period)
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let period =
            humantime::parse_duration(s.trim()).map_err(|source| ConfigError::InvalidPeriod {
                input: s.to_owned(),
                source,
            })?;
        Self::new(period)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}

/// The reference fixed-interval trigger.
///
/// The first tick fires one period after the first call to `tick`, and ticks
/// missed by a slow machine are delayed rather than burst, so a machine never
/// steps faster than its period. The underlying timer is created lazily on
/// the runtime that drives the machine, so a `Ticker` can be built outside of
/// any runtime and handed to a blocking run.
#[derive(Debug)]
pub struct Ticker {
    period: Period,
    interval: Option<Interval>,
}

impl Ticker {
    /// Same as [`Period::ticker`].
    #[must_use]
    pub fn new(period: Period) -> Self {
        period.ticker()
    }

    /// The time between two ticks.
    #[must_use]
    pub fn period(&self) -> Period {
        self.period
    }
}

impl Trigger for Ticker {
    async fn tick(&mut self) -> Option<()> {
        let period = self.period.as_duration();
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
        Some(())
    }
}
