//! Example: a traffic light driven by a fixed-interval ticker.
//!
//! Run with `RUST_LOG=trace cargo run --example counter` to see every step.

use tokio_moore::{Machine, MachineRunner, Period};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Light {
    Red,
    Green,
    Yellow,
    Off,
}

#[derive(Debug, thiserror::Error)]
pub enum LightError {
    #[error("light was already switched off")]
    AlreadyOff,
}

/// Cycles red, green, yellow a fixed number of times, then switches off.
#[derive(Debug)]
pub struct TrafficLight {
    cycles_left: u32,
}

impl Machine for TrafficLight {
    type State = Light;
    type Input = bool;
    type Error = LightError;

    /// Whether the light should keep cycling.
    fn input(&mut self) -> bool {
        self.cycles_left > 0
    }

    fn transition(&mut self, light: &Light, keep_going: bool) -> Result<Light, LightError> {
        let next = match (light, keep_going) {
            (Light::Off, _) => return Err(LightError::AlreadyOff),
            (Light::Red, true) => Light::Green,
            (Light::Red, false) => Light::Off,
            (Light::Green, _) => Light::Yellow,
            (Light::Yellow, _) => {
                self.cycles_left = self.cycles_left.saturating_sub(1);
                Light::Red
            }
        };
        Ok(next)
    }

    fn output(&mut self, light: &Light) {
        tracing::info!(?light, cycles_left = self.cycles_left, "light changed");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(true).with_line_number(true))
        .init();

    let period: Period = match "100ms".parse() {
        Ok(period) => period,
        Err(e) => {
            tracing::error!("Invalid period: {}", e);
            std::process::exit(1);
        }
    };

    let runner = MachineRunner::new(Light::Red, Light::Off, TrafficLight { cycles_left: 2 });
    let (_handle, task) = runner.fork(period.ticker());

    match task.await {
        Ok(()) => tracing::info!("traffic light switched off"),
        Err(e) => {
            tracing::error!("Traffic light failed: {}", e);
            std::process::exit(1);
        }
    }
}
