//! Tick runtime - runs game machines on tokio
//!
//! Each game instance lives on its own task (see [`Session`]); the machine
//! decides when the timer is armed, re-armed or cancelled and the task carries
//! those instructions out with `tokio::time`.
//!
//! [`SimConfig`] holds the headless simulator settings read from the
//! environment.

pub mod config;
pub mod session;

pub use config::{ConfigError, GameKind, SimConfig};
pub use session::{arm, ScheduleError, Session, INTENT_QUEUE};
