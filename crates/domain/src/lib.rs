//! Shared value types, errors and configuration for StayWake.

pub mod config;
pub mod error;
pub mod intent;

pub use error::{Error, Result};
pub use intent::{TimeOfDay, TimerIntent, TimerMode, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES};
