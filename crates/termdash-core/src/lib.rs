//! Core primitives for termdash.
//!
//! This crate provides the thread-level building blocks a terminal dashboard
//! is driven by. None of them know about widgets or terminals:
//!
//! - **Event Queue**: Bounded multi-producer queue feeding a dispatch loop
//! - **Periodic Timer**: A callback ticking on its own thread
//! - **Signal Notifier**: POSIX signals delivered as callbacks (Unix only)
//! - **Signal/Slot**: Direct-connection observers
//! - **Progress**: Progress state with pluggable rate and ETA estimators
//! - **Formatting**: Fixed-width sizes, rates, durations and percentages
//!
//! # Timer Example
//!
//! ```no_run
//! use std::time::Duration;
//! use termdash_core::{EventQueue, PeriodicTimer};
//!
//! let queue = EventQueue::new(128);
//! let producer = queue.clone();
//! let timer = PeriodicTimer::new(Duration::from_millis(100), move || {
//!     let _ = producer.try_push("render");
//! });
//! timer.start()?;
//!
//! while let Some(event) = queue.pop() {
//!     println!("{event}");
//! #   break;
//! }
//! # Ok::<(), termdash_core::CoreError>(())
//! ```
//!
//! # Progress Example
//!
//! ```
//! use termdash_core::progress::ProgressData;
//! use termdash_core::format::format_percentage;
//!
//! let progress = ProgressData::new();
//! progress.set_range(0.0, 4.0);
//! progress.update(1.0);
//! assert_eq!(format_percentage(progress.percentage()), " 25%");
//! ```

mod error;
pub mod format;
pub mod logging;
pub mod progress;
mod queue;
pub mod signal;
#[cfg(unix)]
mod signal_notifier;
mod timer;

pub use error::{CoreError, QueueError, Result, SignalError, TimerError};
pub use progress::{
    EtaStrategy, EwmaRate, ProgressData, ProgressSample, ProgressSnapshot, RateStrategy,
    SmoothedEta,
};
pub use queue::EventQueue;
pub use signal::{ConnectionId, Signal};
#[cfg(unix)]
pub use signal_notifier::SignalNotifier;
#[cfg(unix)]
pub use tokio::signal::unix::SignalKind;
pub use timer::{PeriodicTimer, TimerId};
