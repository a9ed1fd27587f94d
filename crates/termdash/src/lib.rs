//! termdash - live terminal dashboards for long-running work.
//!
//! A tree of widgets (progress bars, spinners, labels) negotiates the width
//! of a terminal line through box layouts and is redrawn in place by a
//! concurrent event loop. Work running on any thread reports progress through
//! [`ProgressData`](termdash_core::ProgressData); the dashboard smooths rate
//! and ETA estimates and redraws on a fixed cadence.
//!
//! # Example
//!
//! ```no_run
//! use termdash::indicator::ProgressIndicator;
//! use termdash::{Application, ApplicationConfig};
//!
//! fn main() -> Result<(), termdash::AppError> {
//!     let app = Application::new(ApplicationConfig::default());
//!     app.start()?;
//!
//!     let indicator = ProgressIndicator::with_default_widgets("download");
//!     indicator.set_range(0.0, 1000.0);
//!     indicator.start(&app);
//!     for done in 0..=1000 {
//!         indicator.set_value(done as f64);
//!         std::thread::sleep(std::time::Duration::from_millis(2));
//!     }
//!     indicator.stop();
//!
//!     app.stop();
//!     Ok(())
//! }
//! ```
//!
//! # Crate Layout
//!
//! - [`Application`]: dispatch thread, event queue, frame composition
//! - [`Widget`]: the widget tree and its event handlers
//! - [`layout`]: the box layout sizing algorithm
//! - [`widgets`]: bar, label and animation state
//! - [`indicator`]: a ready-made progress line
//! - [`termdash_core`]: timers, signals, queues and the progress model

mod application;
pub mod config;
mod error;
pub mod event;
mod geometry;
pub mod indicator;
pub mod layout;
mod terminal;
mod widget;
pub mod widgets;
mod writer;

pub use application::{AppContext, Application};
pub use config::ApplicationConfig;
pub use error::{AppError, AppResult, ConfigError, LayoutError, WidgetError};
pub use event::{ChildChange, Event, EventData, EventItem, EventType};
pub use geometry::{Alignment, SizePolicy, SizePolicyFlags};
pub use terminal::{query_size, TerminalSize};
pub use widget::{Widget, WidgetId};
pub use writer::TerminalWriter;

pub use termdash_core;
