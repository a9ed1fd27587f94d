//! Tracing targets and span names used across termdash.
//!
//! termdash emits diagnostics through the `tracing` crate and never installs a
//! subscriber itself. The dashboard owns the terminal, so a subscriber installed
//! by the embedding tool should write to a file or to stderr redirected away
//! from the dashboard:
//!
//! ```ignore
//! use tracing_subscriber::EnvFilter;
//!
//! tracing_subscriber::fmt()
//!     .with_env_filter(EnvFilter::new("termdash=debug,termdash_core=debug"))
//!     .with_writer(std::fs::File::create("dash.log")?)
//!     .init();
//! ```

/// Span names used throughout termdash for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Dispatch loop span.
    pub const DISPATCH: &str = "termdash::dispatch";
    /// Layout pass span.
    pub const LAYOUT: &str = "termdash::layout";
    /// Render pass span.
    pub const RENDER: &str = "termdash::render";
    /// Timer thread span.
    pub const TIMER: &str = "termdash::timer";
    /// Signal poll span.
    pub const SIGNAL: &str = "termdash::signal";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "termdash_core";
    /// Event queue target.
    pub const QUEUE: &str = "termdash_core::queue";
    /// Periodic timer target.
    pub const TIMER: &str = "termdash_core::timer";
    /// Signal notifier target.
    pub const SIGNAL: &str = "termdash_core::signal_notifier";
    /// Progress model target.
    pub const PROGRESS: &str = "termdash_core::progress";
    /// Application lifecycle target.
    pub const APPLICATION: &str = "termdash::application";
    /// Event dispatch target.
    pub const DISPATCH: &str = "termdash::dispatch";
    /// Layout engine target.
    pub const LAYOUT: &str = "termdash::layout";
    /// Widget tree target.
    pub const WIDGET: &str = "termdash::widget";
    /// Terminal writer target.
    pub const WRITER: &str = "termdash::writer";
}
