//! Error types for the dashboard crate.

use std::path::PathBuf;

use thiserror::Error;

use termdash_core::CoreError;

/// Errors raised while starting or running an [`Application`](crate::Application).
#[derive(Error, Debug)]
pub enum AppError {
    /// Another application already owns the dispatch loop in this process.
    #[error("an application is already running in this process")]
    AlreadyRunning,

    /// A core primitive (timer, signal notifier) failed to start.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Writing to the terminal failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by [`BoxLayout`](crate::layout::BoxLayout) mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The widget is not managed by this layout.
    #[error("widget is not managed by this layout")]
    ItemNotFound,

    /// An insertion or removal index past the end of the item list.
    #[error("index {index} out of range for layout with {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised by [`Widget`](crate::Widget) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// The widget passed is not a child of this widget.
    #[error("widget is not a child of this widget")]
    NotAChild,

    /// A kind-specific operation was called on a widget of another kind.
    #[error("operation requires a {expected} widget, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised while loading an [`ApplicationConfig`](crate::ApplicationConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
