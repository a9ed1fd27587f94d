//! Error types for termdash core primitives.

use std::fmt;

/// The main error type for termdash core operations.
#[derive(Debug)]
pub enum CoreError {
    /// Timer-related error.
    Timer(TimerError),
    /// Signal notifier error.
    Signal(SignalError),
    /// Event queue error.
    Queue(QueueError),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(err) => write!(f, "Timer error: {err}"),
            Self::Signal(err) => write!(f, "Signal notifier error: {err}"),
            Self::Queue(err) => write!(f, "Event queue error: {err}"),
        }
    }
}

impl std::error::Error for CoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Timer(err) => Some(err),
            Self::Signal(err) => Some(err),
            Self::Queue(err) => Some(err),
        }
    }
}

/// Timer-specific errors.
#[derive(Debug)]
pub enum TimerError {
    /// `start()` was called on a timer that is already running.
    AlreadyRunning,
    /// `start()` was called on a timer that has been stopped.
    Stopped,
    /// The timer thread could not be spawned.
    Spawn(std::io::Error),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "Timer is already running"),
            Self::Stopped => write!(f, "Timer has been stopped and cannot be restarted"),
            Self::Spawn(err) => write!(f, "Failed to spawn timer thread: {err}"),
        }
    }
}

impl std::error::Error for TimerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Signal notifier errors.
#[derive(Debug)]
pub enum SignalError {
    /// Another notifier is already installed in this process.
    AlreadyInstalled,
    /// The notifier is already polling; the signal set is frozen.
    AlreadyStarted,
    /// Registering interest in an OS signal failed.
    Registration {
        /// Raw signal number.
        signal: i32,
        /// Underlying OS error.
        source: std::io::Error,
    },
    /// The async runtime backing the poll thread could not be built.
    Runtime(std::io::Error),
    /// The poll thread could not be spawned.
    Spawn(std::io::Error),
    /// The poll thread exited before reporting readiness.
    PollThreadExited,
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInstalled => write!(f, "A signal notifier is already installed"),
            Self::AlreadyStarted => write!(f, "Signal notifier is already started"),
            Self::Registration { signal, source } => {
                write!(f, "Failed to register signal {signal}: {source}")
            }
            Self::Runtime(err) => write!(f, "Failed to build signal runtime: {err}"),
            Self::Spawn(err) => write!(f, "Failed to spawn signal poll thread: {err}"),
            Self::PollThreadExited => {
                write!(f, "Signal poll thread exited before it was ready")
            }
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Registration { source, .. } => Some(source),
            Self::Runtime(err) | Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Event queue errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is full.
    Full,
    /// Waiting for space or for an item timed out.
    Timeout,
    /// The other side of the queue has been dropped.
    Disconnected,
    /// The queue is empty.
    Empty,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "Queue is full"),
            Self::Timeout => write!(f, "Timed out waiting on queue"),
            Self::Disconnected => write!(f, "Queue is disconnected"),
            Self::Empty => write!(f, "Queue is empty"),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<TimerError> for CoreError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

impl From<SignalError> for CoreError {
    fn from(err: SignalError) -> Self {
        Self::Signal(err)
    }
}

impl From<QueueError> for CoreError {
    fn from(err: QueueError) -> Self {
        Self::Queue(err)
    }
}

/// A specialized Result type for termdash core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
