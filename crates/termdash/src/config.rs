//! Application configuration.
//!
//! [`ApplicationConfig`] collects the tunables of the dispatch loop. Every
//! field has a default, so a TOML file only needs to name what it changes:
//!
//! ```toml
//! frame_interval_ms = 50
//! fixed_width = 100
//! handle_signals = false
//! ```
//!
//! ```
//! use termdash::ApplicationConfig;
//!
//! let config = ApplicationConfig::from_toml_str("frame_interval_ms = 50")?;
//! assert_eq!(config.frame_interval().as_millis(), 50);
//! assert_eq!(config.queue_capacity, 128);
//! # Ok::<(), termdash::ConfigError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables for an [`Application`](crate::Application).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// How often every root widget is redrawn.
    pub frame_interval_ms: u64,
    /// How often the terminal size is polled, in addition to `SIGWINCH`.
    pub resize_poll_interval_ms: u64,
    /// Capacity of the event queue.
    pub queue_capacity: usize,
    /// How long a producer thread waits for queue space before giving up.
    pub push_timeout_ms: u64,
    /// Width assumed when the terminal reports no size (e.g. output is piped).
    pub fallback_width: u16,
    /// Render at this width instead of querying the terminal.
    pub fixed_width: Option<u16>,
    /// Listen for `SIGWINCH` to pick up resizes immediately.
    pub handle_signals: bool,
    /// Turn off terminal autowrap while the application runs.
    pub disable_line_wrap: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            resize_poll_interval_ms: 1000,
            queue_capacity: 128,
            push_timeout_ms: 1000,
            fallback_width: 120,
            fixed_width: None,
            handle_signals: true,
            disable_line_wrap: true,
        }
    }
}

impl ApplicationConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a field
    /// has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Set the redraw interval.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval_ms = duration_to_millis(interval);
        self
    }

    /// Set the terminal size poll interval.
    pub fn with_resize_poll_interval(mut self, interval: Duration) -> Self {
        self.resize_poll_interval_ms = duration_to_millis(interval);
        self
    }

    /// Set the event queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set how long producers wait for queue space.
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout_ms = duration_to_millis(timeout);
        self
    }

    /// Render at a fixed width instead of the terminal's.
    pub fn with_fixed_width(mut self, width: Option<u16>) -> Self {
        self.fixed_width = width;
        self
    }

    /// Enable or disable `SIGWINCH` handling.
    pub fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    /// Enable or disable turning off autowrap.
    pub fn with_line_wrap_disabled(mut self, disabled: bool) -> Self {
        self.disable_line_wrap = disabled;
        self
    }

    /// The redraw interval. Never shorter than one millisecond.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    /// The terminal size poll interval. Never shorter than one millisecond.
    pub fn resize_poll_interval(&self) -> Duration {
        Duration::from_millis(self.resize_poll_interval_ms.max(1))
    }

    /// How long producers wait for queue space.
    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.frame_interval(), Duration::from_millis(100));
        assert_eq!(config.resize_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.queue_capacity, 128);
        assert_eq!(config.fallback_width, 120);
        assert!(config.handle_signals);
        assert!(config.disable_line_wrap);
    }

    #[test]
    fn test_partial_toml() {
        let config = ApplicationConfig::from_toml_str(
            "queue_capacity = 16\nfixed_width = 80\nhandle_signals = false\n",
        )
        .unwrap();
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.fixed_width, Some(80));
        assert!(!config.handle_signals);
        assert_eq!(config.frame_interval_ms, 100);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ApplicationConfig::from_toml_str("queue_capacity = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "frame_interval_ms = 40").unwrap();
        let config = ApplicationConfig::load(file.path()).unwrap();
        assert_eq!(config.frame_interval(), Duration::from_millis(40));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ApplicationConfig::load("/nonexistent/termdash.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_builders_and_roundtrip() {
        let config = ApplicationConfig::default()
            .with_frame_interval(Duration::from_millis(20))
            .with_fixed_width(Some(60))
            .with_signal_handling(false);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(ApplicationConfig::from_toml_str(&text).unwrap(), config);
    }
}
