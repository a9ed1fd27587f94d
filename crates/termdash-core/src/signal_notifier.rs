//! Process-wide POSIX signal notifications.
//!
//! [`SignalNotifier`] turns OS signals into plain callback invocations. Signals
//! of interest are registered with [`connect`](SignalNotifier::connect) before
//! [`start`](SignalNotifier::start); the notifier then spawns a poll thread
//! that drives a current-thread `tokio` runtime with one signal stream per
//! registered signal. Every callback connected to a signal runs on the poll
//! thread, in registration order, each time the signal arrives.
//!
//! Only one notifier may be installed per process at a time.
//!
//! # Example
//!
//! ```no_run
//! use termdash_core::{SignalKind, SignalNotifier};
//!
//! let notifier = SignalNotifier::install()?;
//! notifier.connect(SignalKind::window_change(), || {
//!     println!("terminal resized");
//! })?;
//! notifier.start()?;
//! // ... later, dropping the notifier stops and joins the poll thread.
//! # Ok::<(), termdash_core::CoreError>(())
//! ```
//!
//! # Notes
//!
//! The `tokio` signal driver keeps its OS-level handler installed for the rest
//! of the process once a signal has been registered. After the notifier is
//! dropped, such signals are still intercepted but no longer reach any
//! callback.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tokio::task::JoinSet;

use crate::error::{Result, SignalError};

static INSTALLED: AtomicBool = AtomicBool::new(false);

type Handler = Arc<dyn Fn() + Send + Sync>;

/// Translates OS signals into callback invocations on a dedicated thread.
///
/// # Related
///
/// - [`SignalKind`] - Names the signal to listen for
/// - [`crate::PeriodicTimer`] - The other source of asynchronous wakeups
pub struct SignalNotifier {
    handlers: Mutex<BTreeMap<i32, Vec<Handler>>>,
    started: AtomicBool,
    stop: Arc<Notify>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl SignalNotifier {
    /// Claim the process-wide notifier slot.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::AlreadyInstalled`] while another notifier is alive.
    pub fn install() -> Result<Self> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SignalError::AlreadyInstalled.into());
        }

        Ok(Self {
            handlers: Mutex::new(BTreeMap::new()),
            started: AtomicBool::new(false),
            stop: Arc::new(Notify::new()),
            thread: Mutex::new(None),
        })
    }

    /// Returns `true` if a notifier is currently installed in this process.
    pub fn is_installed() -> bool {
        INSTALLED.load(Ordering::Acquire)
    }

    /// Register `callback` for `kind` and add the signal to the monitored set.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::AlreadyStarted`] once the poll thread is running.
    pub fn connect<F>(&self, kind: SignalKind, callback: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.is_started() {
            return Err(SignalError::AlreadyStarted.into());
        }
        self.handlers
            .lock()
            .entry(kind.as_raw_value())
            .or_default()
            .push(Arc::new(callback));
        Ok(())
    }

    /// Stop monitoring `kind` and drop its callbacks.
    ///
    /// Returns `Ok(false)` if nothing was connected to `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::AlreadyStarted`] once the poll thread is running.
    pub fn disconnect(&self, kind: SignalKind) -> Result<bool> {
        if self.is_started() {
            return Err(SignalError::AlreadyStarted.into());
        }
        Ok(self.handlers.lock().remove(&kind.as_raw_value()).is_some())
    }

    /// Number of distinct signals being monitored.
    pub fn signal_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Returns `true` once [`start`](Self::start) has succeeded.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Register every connected signal with the OS and spawn the poll thread.
    ///
    /// Registration happens on the poll thread, but this call waits for it, so
    /// any failure is returned here and no callback can have run.
    ///
    /// # Errors
    ///
    /// - [`SignalError::AlreadyStarted`] if called twice
    /// - [`SignalError::Spawn`], [`SignalError::Runtime`] or
    ///   [`SignalError::Registration`] if setup failed
    pub fn start(&self) -> Result<()> {
        let mut thread = self.thread.lock();
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SignalError::AlreadyStarted.into());
        }

        let handlers: Vec<(i32, Vec<Handler>)> = self
            .handlers
            .lock()
            .iter()
            .map(|(raw, slots)| (*raw, slots.clone()))
            .collect();
        let stop = self.stop.clone();
        let (ready_tx, ready_rx) = bounded(1);

        let spawned = thread::Builder::new()
            .name("termdash-signals".to_owned())
            .spawn(move || poll_signals(handlers, stop, ready_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                self.started.store(false, Ordering::Release);
                return Err(SignalError::Spawn(err).into());
            }
        };

        let outcome = ready_rx.recv().unwrap_or(Err(SignalError::PollThreadExited));
        match outcome {
            Ok(()) => {
                *thread = Some(handle);
                tracing::debug!(
                    target: "termdash_core::signal_notifier",
                    signals = self.signal_count(),
                    "signal notifier started"
                );
                Ok(())
            }
            Err(err) => {
                let _ = handle.join();
                self.started.store(false, Ordering::Release);
                tracing::error!(
                    target: "termdash_core::signal_notifier",
                    error = %err,
                    "signal notifier failed to start"
                );
                Err(err.into())
            }
        }
    }

    /// Ask the poll thread to exit. Does not wait; see [`wait`](Self::wait).
    pub fn request_stop(&self) {
        // notify_one stores a permit, so a stop requested before the poll loop
        // starts waiting is not lost.
        self.stop.notify_one();
    }

    /// Join the poll thread if it is running.
    pub fn wait(&self) {
        if let Some(handle) = self.thread.lock().take() {
            if handle.join().is_err() {
                tracing::warn!(
                    target: "termdash_core::signal_notifier",
                    "signal callback panicked"
                );
            }
        }
    }
}

impl Drop for SignalNotifier {
    fn drop(&mut self) {
        self.request_stop();
        self.wait();
        INSTALLED.store(false, Ordering::Release);
        tracing::debug!(target: "termdash_core::signal_notifier", "signal notifier released");
    }
}

impl std::fmt::Debug for SignalNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalNotifier")
            .field("signals", &self.signal_count())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}

fn poll_signals(
    handlers: Vec<(i32, Vec<Handler>)>,
    stop: Arc<Notify>,
    ready: Sender<std::result::Result<(), SignalError>>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            let _ = ready.send(Err(SignalError::Runtime(err)));
            return;
        }
    };

    runtime.block_on(async move {
        let mut streams = Vec::with_capacity(handlers.len());
        for (raw, slots) in handlers {
            match signal(SignalKind::from_raw(raw)) {
                Ok(stream) => streams.push((raw, stream, slots)),
                Err(source) => {
                    let _ = ready.send(Err(SignalError::Registration { signal: raw, source }));
                    return;
                }
            }
        }

        let mut tasks = JoinSet::new();
        for (raw, mut stream, slots) in streams {
            tasks.spawn(async move {
                while stream.recv().await.is_some() {
                    tracing::trace!(
                        target: "termdash_core::signal_notifier",
                        signal = raw,
                        "signal received"
                    );
                    for slot in &slots {
                        slot();
                    }
                }
            });
        }
        let _ = ready.send(Ok(()));

        stop.notified().await;
        tasks.shutdown().await;
    });
    // Dropping the runtime deregisters every stream before the thread exits.
}

static_assertions::assert_impl_all!(SignalNotifier: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    // Only one notifier may exist per process.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn send_to_self(sig: &str) {
        let status = Command::new("kill")
            .arg(format!("-{sig}"))
            .arg(std::process::id().to_string())
            .status()
            .unwrap();
        assert!(status.success());
    }

    fn wait_for(count: &AtomicUsize, expected: usize) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if count.load(Ordering::SeqCst) >= expected {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_single_instance() {
        let _serial = SERIAL.lock();
        let first = SignalNotifier::install().unwrap();
        assert!(SignalNotifier::is_installed());
        assert!(matches!(
            SignalNotifier::install(),
            Err(crate::CoreError::Signal(SignalError::AlreadyInstalled))
        ));
        drop(first);
        assert!(!SignalNotifier::is_installed());
        let _second = SignalNotifier::install().unwrap();
    }

    #[test]
    fn test_connect_after_start_fails() {
        let _serial = SERIAL.lock();
        let notifier = SignalNotifier::install().unwrap();
        notifier.connect(SignalKind::window_change(), || {}).unwrap();
        notifier.start().unwrap();
        assert!(matches!(
            notifier.connect(SignalKind::window_change(), || {}),
            Err(crate::CoreError::Signal(SignalError::AlreadyStarted))
        ));
        assert!(notifier.disconnect(SignalKind::window_change()).is_err());
        assert!(notifier.start().is_err());
    }

    #[test]
    fn test_disconnect_before_start() {
        let _serial = SERIAL.lock();
        let notifier = SignalNotifier::install().unwrap();
        notifier.connect(SignalKind::user_defined2(), || {}).unwrap();
        assert_eq!(notifier.signal_count(), 1);
        assert!(notifier.disconnect(SignalKind::user_defined2()).unwrap());
        assert!(!notifier.disconnect(SignalKind::user_defined2()).unwrap());
        assert_eq!(notifier.signal_count(), 0);
    }

    #[test]
    fn test_callbacks_run_in_order() {
        let _serial = SERIAL.lock();
        let notifier = SignalNotifier::install().unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));
        let calls = Arc::new(AtomicUsize::new(0));

        for tag in 0..3 {
            let order = order.clone();
            let calls = calls.clone();
            notifier
                .connect(SignalKind::user_defined1(), move || {
                    order.lock().push(tag);
                    calls.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        notifier.start().unwrap();

        send_to_self("USR1");
        assert!(wait_for(&calls, 3));
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_stop_before_poll_loop_waits() {
        let _serial = SERIAL.lock();
        let notifier = SignalNotifier::install().unwrap();
        notifier.connect(SignalKind::window_change(), || {}).unwrap();
        notifier.request_stop();
        notifier.start().unwrap();
        notifier.wait();
        assert!(notifier.thread.lock().is_none());
    }
}
