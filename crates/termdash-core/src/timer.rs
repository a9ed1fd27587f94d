//! Periodic timers backed by a dedicated thread.
//!
//! A [`PeriodicTimer`] invokes its callback once immediately after
//! [`start`](PeriodicTimer::start) and then once per interval until it is
//! stopped, its optional timeout elapses, or it is dropped. The next wakeup is
//! computed before the callback runs, so a slow callback does not push later
//! ticks back by its own run time.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use termdash_core::PeriodicTimer;
//!
//! let timer = PeriodicTimer::new(Duration::from_millis(100), || {
//!     println!("tick");
//! })
//! .with_name("frame-clock");
//!
//! timer.start()?;
//! std::thread::sleep(Duration::from_millis(350));
//! timer.stop();
//! # Ok::<(), termdash_core::CoreError>(())
//! ```
//!
//! # Callback contract
//!
//! Callbacks run on the timer thread with no lock held and must return
//! promptly. [`PeriodicTimer::stop`] joins the thread, so a callback that blocks
//! forever also blocks whoever stops the timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{Result, TimerError};

/// Unique identifier of a [`PeriodicTimer`] within the process.
///
/// Timer ids are used to tag timer events so a widget owning several timers
/// can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct TimerState {
    interval: Duration,
    timeout: Option<Duration>,
    callback: Callback,
    running: bool,
    paused: bool,
    stopped: bool,
}

struct Shared {
    state: Mutex<TimerState>,
    condvar: Condvar,
    fire_count: AtomicU64,
    thread_id: Mutex<Option<ThreadId>>,
}

impl Shared {
    fn interrupt(&self) {
        self.condvar.notify_all();
    }
}

/// A callback ticking on its own thread at a fixed interval.
///
/// All control methods take `&self` and may be called from any thread,
/// including from inside the callback.
///
/// # Related
///
/// - [`TimerId`] - Identifies the timer in timer events
/// - [`crate::EventQueue`] - Where timer callbacks usually push events
pub struct PeriodicTimer {
    id: TimerId,
    name: String,
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PeriodicTimer {
    /// Create a stopped timer that will call `callback` every `interval`.
    pub fn new<F>(interval: Duration, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = TimerId::next();
        Self {
            id,
            name: format!("termdash-{id}"),
            shared: Arc::new(Shared {
                state: Mutex::new(TimerState {
                    interval,
                    timeout: None,
                    callback: Arc::new(callback),
                    running: false,
                    paused: false,
                    stopped: false,
                }),
                condvar: Condvar::new(),
                fire_count: AtomicU64::new(0),
                thread_id: Mutex::new(None),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Set the name given to the timer thread.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The unique id of this timer.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// The name of the timer thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Spawn the timer thread. The callback fires immediately, then once per
    /// interval.
    ///
    /// # Errors
    ///
    /// - [`TimerError::AlreadyRunning`] if the thread is already ticking
    /// - [`TimerError::Stopped`] if [`stop`](Self::stop) was called before
    /// - [`TimerError::Spawn`] if the OS refused to create the thread
    pub fn start(&self) -> Result<()> {
        let mut handle = self.handle.lock();
        {
            let mut state = self.shared.state.lock();
            if state.stopped {
                return Err(TimerError::Stopped.into());
            }
            if state.running {
                return Err(TimerError::AlreadyRunning.into());
            }
            state.running = true;
        }

        // A previous run ended by its timeout; reap it before respawning.
        if let Some(finished) = handle.take() {
            let _ = finished.join();
        }

        let shared = self.shared.clone();
        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || timer_loop(shared));

        match spawned {
            Ok(join) => {
                *handle = Some(join);
                tracing::debug!(
                    target: "termdash_core::timer",
                    id = %self.id,
                    name = %self.name,
                    "timer started"
                );
                Ok(())
            }
            Err(err) => {
                self.shared.state.lock().running = false;
                Err(TimerError::Spawn(err).into())
            }
        }
    }

    /// Park the timer thread until [`resume`](Self::resume) is called.
    pub fn pause(&self) {
        self.shared.state.lock().paused = true;
        self.shared.interrupt();
    }

    /// Wake a paused timer. The callback fires right away, then the regular
    /// cadence continues.
    pub fn resume(&self) {
        self.shared.state.lock().paused = false;
        self.shared.interrupt();
    }

    /// Stop the timer for good and join its thread.
    ///
    /// Calling `stop` more than once is harmless. Once it returns, the callback
    /// will not run again. When called from the timer's own callback the stop
    /// is only flagged; the thread exits as soon as the callback returns.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.stopped = true;
            state.paused = false;
        }
        self.shared.interrupt();

        if *self.shared.thread_id.lock() == Some(thread::current().id()) {
            return;
        }

        let mut handle = self.handle.lock();
        if let Some(join) = handle.take() {
            if join.join().is_err() {
                tracing::warn!(
                    target: "termdash_core::timer",
                    id = %self.id,
                    "timer callback panicked"
                );
            }
            tracing::debug!(target: "termdash_core::timer", id = %self.id, "timer stopped");
        }
    }

    /// Change the tick interval. Takes effect from the next tick.
    pub fn set_interval(&self, interval: Duration) {
        self.shared.state.lock().interval = interval;
        self.shared.interrupt();
    }

    /// The current tick interval.
    pub fn interval(&self) -> Duration {
        self.shared.state.lock().interval
    }

    /// Bound the timer's lifetime: the thread exits once `timeout` has elapsed
    /// since it started. `None` removes the bound.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.shared.state.lock().timeout = timeout;
        self.shared.interrupt();
    }

    /// Replace the callback. Takes effect from the next tick.
    pub fn set_function<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.state.lock().callback = Arc::new(callback);
    }

    /// Returns `true` while the timer thread is alive.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Returns `true` if the timer is paused.
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Returns `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    /// Number of times the callback has run.
    pub fn fire_count(&self) -> u64 {
        self.shared.fire_count.load(Ordering::Acquire)
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for PeriodicTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicTimer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fire_count", &self.fire_count())
            .finish_non_exhaustive()
    }
}

fn timer_loop(shared: Arc<Shared>) {
    *shared.thread_id.lock() = Some(thread::current().id());
    let started = Instant::now();

    let mut state = shared.state.lock();
    loop {
        if state.stopped {
            break;
        }
        if state.paused {
            shared.condvar.wait(&mut state);
            continue;
        }
        let deadline = state.timeout.map(|timeout| started + timeout);
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::trace!(target: "termdash_core::timer", "timer timeout elapsed");
            break;
        }

        let next_wakeup = Instant::now() + state.interval;
        let callback = state.callback.clone();
        MutexGuard::unlocked(&mut state, || callback());
        shared.fire_count.fetch_add(1, Ordering::AcqRel);

        let wake_at = deadline.map_or(next_wakeup, |deadline| deadline.min(next_wakeup));
        while !state.stopped && !state.paused {
            if shared.condvar.wait_until(&mut state, wake_at).timed_out() {
                break;
            }
        }
    }
    state.running = false;
    drop(state);
    *shared.thread_id.lock() = None;
}

static_assertions::assert_impl_all!(PeriodicTimer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_timer(interval_ms: u64) -> (PeriodicTimer, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let timer = PeriodicTimer::new(Duration::from_millis(interval_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, count)
    }

    #[test]
    fn test_unique_ids() {
        let (a, _) = counting_timer(10);
        let (b, _) = counting_timer(10);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_fires_immediately_then_periodically() {
        let (timer, count) = counting_timer(50);
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(120));
        timer.stop();

        let fired = count.load(Ordering::SeqCst);
        assert!((2..=3).contains(&fired), "fired {fired} times");

        thread::sleep(Duration::from_millis(120));
        assert_eq!(count.load(Ordering::SeqCst), fired);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (timer, _) = counting_timer(10);
        timer.start().unwrap();
        timer.stop();
        timer.stop();
        assert!(timer.is_stopped());
    }

    #[test]
    fn test_start_twice_fails() {
        let (timer, _) = counting_timer(10);
        timer.start().unwrap();
        assert!(matches!(
            timer.start(),
            Err(crate::CoreError::Timer(TimerError::AlreadyRunning))
        ));
        timer.stop();
        assert!(matches!(
            timer.start(),
            Err(crate::CoreError::Timer(TimerError::Stopped))
        ));
    }

    #[test]
    fn test_pause_and_resume() {
        let (timer, count) = counting_timer(10);
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(30));
        timer.pause();
        thread::sleep(Duration::from_millis(20));
        let paused_at = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), paused_at);
        assert!(timer.is_paused());

        timer.resume();
        thread::sleep(Duration::from_millis(40));
        assert!(count.load(Ordering::SeqCst) > paused_at);
        timer.stop();
    }

    #[test]
    fn test_stop_wakes_paused_timer() {
        let (timer, _) = counting_timer(10);
        timer.start().unwrap();
        timer.pause();
        timer.stop();
        assert!(!timer.is_running());
    }

    #[test]
    fn test_timeout_ends_thread() {
        let (timer, count) = counting_timer(10);
        timer.set_timeout(Some(Duration::from_millis(50)));
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(120));
        assert!(!timer.is_running());
        let fired = count.load(Ordering::SeqCst);
        assert!(fired >= 2);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(count.load(Ordering::SeqCst), fired);
    }

    #[test]
    fn test_set_function_and_interval() {
        let (timer, first) = counting_timer(10);
        let second = Arc::new(AtomicUsize::new(0));
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(25));

        let counter = second.clone();
        timer.set_function(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.set_interval(Duration::from_millis(5));
        let first_total = first.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        timer.stop();

        assert_eq!(timer.interval(), Duration::from_millis(5));
        assert!(second.load(Ordering::SeqCst) >= 1);
        // At most one tick of the old callback may have been in flight.
        assert!(first.load(Ordering::SeqCst) <= first_total + 1);
    }

    #[test]
    fn test_stop_from_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let timer = Arc::new(PeriodicTimer::new(Duration::from_millis(5), || {}));
        let weak = Arc::downgrade(&timer);
        let counter = count.clone();
        timer.set_function(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 2 {
                if let Some(timer) = weak.upgrade() {
                    timer.stop();
                }
            }
        });
        timer.start().unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(!timer.is_running());
    }
}
