//! The application: dispatch thread, event queue and frame composition.
//!
//! An [`Application`] owns one dispatch thread consuming a bounded
//! [`EventQueue`]. Widgets, timers and the signal notifier are producers.
//! Each popped event is delivered to its destination widget or, without one,
//! broadcast to every root widget. Render events compose a frame: every root
//! draws one terminal line and the writer flushes once.
//!
//! Two clocks feed the loop: a frame clock queueing render events and a
//! terminal-size poll clock. On Unix, `SIGWINCH` triggers an immediate size
//! check as well.
//!
//! Only one application may run per process at a time.
//!
//! # Example
//!
//! ```no_run
//! use termdash::{Application, ApplicationConfig, Widget};
//!
//! fn main() -> Result<(), termdash::AppError> {
//!     let app = Application::new(ApplicationConfig::default());
//!     app.start()?;
//!
//!     let status = Widget::label("working");
//!     app.add_widget(status.clone());
//!     // ... do the work, updating widgets from any thread ...
//!     status.close();
//!
//!     app.stop();
//!     Ok(())
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use termdash_core::{EventQueue, PeriodicTimer, QueueError};

use crate::config::ApplicationConfig;
use crate::error::{AppError, AppResult};
use crate::event::{Event, EventItem, EventType};
use crate::terminal::{query_size, TerminalSize};
use crate::widget::{Widget, WidgetId};
use crate::writer::TerminalWriter;

/// Set while an application owns the dispatch loop of this process.
static RUNNING: AtomicBool = AtomicBool::new(false);

/// Rows assumed when the terminal reports no size.
const FALLBACK_ROWS: u16 = 24;

/// How long a control event waits for queue space before re-checking that
/// the dispatch thread is still alive.
const CONTROL_RETRY: Duration = Duration::from_millis(100);

struct AppState {
    config: ApplicationConfig,
    queue: EventQueue<EventItem>,
    /// Events queued by the dispatch thread itself while the queue was full.
    backlog: Mutex<VecDeque<EventItem>>,
    roots: Mutex<Vec<Arc<Widget>>>,
    /// Roots closed since the last frame, drawn one final time.
    retired: Mutex<Vec<Arc<Widget>>>,
    registry: Mutex<HashMap<WidgetId, Weak<Widget>>>,
    size: AtomicU32,
    writer: Mutex<TerminalWriter>,
    dispatch_thread: RwLock<Option<ThreadId>>,
    running: AtomicBool,
    stopping: AtomicBool,
    clocks: Mutex<Vec<PeriodicTimer>>,
    #[cfg(unix)]
    notifier: Mutex<Option<termdash_core::SignalNotifier>>,
}

impl AppState {
    fn is_dispatch_thread(&self) -> bool {
        *self.dispatch_thread.read() == Some(thread::current().id())
    }

    fn is_alive(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.stopping.load(Ordering::Acquire)
    }

    fn terminal_size(&self) -> TerminalSize {
        TerminalSize::unpack(self.size.load(Ordering::Acquire))
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn queue_event(&self, event: Event, destination: Option<&Arc<Widget>>) -> bool {
        let item = EventItem::new(event, destination);
        if self.is_dispatch_thread() {
            if let Err((item, _)) = self.queue.try_push(item) {
                self.backlog.lock().push_back(item);
            }
            return true;
        }
        if !self.is_alive() {
            return false;
        }
        match self.queue.push_timeout(item, self.config.push_timeout()) {
            Ok(()) => true,
            Err((item, err)) => {
                tracing::debug!(
                    target: "termdash::application",
                    kind = ?item.event().kind(),
                    error = %err,
                    "event dropped"
                );
                false
            }
        }
    }

    /// Queue an event that must reach the loop while it runs, even when the
    /// queue is full or the application is stopping. Returns `false` only if
    /// the loop is not running.
    fn queue_control(&self, event: Event, destination: Option<&Arc<Widget>>) -> bool {
        let mut item = EventItem::new(event, destination);
        if self.is_dispatch_thread() {
            self.backlog.lock().push_back(item);
            return true;
        }
        while self.is_running() {
            match self.queue.push_timeout(item, CONTROL_RETRY) {
                Ok(()) => return true,
                Err((returned, QueueError::Timeout)) => item = returned,
                Err(_) => return false,
            }
        }
        false
    }

    fn measure_size(&self) -> TerminalSize {
        if let Some(cols) = self.config.fixed_width {
            return TerminalSize::new(cols, FALLBACK_ROWS);
        }
        query_size().unwrap_or(TerminalSize::new(self.config.fallback_width, FALLBACK_ROWS))
    }

    /// Re-measure the terminal and broadcast a resize if it changed.
    fn refresh_size(&self) {
        let size = self.measure_size();
        let previous = self.size.swap(size.pack(), Ordering::AcqRel);
        if previous != size.pack() {
            tracing::debug!(
                target: "termdash::application",
                cols = size.cols,
                rows = size.rows,
                "terminal resized"
            );
            self.queue_event(Event::resize(size), None);
        }
    }

    // ========================================================================
    // Registry
    // ========================================================================

    fn register(&self, widget: &Arc<Widget>) {
        let mut registry = self.registry.lock();
        for_each_in_tree(widget, &mut |w| {
            registry.insert(w.id(), Arc::downgrade(w));
        });
    }

    fn unregister(&self, widget: &Arc<Widget>) {
        let mut registry = self.registry.lock();
        for_each_in_tree(widget, &mut |w| {
            registry.remove(&w.id());
        });
    }

    fn is_registered(&self, widget: &Widget) -> bool {
        self.registry.lock().contains_key(&widget.id())
    }

    fn retire_root(&self, widget: &Arc<Widget>) {
        let removed = {
            let mut roots = self.roots.lock();
            let before = roots.len();
            roots.retain(|root| root.id() != widget.id());
            roots.len() != before
        };
        if removed {
            self.unregister(widget);
            self.retired.lock().push(widget.clone());
        }
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    fn next_item(&self) -> Option<EventItem> {
        let pending = self.backlog.lock().pop_front();
        pending.or_else(|| self.queue.pop())
    }

    fn try_next_item(&self) -> Option<EventItem> {
        let pending = self.backlog.lock().pop_front();
        pending.or_else(|| self.queue.try_pop().ok())
    }

    fn dispatch(&self, item: EventItem) {
        let (mut event, destination) = item.into_parts();
        if event.kind() == EventType::Render {
            self.render_frame();
            return;
        }

        match destination {
            Some(widget) if self.is_registered(&widget) => widget.on_event(&mut event),
            Some(widget) => {
                tracing::trace!(
                    target: "termdash::dispatch",
                    widget = %widget.id(),
                    kind = ?event.kind(),
                    "event for detached widget dropped"
                );
            }
            None => {
                let roots = self.roots.lock().clone();
                for root in roots {
                    event.ignore();
                    root.on_event(&mut event);
                }
            }
        }
    }

    fn render_frame(&self) {
        let retired = std::mem::take(&mut *self.retired.lock());
        let roots = self.roots.lock().clone();
        let mut writer = self.writer.lock();
        if retired.is_empty() && roots.is_empty() && writer.drawn_lines() == 0 {
            return;
        }
        let _span = tracing::trace_span!(target: "termdash::writer", "render").entered();
        if let Err(err) = draw_frame(&mut writer, &retired, &roots) {
            tracing::warn!(target: "termdash::writer", error = %err, "frame not drawn");
        }
    }

    fn run(&self) {
        *self.dispatch_thread.write() = Some(thread::current().id());
        let _span = tracing::debug_span!(target: "termdash::dispatch", "dispatch").entered();
        tracing::debug!(target: "termdash::dispatch", "dispatch loop started");

        while let Some(item) = self.next_item() {
            let terminating = item.event().kind() == EventType::Termination
                && self.stopping.load(Ordering::Acquire);
            self.dispatch(item);
            if terminating {
                break;
            }
        }
        self.shutdown();
    }

    fn shutdown(&self) {
        let clocks = std::mem::take(&mut *self.clocks.lock());
        for clock in &clocks {
            clock.stop();
        }
        #[cfg(unix)]
        {
            let notifier = self.notifier.lock().take();
            drop(notifier);
        }

        let mut drained = 0usize;
        while let Some(item) = self.try_next_item() {
            self.dispatch(item);
            drained += 1;
        }

        self.render_frame();
        if let Err(err) = self.writer.lock().finish() {
            tracing::warn!(target: "termdash::writer", error = %err, "terminal not restored");
        }
        self.running.store(false, Ordering::Release);
        tracing::debug!(target: "termdash::dispatch", drained, "dispatch loop finished");
    }
}

fn for_each_in_tree(widget: &Arc<Widget>, visit: &mut impl FnMut(&Arc<Widget>)) {
    visit(widget);
    for child in widget.children() {
        for_each_in_tree(&child, visit);
    }
}

fn draw_frame(
    writer: &mut TerminalWriter,
    retired: &[Arc<Widget>],
    roots: &[Arc<Widget>],
) -> io::Result<()> {
    writer.begin_frame()?;
    for root in retired {
        writer.begin_line()?;
        root.render(writer)?;
    }
    writer.commit_lines();
    for root in roots {
        writer.begin_line()?;
        root.render(writer)?;
    }
    writer.end_frame()
}

/// A weak handle to the application, given to every attached widget.
///
/// Holding a context never keeps the application alive; once it is gone
/// every operation becomes a no-op.
#[derive(Clone)]
pub struct AppContext {
    state: Weak<AppState>,
}

impl AppContext {
    /// Queue `event`, delivered to `destination` or broadcast to the roots.
    ///
    /// Returns `false` if the application is gone or stopping, or if the
    /// queue stayed full for the configured push timeout. Calls from the
    /// dispatch thread never block.
    pub fn queue_event(&self, event: Event, destination: Option<&Arc<Widget>>) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.queue_event(event, destination))
    }

    /// Returns `true` while the application's dispatch loop runs and no stop
    /// was requested.
    pub fn is_alive(&self) -> bool {
        self.state.upgrade().is_some_and(|state| state.is_alive())
    }

    /// Returns `true` while the dispatch loop runs, including while it drains
    /// after a stop request.
    pub(crate) fn is_running(&self) -> bool {
        self.state.upgrade().is_some_and(|state| state.is_running())
    }

    /// Queue a close event for `widget`. It is refused only when the loop is
    /// not running.
    pub(crate) fn queue_close(&self, event: Event, widget: &Arc<Widget>) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.queue_control(event, Some(widget)))
    }

    /// Returns `true` when called on the application's dispatch thread.
    pub fn is_dispatch_thread(&self) -> bool {
        self.state
            .upgrade()
            .is_some_and(|state| state.is_dispatch_thread())
    }

    /// The last measured terminal size.
    pub fn terminal_size(&self) -> Option<TerminalSize> {
        self.state.upgrade().map(|state| state.terminal_size())
    }

    pub(crate) fn register(&self, widget: &Arc<Widget>) {
        if let Some(state) = self.state.upgrade() {
            state.register(widget);
        }
    }

    pub(crate) fn unregister(&self, widget: &Arc<Widget>) {
        if let Some(state) = self.state.upgrade() {
            state.unregister(widget);
        }
    }

    pub(crate) fn retire_root(&self, widget: &Arc<Widget>) {
        if let Some(state) = self.state.upgrade() {
            state.retire_root(widget);
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// The dashboard application.
///
/// # Lifecycle
///
/// 1. [`start`](Self::start) spawns the dispatch thread and the clocks.
/// 2. [`add_widget`](Self::add_widget) attaches root widgets; each draws one
///    line of the dashboard.
/// 3. [`request_stop`](Self::request_stop) asks the loop to finish; it drains
///    the queue, draws a final frame and restores the terminal.
///    [`wait`](Self::wait) joins it; [`stop`](Self::stop) does both.
///
/// Dropping a running application stops it.
pub struct Application {
    state: Arc<AppState>,
    handle: Mutex<Option<JoinHandle<()>>>,
    owns_process_slot: AtomicBool,
}

impl Application {
    /// Create an application drawing on stdout.
    pub fn new(config: ApplicationConfig) -> Self {
        Self::with_writer(config, TerminalWriter::stdout())
    }

    /// Create an application drawing through `writer`.
    pub fn with_writer(config: ApplicationConfig, writer: TerminalWriter) -> Self {
        let queue = EventQueue::new(config.queue_capacity);
        let state = Arc::new(AppState {
            config,
            queue,
            backlog: Mutex::new(VecDeque::new()),
            roots: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
            registry: Mutex::new(HashMap::new()),
            size: AtomicU32::new(0),
            writer: Mutex::new(writer),
            dispatch_thread: RwLock::new(None),
            running: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            clocks: Mutex::new(Vec::new()),
            #[cfg(unix)]
            notifier: Mutex::new(None),
        });
        let size = state.measure_size();
        state.size.store(size.pack(), Ordering::Release);
        Self {
            state,
            handle: Mutex::new(None),
            owns_process_slot: AtomicBool::new(false),
        }
    }

    /// The configuration this application was created with.
    pub fn config(&self) -> &ApplicationConfig {
        &self.state.config
    }

    /// A context handle for this application.
    pub fn context(&self) -> AppContext {
        AppContext {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Start the dispatch thread, the frame and size clocks and, if
    /// configured, `SIGWINCH` handling.
    ///
    /// Nothing is drawn before `start` returns successfully.
    ///
    /// # Errors
    ///
    /// - [`AppError::AlreadyRunning`] if an application already runs in this
    ///   process, or this one was started before
    /// - [`AppError::Io`] if the terminal cannot be set up or the dispatch
    ///   thread cannot be spawned
    /// - [`AppError::Core`] if a clock or the signal notifier fails to start
    #[tracing::instrument(skip(self), target = "termdash::application", level = "debug")]
    pub fn start(&self) -> AppResult<()> {
        if self.handle.lock().is_some() || self.state.stopping.load(Ordering::Acquire) {
            return Err(AppError::AlreadyRunning);
        }
        if RUNNING
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(AppError::AlreadyRunning);
        }
        self.owns_process_slot.store(true, Ordering::Release);

        if let Err(err) = self.spawn_dispatch() {
            self.release_process_slot();
            return Err(err);
        }
        if let Err(err) = self.start_sources() {
            self.stop();
            return Err(err);
        }
        for root in self.roots() {
            self.state.queue_event(Event::layout(), Some(&root));
        }
        tracing::info!(target: "termdash::application", "application started");
        Ok(())
    }

    fn spawn_dispatch(&self) -> AppResult<()> {
        if self.state.config.disable_line_wrap {
            self.state.writer.lock().disable_line_wrap()?;
        }
        self.state.refresh_size();
        self.state.running.store(true, Ordering::Release);

        let state = self.state.clone();
        let spawned = thread::Builder::new()
            .name("termdash-dispatch".into())
            .spawn(move || state.run());
        match spawned {
            Ok(handle) => {
                *self.state.dispatch_thread.write() = Some(handle.thread().id());
                *self.handle.lock() = Some(handle);
                Ok(())
            }
            Err(err) => {
                self.state.running.store(false, Ordering::Release);
                let _ = self.state.writer.lock().restore_line_wrap();
                Err(err.into())
            }
        }
    }

    fn start_sources(&self) -> AppResult<()> {
        let config = &self.state.config;

        let weak = Arc::downgrade(&self.state);
        let frame_clock = PeriodicTimer::new(config.frame_interval(), move || {
            if let Some(state) = weak.upgrade().filter(|s| s.is_alive()) {
                state.queue_event(Event::render(), None);
            }
        })
        .with_name("termdash-frame");

        let weak = Arc::downgrade(&self.state);
        let size_clock = PeriodicTimer::new(config.resize_poll_interval(), move || {
            if let Some(state) = weak.upgrade().filter(|s| s.is_alive()) {
                state.refresh_size();
            }
        })
        .with_name("termdash-resize");

        for clock in [frame_clock, size_clock] {
            clock.start()?;
            self.state.clocks.lock().push(clock);
        }

        #[cfg(unix)]
        {
            if config.handle_signals {
                self.start_signal_handling()?;
            }
        }
        Ok(())
    }

    #[cfg(unix)]
    fn start_signal_handling(&self) -> AppResult<()> {
        use termdash_core::{CoreError, SignalError, SignalKind, SignalNotifier};

        let notifier = match SignalNotifier::install() {
            Ok(notifier) => notifier,
            Err(CoreError::Signal(SignalError::AlreadyInstalled)) => {
                tracing::warn!(
                    target: "termdash::application",
                    "signal notifier in use elsewhere; relying on the size poll clock"
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let weak = Arc::downgrade(&self.state);
        notifier.connect(SignalKind::window_change(), move || {
            if let Some(state) = weak.upgrade().filter(|s| s.is_alive()) {
                state.refresh_size();
            }
        })?;
        notifier.start()?;
        *self.state.notifier.lock() = Some(notifier);
        Ok(())
    }

    /// Attach `widget` as a root. It takes the full terminal width and draws
    /// on its own line, below the roots added before it.
    ///
    /// A widget with a parent is taken from it first. Roots added before
    /// [`start`](Self::start) are laid out when the loop starts.
    pub fn add_widget(&self, widget: Arc<Widget>) {
        if let Some(parent) = widget.parent() {
            let _ = parent.remove_child(&widget);
        }
        let size = self.state.terminal_size();
        widget.set_position(0);
        widget.allocate_size(usize::from(size.cols));

        self.state.register(&widget);
        self.state.roots.lock().push(widget.clone());
        widget.set_context(Some(self.context()));
        tracing::debug!(
            target: "termdash::application",
            widget = %widget.id(),
            "root widget added"
        );

        self.state.queue_event(Event::layout(), Some(&widget));
        self.state.queue_event(Event::render(), None);
    }

    /// The root widgets, in drawing order.
    pub fn roots(&self) -> Vec<Arc<Widget>> {
        self.state.roots.lock().clone()
    }

    /// Queue `event` for `destination`, or for every root without one.
    ///
    /// See [`AppContext::queue_event`].
    pub fn queue_event(&self, event: Event, destination: Option<&Arc<Widget>>) -> bool {
        self.state.queue_event(event, destination)
    }

    /// Queue a frame.
    pub fn queue_render(&self) -> bool {
        self.state.queue_event(Event::render(), None)
    }

    /// The last measured terminal size.
    pub fn terminal_size(&self) -> TerminalSize {
        self.state.terminal_size()
    }

    /// Returns `true` while the dispatch loop runs.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// Ask the dispatch loop to finish. Events already queued are still
    /// processed; producers other than the dispatch thread are turned away.
    pub fn request_stop(&self) {
        if self.state.stopping.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(target: "termdash::application", "stop requested");
        self.state.queue_control(Event::termination(), None);
    }

    /// Wait for the dispatch loop to finish. Returns at once if it is not
    /// running or when called from the dispatch thread.
    pub fn wait(&self) {
        if self.state.is_dispatch_thread() {
            return;
        }
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!(target: "termdash::application", "dispatch thread panicked");
            }
            self.state.running.store(false, Ordering::Release);
        }
        self.release_process_slot();
    }

    /// Request a stop and wait for it.
    pub fn stop(&self) {
        self.request_stop();
        self.wait();
    }

    fn release_process_slot(&self) {
        if self.owns_process_slot.swap(false, Ordering::AcqRel) {
            RUNNING.store(false, Ordering::Release);
            tracing::debug!(target: "termdash::application", "application released");
        }
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new(ApplicationConfig::default())
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        if self.handle.lock().is_some() {
            self.stop();
        }
        self.release_process_slot();
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("running", &self.is_running())
            .field("roots", &self.state.roots.lock().len())
            .field("queued", &self.state.queue.len())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Application: Send, Sync);
static_assertions::assert_impl_all!(AppContext: Send, Sync);
