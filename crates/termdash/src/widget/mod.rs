//! The widget tree.
//!
//! A [`Widget`] is a node owning its geometry, visibility, an optional
//! [`BoxLayout`] and an ordered list of children. Parents own their children;
//! the child-to-parent link is weak and only used to walk upwards.
//!
//! Widgets come in a closed set of kinds: containers, which arrange children
//! through a layout, and the leaf kinds [`Bar`], [`Label`] and [`Animation`].
//!
//! # Example
//!
//! ```
//! use termdash::layout::BoxLayout;
//! use termdash::widgets::AnimationStyle;
//! use termdash::Widget;
//!
//! let row = Widget::container();
//! let layout = BoxLayout::new();
//! layout.set_spacing(1);
//! layout.push_back(Widget::animation(AnimationStyle::DOTS));
//! layout.push_back(Widget::label("hashing"));
//! row.set_layout(layout).unwrap();
//! assert_eq!(row.children().len(), 2);
//! ```
//!
//! # Events
//!
//! Once attached to an [`Application`](crate::Application), widgets receive
//! events on the dispatch thread through [`Widget::on_event`]. Mutations made
//! from other threads are turned into events (hide, show, close, layout) so
//! the tree is only reshaped in step with rendering.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use parking_lot::{Mutex, MutexGuard, RwLock};
use termdash_core::Signal;

use crate::application::AppContext;
use crate::error::WidgetError;
use crate::event::{ChildChange, Event, EventData, EventType};
use crate::geometry::{Alignment, SizePolicy, SizePolicyFlags};
use crate::layout::{BoxLayout, LayoutItem};
use crate::widgets::{Animation, AnimationStyle, Bar, Ellipsize, Label};
use crate::writer::TerminalWriter;

/// How often a blocked [`Widget::close`] checks that the loop still runs.
const CLOSE_POLL: Duration = Duration::from_millis(100);

/// Process-wide unique widget identity, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(u64);

impl WidgetId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw id.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

enum WidgetKind {
    Container,
    Bar(Mutex<Bar>),
    Label(Mutex<Label>),
    Animation(Mutex<Animation>),
}

impl WidgetKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Bar(_) => "bar",
            Self::Label(_) => "label",
            Self::Animation(_) => "animation",
        }
    }
}

/// A node of the widget tree.
///
/// Widgets are always handled through `Arc<Widget>`. All methods take
/// `&self` and may be called from any thread.
pub struct Widget {
    id: WidgetId,
    this: Weak<Widget>,
    name: RwLock<String>,
    position: AtomicUsize,
    allocated: AtomicUsize,
    visible: AtomicBool,
    closed: AtomicBool,
    policy: RwLock<SizePolicy>,
    alignment: RwLock<Alignment>,
    parent: RwLock<Weak<Widget>>,
    children: Mutex<Vec<Arc<Widget>>>,
    layout: RwLock<Option<Arc<BoxLayout>>>,
    context: RwLock<Option<AppContext>>,
    kind: WidgetKind,
    on_closed: Signal<WidgetId>,
}

impl Widget {
    fn with_kind(kind: WidgetKind, policy: SizePolicy) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: WidgetId::next(),
            this: this.clone(),
            name: RwLock::new(kind.name().to_owned()),
            position: AtomicUsize::new(0),
            allocated: AtomicUsize::new(0),
            visible: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            policy: RwLock::new(policy),
            alignment: RwLock::new(Alignment::default()),
            parent: RwLock::new(Weak::new()),
            children: Mutex::new(Vec::new()),
            layout: RwLock::new(None),
            context: RwLock::new(None),
            kind,
            on_closed: Signal::new(),
        })
    }

    /// A widget arranging its children with a [`BoxLayout`].
    pub fn container() -> Arc<Self> {
        Self::with_kind(WidgetKind::Container, SizePolicy::fixed())
    }

    /// A text label. Grows and shrinks with the space available.
    pub fn label(text: impl Into<String>) -> Arc<Self> {
        Self::with_kind(
            WidgetKind::Label(Mutex::new(Label::new(text))),
            SizePolicy::new(SizePolicyFlags::GROW | SizePolicyFlags::SHRINK),
        )
    }

    /// A progress bar. Takes any surplus space and can shrink.
    pub fn bar() -> Arc<Self> {
        Self::with_kind(
            WidgetKind::Bar(Mutex::new(Bar::new())),
            SizePolicy::new(SizePolicyFlags::EXPAND | SizePolicyFlags::SHRINK),
        )
    }

    /// A spinner with a fixed width.
    pub fn animation(style: AnimationStyle) -> Arc<Self> {
        Self::with_kind(
            WidgetKind::Animation(Mutex::new(Animation::new(style))),
            SizePolicy::fixed(),
        )
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Unique id of this widget.
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// Human-readable name, defaulting to the kind.
    pub fn name(&self) -> String {
        self.name.read().clone()
    }

    /// Set the human-readable name.
    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.write() = name.into();
    }

    /// `"container"`, `"bar"`, `"label"` or `"animation"`.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    fn arc(&self) -> Option<Arc<Widget>> {
        self.this.upgrade()
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Smallest width this widget can be drawn in.
    pub fn minimum_size(&self) -> usize {
        match &self.kind {
            WidgetKind::Container => self.layout().map_or(0, |l| l.minimum_size()),
            WidgetKind::Bar(bar) => bar.lock().minimum_size(),
            WidgetKind::Label(label) => label.lock().minimum_size(),
            WidgetKind::Animation(animation) => animation.lock().natural_size(),
        }
    }

    /// Width this widget would like to have.
    pub fn natural_size(&self) -> usize {
        match &self.kind {
            WidgetKind::Container => self.layout().map_or(0, |l| l.natural_size()),
            WidgetKind::Bar(bar) => bar.lock().natural_size(),
            WidgetKind::Label(label) => label.lock().natural_size(),
            WidgetKind::Animation(animation) => animation.lock().natural_size(),
        }
    }

    /// Largest width this widget accepts.
    pub fn maximum_size(&self) -> usize {
        match &self.kind {
            WidgetKind::Container => self.layout().map_or(0, |l| l.maximum_size()),
            WidgetKind::Bar(_) | WidgetKind::Label(_) => usize::MAX,
            WidgetKind::Animation(animation) => animation.lock().natural_size(),
        }
    }

    /// Width assigned by the last layout pass.
    pub fn allocated_size(&self) -> usize {
        self.allocated.load(Ordering::Acquire)
    }

    pub(crate) fn allocate_size(&self, size: usize) {
        self.allocated.store(size, Ordering::Release);
    }

    /// Column assigned by the last layout pass.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    pub(crate) fn set_position(&self, position: usize) {
        self.position.store(position, Ordering::Release);
    }

    /// How this widget reacts to surplus or deficit width.
    pub fn size_policy(&self) -> SizePolicy {
        *self.policy.read()
    }

    /// Set how this widget reacts to surplus or deficit width.
    pub fn set_size_policy(&self, policy: SizePolicy) {
        *self.policy.write() = policy;
        self.queue_layout();
    }

    /// Placement of the content within the allocation.
    pub fn alignment(&self) -> Alignment {
        *self.alignment.read()
    }

    /// Set the placement of the content within the allocation.
    pub fn set_alignment(&self, alignment: Alignment) {
        *self.alignment.write() = alignment;
        if let WidgetKind::Label(label) = &self.kind {
            label.lock().set_alignment(alignment);
        }
        if self.layout().is_some() {
            self.queue_layout();
        }
    }

    /// Share out the allocation among the children, then lay out their
    /// subtrees.
    pub(crate) fn update_layout(&self) {
        let Some(layout) = self.layout() else {
            return;
        };
        let position = self.position();
        let allocated = self.allocated_size();
        layout.set_position(position);
        layout.allocate_size(allocated);
        layout.update();

        let (left, _) = self
            .alignment()
            .split(allocated.saturating_sub(layout.used_size()));
        if left > 0 {
            layout.set_position(position + left);
            layout.update();
        }
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Returns `true` unless the widget was hidden.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Show or hide the widget. Hidden widgets take no space.
    ///
    /// On an attached widget the change is applied by the dispatch thread.
    pub fn set_visible(&self, visible: bool) {
        let event = if visible { Event::show() } else { Event::hide() };
        if !self.queue_event(event) {
            self.apply_visibility(visible);
        }
    }

    /// Show the widget.
    pub fn show(&self) {
        self.set_visible(true);
    }

    /// Hide the widget.
    pub fn hide(&self) {
        self.set_visible(false);
    }

    fn apply_visibility(&self, visible: bool) {
        if self.visible.swap(visible, Ordering::AcqRel) == visible {
            return;
        }
        if let WidgetKind::Animation(animation) = &self.kind {
            let animation = animation.lock();
            if visible {
                animation.resume_timer();
            } else {
                animation.pause_timer();
            }
        }
        self.queue_layout();
    }

    // ========================================================================
    // Tree structure
    // ========================================================================

    /// The parent widget, if attached to one.
    pub fn parent(&self) -> Option<Arc<Widget>> {
        self.parent.read().upgrade()
    }

    /// The topmost ancestor, or this widget if it has no parent.
    pub fn root(&self) -> Option<Arc<Widget>> {
        let mut current = self.arc()?;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        Some(current)
    }

    /// A copy of the children, in order.
    pub fn children(&self) -> Vec<Arc<Widget>> {
        self.children.lock().clone()
    }

    /// The layout arranging the children.
    pub fn layout(&self) -> Option<Arc<BoxLayout>> {
        self.layout.read().clone()
    }

    /// Install `layout`. Widgets already in it become children; children of
    /// a previous layout that are not in the new one are detached.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a container.
    pub fn set_layout(&self, layout: Arc<BoxLayout>) -> Result<(), WidgetError> {
        self.expect_container()?;
        self.install_layout(layout);
        Ok(())
    }

    pub(crate) fn install_layout(&self, layout: Arc<BoxLayout>) {
        layout.set_parent(&self.this);
        let previous = self.layout.write().replace(layout.clone());
        if let Some(previous) = previous.filter(|p| !Arc::ptr_eq(p, &layout)) {
            previous.set_parent(&Weak::new());
            for widget in previous.widgets() {
                if !layout.contains(&widget) {
                    self.detach_child(&widget);
                }
            }
        }
        for widget in layout.widgets() {
            self.attach_child(widget);
        }
        self.queue_layout();
    }

    /// Append `child` to this container's layout, installing an empty layout
    /// first if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a container.
    pub fn add_child(&self, child: Arc<Widget>) -> Result<(), WidgetError> {
        self.expect_container()?;
        let layout = match self.layout() {
            Some(layout) => layout,
            None => {
                let layout = BoxLayout::new();
                self.set_layout(layout.clone())?;
                layout
            }
        };
        layout.push_back(child);
        Ok(())
    }

    /// Detach `child` from this widget and its layout.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::NotAChild`] if `child` is not a child of this
    /// widget.
    pub fn remove_child(&self, child: &Arc<Widget>) -> Result<(), WidgetError> {
        if !self.children.lock().iter().any(|c| c.id == child.id) {
            return Err(WidgetError::NotAChild);
        }
        if let Some(layout) = self.layout() {
            layout.take_widget(child.id);
        }
        self.detach_child(child);
        self.queue_layout();
        Ok(())
    }

    /// Make `child` a child of this widget, taking it from its previous
    /// parent. The child joins the application this widget belongs to.
    pub(crate) fn attach_child(&self, child: Arc<Widget>) {
        if let Some(previous) = child.parent() {
            if previous.id == self.id {
                return;
            }
            if let Some(layout) = previous.layout() {
                layout.take_widget(child.id);
            }
            previous.detach_child(&child);
            previous.queue_layout();
        }

        self.children.lock().push(child.clone());
        *child.parent.write() = self.this.clone();
        tracing::trace!(
            target: "termdash::widget",
            parent = %self.id,
            child = %child.id,
            "child attached"
        );

        if let Some(context) = self.context() {
            context.register(&child);
            self.queue_event(Event::child(ChildChange::Added, child.clone()));
            child.set_context(Some(context));
        }
    }

    /// Remove `child` from the child list. Its subtree leaves the application
    /// at once. Returns `false` if it was not a child.
    pub(crate) fn detach_child(&self, child: &Arc<Widget>) -> bool {
        let removed = {
            let mut children = self.children.lock();
            match children.iter().position(|c| c.id == child.id) {
                Some(index) => {
                    children.remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return false;
        }

        *child.parent.write() = Weak::new();
        if let Some(context) = self.context() {
            context.unregister(child);
            self.queue_event(Event::child(ChildChange::Removed, child.clone()));
        }
        child.set_context(None);
        tracing::trace!(
            target: "termdash::widget",
            parent = %self.id,
            child = %child.id,
            "child detached"
        );
        true
    }

    fn expect_container(&self) -> Result<(), WidgetError> {
        match self.kind {
            WidgetKind::Container => Ok(()),
            _ => Err(self.wrong_kind("container")),
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> WidgetError {
        WidgetError::WrongKind {
            expected,
            found: self.kind.name(),
        }
    }

    // ========================================================================
    // Application context
    // ========================================================================

    pub(crate) fn context(&self) -> Option<AppContext> {
        self.context.read().clone()
    }

    /// Returns `true` while the widget belongs to a running application.
    pub fn is_attached(&self) -> bool {
        self.context.read().as_ref().is_some_and(AppContext::is_alive)
    }

    /// Join or leave an application, together with the whole subtree.
    /// Animations tick only while they belong to an application.
    pub(crate) fn set_context(&self, context: Option<AppContext>) {
        *self.context.write() = context.clone();

        if let WidgetKind::Animation(animation) = &self.kind {
            let mut animation = animation.lock();
            if context.is_none() {
                let timer = animation.take_timer();
                drop(animation);
                if let Some(timer) = timer {
                    timer.stop();
                }
            } else {
                let this = self.this.clone();
                let started = animation.start_timer(!self.is_visible(), move |id| {
                    if let Some(widget) = this.upgrade() {
                        widget.queue_event(Event::timer(id));
                    }
                });
                if let Err(err) = started {
                    tracing::warn!(
                        target: "termdash::widget",
                        widget = %self.id,
                        error = %err,
                        "animation timer failed to start"
                    );
                }
            }
        }

        for child in self.children() {
            child.set_context(context.clone());
        }
    }

    /// Queue `event` for this widget. Returns `false` if the widget does not
    /// belong to a running application.
    pub fn queue_event(&self, event: Event) -> bool {
        match (self.context(), self.arc()) {
            (Some(context), Some(this)) => context.queue_event(event, Some(&this)),
            _ => false,
        }
    }

    /// Ask for a relayout of the tree this widget belongs to.
    pub fn queue_layout(&self) -> bool {
        let Some(context) = self.context() else {
            return false;
        };
        match self.root() {
            Some(root) => context.queue_event(Event::layout(), Some(&root)),
            None => false,
        }
    }

    /// Ask for a frame to be drawn.
    pub fn queue_render(&self) -> bool {
        self.context()
            .is_some_and(|context| context.queue_event(Event::render(), None))
    }

    // ========================================================================
    // Closing
    // ========================================================================

    /// Returns `true` once the widget has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Emitted with the widget's id when it is closed.
    pub fn on_closed(&self) -> &Signal<WidgetId> {
        &self.on_closed
    }

    /// Detach this widget from its parent and layout, or retire it if it is
    /// a root of the application.
    ///
    /// Synchronous: when `close` returns the widget is out of the tree and no
    /// further event reaches it. Off the dispatch thread this waits for the
    /// dispatch thread to process the close, however long the queue is. When
    /// no dispatch loop is running the widget is closed on the calling thread.
    #[tracing::instrument(skip(self), fields(widget = %self.id), target = "termdash::widget", level = "debug")]
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }
        let (Some(context), Some(this)) = (
            self.context().filter(|c| !c.is_dispatch_thread()),
            self.arc(),
        ) else {
            self.close_now();
            return;
        };

        let (completion, done) = crossbeam_channel::bounded(1);
        if !context.queue_close(Event::close(self.id, Some(completion)), &this) {
            self.close_now();
            return;
        }
        loop {
            match done.recv_timeout(CLOSE_POLL) {
                Ok(()) => return,
                // Dropped unprocessed: the widget already left the application.
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) if context.is_running() => {}
                // The loop finished without reaching the event.
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        tracing::debug!(target: "termdash::widget", "close event not processed by the loop");
        self.close_now();
    }

    fn close_now(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.arc();
        if let Some(parent) = self.parent() {
            if let Some(layout) = parent.layout() {
                layout.take_widget(self.id);
            }
            if let Some(this) = &this {
                parent.detach_child(this);
            }
            parent.queue_layout();
        } else if let Some(context) = self.context() {
            if let Some(this) = &this {
                context.retire_root(this);
            }
            self.set_context(None);
        }
        tracing::debug!(target: "termdash::widget", widget = %self.id, "widget closed");
        self.on_closed.emit(self.id);
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Deliver `event` to this widget.
    ///
    /// The handler for the event's kind runs first. If it leaves the event
    /// unaccepted, every child receives it in turn.
    pub fn on_event(&self, event: &mut Event) {
        match event.kind() {
            EventType::Render => self.on_render_event(event),
            EventType::Layout => self.on_layout_event(event),
            EventType::Resize => self.on_resize_event(event),
            EventType::Close => self.on_close_event(event),
            EventType::Hide => self.on_hide_event(event),
            EventType::Show => self.on_show_event(event),
            EventType::Timer => self.on_timer_event(event),
            EventType::Child => self.on_child_event(event),
            EventType::Termination => self.on_termination_event(event),
        }
        if event.is_accepted() {
            return;
        }
        for child in self.children() {
            event.ignore();
            child.on_event(event);
        }
    }

    /// Frames are composed by the application; the event stops here.
    pub fn on_render_event(&self, event: &mut Event) {
        event.accept();
    }

    /// Lay out the subtree from the current allocation.
    pub fn on_layout_event(&self, event: &mut Event) {
        self.update_layout();
        event.accept();
    }

    /// A root takes the terminal width and lays out its subtree.
    pub fn on_resize_event(&self, event: &mut Event) {
        if let EventData::Resize { size } = event.data() {
            if self.parent().is_none() {
                self.allocate_size(usize::from(size.cols));
                self.update_layout();
            }
            event.accept();
        }
    }

    /// Close this widget if it is the target.
    pub fn on_close_event(&self, event: &mut Event) {
        let EventData::Close { target, completion } = event.data_mut() else {
            return;
        };
        if *target != self.id {
            return;
        }
        let completion = completion.take();
        self.close_now();
        event.accept();
        if let Some(completion) = completion {
            let _ = completion.send(());
        }
    }

    /// Hide this widget.
    pub fn on_hide_event(&self, event: &mut Event) {
        self.apply_visibility(false);
        event.accept();
    }

    /// Show this widget.
    pub fn on_show_event(&self, event: &mut Event) {
        self.apply_visibility(true);
        event.accept();
    }

    /// Advance an animation whose timer fired.
    pub fn on_timer_event(&self, event: &mut Event) {
        let EventData::Timer { id } = event.data() else {
            return;
        };
        if let WidgetKind::Animation(animation) = &self.kind {
            let mut animation = animation.lock();
            if animation.timer_id() == Some(*id) {
                animation.advance();
                event.accept();
            }
        }
    }

    /// Keep the application's registry in step with the tree.
    pub fn on_child_event(&self, event: &mut Event) {
        let EventData::Child { change, child } = event.data() else {
            return;
        };
        if let Some(context) = self.context() {
            match change {
                ChildChange::Added => {
                    let still_ours = child.parent().is_some_and(|p| p.id == self.id);
                    if still_ours {
                        context.register(child);
                    }
                }
                ChildChange::Removed => context.unregister(child),
            }
        }
        event.accept();
    }

    /// Stop animating. Left unaccepted so the whole tree sees it.
    pub fn on_termination_event(&self, _event: &mut Event) {
        if let WidgetKind::Animation(animation) = &self.kind {
            let timer = animation.lock().take_timer();
            if let Some(timer) = timer {
                timer.stop();
            }
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Draw this widget in exactly its allocated width. A root widget then
    /// erases the rest of the line.
    pub fn render(&self, writer: &mut TerminalWriter) -> io::Result<()> {
        if self.is_visible() {
            let width = self.allocated_size();
            match &self.kind {
                WidgetKind::Container => self.render_container(writer, width)?,
                WidgetKind::Bar(bar) => bar.lock().render(writer, width)?,
                WidgetKind::Label(label) => label.lock().render(writer, width)?,
                WidgetKind::Animation(animation) => animation.lock().render(writer, width)?,
            }
        }
        if self.parent().is_none() {
            writer.erase_to_end_of_line()?;
        }
        Ok(())
    }

    fn render_container(&self, writer: &mut TerminalWriter, width: usize) -> io::Result<()> {
        let Some(layout) = self.layout() else {
            return Ok(());
        };
        if self.children.lock().is_empty() {
            return Ok(());
        }
        let (left, right) = self
            .alignment()
            .split(width.saturating_sub(layout.used_size()));
        writer.write_spaces(left)?;
        render_items(&layout, writer)?;
        writer.write_spaces(right)
    }

    // ========================================================================
    // Kind-specific access
    // ========================================================================

    /// The bar state, if this is a bar. Changes made through the guard that
    /// affect sizing need a [`queue_layout`](Self::queue_layout).
    pub fn as_bar(&self) -> Option<MutexGuard<'_, Bar>> {
        match &self.kind {
            WidgetKind::Bar(bar) => Some(bar.lock()),
            _ => None,
        }
    }

    /// The label state, if this is a label.
    pub fn as_label(&self) -> Option<MutexGuard<'_, Label>> {
        match &self.kind {
            WidgetKind::Label(label) => Some(label.lock()),
            _ => None,
        }
    }

    /// The animation state, if this is an animation.
    pub fn as_animation(&self) -> Option<MutexGuard<'_, Animation>> {
        match &self.kind {
            WidgetKind::Animation(animation) => Some(animation.lock()),
            _ => None,
        }
    }

    fn bar_mut(&self) -> Result<MutexGuard<'_, Bar>, WidgetError> {
        self.as_bar().ok_or_else(|| self.wrong_kind("bar"))
    }

    fn label_mut(&self) -> Result<MutexGuard<'_, Label>, WidgetError> {
        self.as_label().ok_or_else(|| self.wrong_kind("label"))
    }

    fn animation_mut(&self) -> Result<MutexGuard<'_, Animation>, WidgetError> {
        self.as_animation().ok_or_else(|| self.wrong_kind("animation"))
    }

    /// Set a bar's fill level in percent.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a bar.
    pub fn set_percentage(&self, percentage: f64) -> Result<(), WidgetError> {
        self.bar_mut()?.set_percentage(percentage);
        Ok(())
    }

    /// Set a bar's natural width.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a bar.
    pub fn set_bar_size(&self, size: usize) -> Result<(), WidgetError> {
        self.bar_mut()?.set_size(size);
        self.queue_layout();
        Ok(())
    }

    /// Set a bar's fractional frames.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a bar.
    pub fn set_bar_frames<S: AsRef<str>>(&self, frames: &[S]) -> Result<(), WidgetError> {
        self.bar_mut()?.set_frames(frames);
        self.queue_layout();
        Ok(())
    }

    /// Replace a label's text. A relayout is queued only if the natural
    /// width changed.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a label.
    pub fn set_text(&self, text: impl Into<String>) -> Result<(), WidgetError> {
        let resized = {
            let mut label = self.label_mut()?;
            let before = label.natural_size();
            label.set_text(text);
            label.natural_size() != before
        };
        if resized {
            self.queue_layout();
        }
        Ok(())
    }

    /// Set a label's padding.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a label.
    pub fn set_padding(&self, padding: usize) -> Result<(), WidgetError> {
        self.label_mut()?.set_padding(padding);
        self.queue_layout();
        Ok(())
    }

    /// Set where a label shortens over-long text.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is a label.
    pub fn set_ellipsize(&self, mode: Ellipsize) -> Result<(), WidgetError> {
        self.label_mut()?.set_ellipsize(mode);
        Ok(())
    }

    /// Replace an animation's frames and interval.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is an animation.
    pub fn set_frames<S: AsRef<str>>(
        &self,
        frames: &[S],
        interval: Duration,
    ) -> Result<(), WidgetError> {
        self.animation_mut()?.set_frames(frames, interval);
        self.queue_layout();
        Ok(())
    }

    /// Switch an animation to a preset.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError::WrongKind`] unless this is an animation.
    pub fn set_animation_style(&self, style: AnimationStyle) -> Result<(), WidgetError> {
        self.set_frames(style.frames, style.interval)
    }
}

fn render_items(layout: &BoxLayout, writer: &mut TerminalWriter) -> io::Result<()> {
    let spacing = layout.spacing();
    let mut first = true;
    for item in layout.items() {
        if !item.is_visible() {
            continue;
        }
        if !first {
            writer.write_spaces(spacing)?;
        }
        first = false;
        match item {
            LayoutItem::Widget(widget) => widget.render(writer)?,
            LayoutItem::Layout(nested) => {
                render_items(&nested, writer)?;
                let slack = nested.allocated_size().saturating_sub(nested.used_size());
                writer.write_spaces(slack)?;
            }
        }
    }
    Ok(())
}

impl std::fmt::Debug for Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id)
            .field("name", &*self.name.read())
            .field("kind", &self.kind.name())
            .field("visible", &self.is_visible())
            .field("allocated", &self.allocated_size())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Widget: Send, Sync);

#[cfg(test)]
mod tests;
