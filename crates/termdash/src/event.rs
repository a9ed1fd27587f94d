//! Events flowing through the application's dispatch loop.
//!
//! Every event carries an accept flag. A widget handler accepts an event to
//! stop it there; an event left unaccepted is forwarded to every child of the
//! widget, in order.

use std::sync::{Arc, Weak};

use crossbeam_channel::Sender;
use termdash_core::TimerId;

use crate::terminal::TerminalSize;
use crate::widget::{Widget, WidgetId};

/// The kind of an [`Event`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Draw a frame.
    Render,
    /// Recompute sizes and positions.
    Layout,
    /// The terminal changed size.
    Resize,
    /// Detach and destroy a widget.
    Close,
    /// Hide a widget.
    Hide,
    /// Show a hidden widget.
    Show,
    /// A widget-owned timer fired.
    Timer,
    /// A child was added or removed.
    Child,
    /// The application is shutting down.
    Termination,
}

/// Whether a [`EventData::Child`] event reports an addition or a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildChange {
    /// The child joined the receiving widget.
    Added,
    /// The child left the receiving widget.
    Removed,
}

/// Event payloads.
#[derive(Debug)]
pub enum EventData {
    /// Draw a frame.
    Render,
    /// Recompute sizes and positions.
    Layout,
    /// The terminal now has `size`.
    Resize {
        /// New terminal size.
        size: TerminalSize,
    },
    /// Close the widget identified by `target`.
    Close {
        /// Widget to close.
        target: WidgetId,
        /// Released once the widget is detached. Dropping it also releases
        /// the waiting caller.
        completion: Option<Sender<()>>,
    },
    /// Hide the receiving widget.
    Hide,
    /// Show the receiving widget.
    Show,
    /// The timer `id` fired.
    Timer {
        /// Timer that fired.
        id: TimerId,
    },
    /// `child` was added to or removed from the receiving widget.
    Child {
        /// Addition or removal.
        change: ChildChange,
        /// The child concerned.
        child: Arc<Widget>,
    },
    /// The application is shutting down.
    Termination,
}

/// A notification delivered to widgets by the dispatch loop.
#[derive(Debug)]
pub struct Event {
    data: EventData,
    accepted: bool,
}

impl Event {
    /// Create an unaccepted event.
    pub fn new(data: EventData) -> Self {
        Self {
            data,
            accepted: false,
        }
    }

    /// A render request.
    pub fn render() -> Self {
        Self::new(EventData::Render)
    }

    /// A layout request.
    pub fn layout() -> Self {
        Self::new(EventData::Layout)
    }

    /// A resize notification.
    pub fn resize(size: TerminalSize) -> Self {
        Self::new(EventData::Resize { size })
    }

    /// A close request for `target`.
    pub fn close(target: WidgetId, completion: Option<Sender<()>>) -> Self {
        Self::new(EventData::Close { target, completion })
    }

    /// A hide request.
    pub fn hide() -> Self {
        Self::new(EventData::Hide)
    }

    /// A show request.
    pub fn show() -> Self {
        Self::new(EventData::Show)
    }

    /// A timer tick.
    pub fn timer(id: TimerId) -> Self {
        Self::new(EventData::Timer { id })
    }

    /// A child notification.
    pub fn child(change: ChildChange, child: Arc<Widget>) -> Self {
        Self::new(EventData::Child { change, child })
    }

    /// The shutdown notification.
    pub fn termination() -> Self {
        Self::new(EventData::Termination)
    }

    /// The kind of this event.
    pub fn kind(&self) -> EventType {
        match &self.data {
            EventData::Render => EventType::Render,
            EventData::Layout => EventType::Layout,
            EventData::Resize { .. } => EventType::Resize,
            EventData::Close { .. } => EventType::Close,
            EventData::Hide => EventType::Hide,
            EventData::Show => EventType::Show,
            EventData::Timer { .. } => EventType::Timer,
            EventData::Child { .. } => EventType::Child,
            EventData::Termination => EventType::Termination,
        }
    }

    /// The payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut EventData {
        &mut self.data
    }

    /// Check if the event has been accepted.
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Accept the event, stopping its propagation to children.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Ignore the event, letting it propagate to children.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }
}

/// An event paired with an optional destination widget.
///
/// The destination is held weakly: a queued event never keeps a widget alive.
/// An item whose destination has been dropped is broadcast to every root.
#[derive(Debug)]
pub struct EventItem {
    event: Event,
    destination: Weak<Widget>,
}

impl EventItem {
    /// Pair `event` with `destination`.
    pub fn new(event: Event, destination: Option<&Arc<Widget>>) -> Self {
        Self {
            event,
            destination: destination.map(Arc::downgrade).unwrap_or_default(),
        }
    }

    /// The event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// The destination, if one was given and it is still alive.
    pub fn destination(&self) -> Option<Arc<Widget>> {
        self.destination.upgrade()
    }

    /// Split into the event and its live destination.
    pub fn into_parts(self) -> (Event, Option<Arc<Widget>>) {
        let destination = self.destination.upgrade();
        (self.event, destination)
    }
}

static_assertions::assert_impl_all!(EventItem: Send);
