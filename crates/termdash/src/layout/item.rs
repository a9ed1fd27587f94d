//! Layout participants.

use std::sync::Arc;

use crate::geometry::SizePolicy;
use crate::widget::Widget;

use super::BoxLayout;

/// Something a [`BoxLayout`] can size and place: a widget or a nested layout.
#[derive(Debug, Clone)]
pub enum LayoutItem {
    /// A widget, sized through its own sizing contract.
    Widget(Arc<Widget>),
    /// A nested layout sharing the parent widget of the enclosing layout.
    Layout(Arc<BoxLayout>),
}

impl LayoutItem {
    /// Smallest width the item can be drawn in.
    pub fn minimum_size(&self) -> usize {
        match self {
            Self::Widget(widget) => widget.minimum_size(),
            Self::Layout(layout) => layout.minimum_size(),
        }
    }

    /// Width the item would like to have.
    pub fn natural_size(&self) -> usize {
        match self {
            Self::Widget(widget) => widget.natural_size(),
            Self::Layout(layout) => layout.natural_size(),
        }
    }

    /// Largest width the item accepts.
    pub fn maximum_size(&self) -> usize {
        match self {
            Self::Widget(widget) => widget.maximum_size(),
            Self::Layout(layout) => layout.maximum_size(),
        }
    }

    /// Width assigned by the last layout pass.
    pub fn allocated_size(&self) -> usize {
        match self {
            Self::Widget(widget) => widget.allocated_size(),
            Self::Layout(layout) => layout.allocated_size(),
        }
    }

    /// Column assigned by the last layout pass.
    pub fn position(&self) -> usize {
        match self {
            Self::Widget(widget) => widget.position(),
            Self::Layout(layout) => layout.position(),
        }
    }

    /// How the item reacts to surplus or deficit width.
    pub fn size_policy(&self) -> SizePolicy {
        match self {
            Self::Widget(widget) => widget.size_policy(),
            Self::Layout(layout) => layout.size_policy(),
        }
    }

    /// Hidden widgets take no space. Layouts are always visible.
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Widget(widget) => widget.is_visible(),
            Self::Layout(_) => true,
        }
    }

    /// The wrapped widget, if this item is one.
    pub fn as_widget(&self) -> Option<&Arc<Widget>> {
        match self {
            Self::Widget(widget) => Some(widget),
            Self::Layout(_) => None,
        }
    }

    /// The wrapped layout, if this item is one.
    pub fn as_layout(&self) -> Option<&Arc<BoxLayout>> {
        match self {
            Self::Widget(_) => None,
            Self::Layout(layout) => Some(layout),
        }
    }

    pub(crate) fn place(&self, position: usize, size: usize) {
        match self {
            Self::Widget(widget) => {
                widget.set_position(position);
                widget.allocate_size(size);
            }
            Self::Layout(layout) => {
                layout.set_position(position);
                layout.allocate_size(size);
            }
        }
    }

    /// Run the layout pass of whatever this item contains.
    pub(crate) fn update_contents(&self) {
        match self {
            Self::Widget(widget) => widget.update_layout(),
            Self::Layout(layout) => layout.update(),
        }
    }
}

impl From<Arc<Widget>> for LayoutItem {
    fn from(widget: Arc<Widget>) -> Self {
        Self::Widget(widget)
    }
}

impl From<Arc<BoxLayout>> for LayoutItem {
    fn from(layout: Arc<BoxLayout>) -> Self {
        Self::Layout(layout)
    }
}
